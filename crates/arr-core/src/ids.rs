//! Dense integer indices into the arrays the engine iterates hot loops over.
//!
//! Per the indexing design note, variable identity inside the engine is a
//! small integer index into `groups`/`points`/`subjects`, not a string. The
//! newtypes below keep those indices from being accidentally interchanged;
//! textual names are only reconstructed when a solution is emitted.

use std::fmt;

macro_rules! dense_index {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(usize);

        impl $name {
            #[inline]
            pub fn new(value: usize) -> Self {
                $name(value)
            }

            #[inline]
            pub fn value(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<usize> for $name {
            fn from(value: usize) -> Self {
                $name(value)
            }
        }
    };
}

dense_index!(GroupIndex);
dense_index!(PointIndex);
dense_index!(SubjectIndex);

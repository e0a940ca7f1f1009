//! Unified error type for the arrangement engine.
//!
//! [`ArrangementError`] covers every failure mode named in the error design:
//! malformed configuration, solver infeasibility, solver failure, and sink
//! (output/log) failures. Domain code should return [`ArrangementResult`]
//! and let `?` do the conversion work.

use thiserror::Error;

/// Unified error type for all arrangement-engine operations.
#[derive(Error, Debug)]
pub enum ArrangementError {
    /// Malformed or wrong-spec input bundle.
    #[error("format error: {0}")]
    Format(String),

    /// Invalid grid descriptor, zero capacity with non-zero demand, negative
    /// quantities, or any other invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The solver reported integer infeasibility on the non-reduced problem,
    /// or on every reduced step plus the full-grid fallback in cascade mode.
    #[error("infeasible: {0}")]
    Infeasible(String),

    /// Any other solver failure, carrying the solver's own message.
    #[error("solver error: {0}")]
    Solver(String),

    /// Output or log sink unwritable; the caller already attempted a
    /// fallback filename before this is raised.
    #[error("sink error: {0}")]
    Sink(String),

    /// I/O errors encountered outside the sink-fallback path.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for `Result<T, ArrangementError>`.
pub type ArrangementResult<T> = Result<T, ArrangementError>;

impl From<anyhow::Error> for ArrangementError {
    fn from(err: anyhow::Error) -> Self {
        ArrangementError::Solver(err.to_string())
    }
}

impl From<String> for ArrangementError {
    fn from(s: String) -> Self {
        ArrangementError::Configuration(s)
    }
}

impl From<&str> for ArrangementError {
    fn from(s: &str) -> Self {
        ArrangementError::Configuration(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_kind_and_message() {
        let err = ArrangementError::Infeasible("no feasible placement".into());
        assert!(err.to_string().contains("infeasible"));
        assert!(err.to_string().contains("no feasible placement"));
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ArrangementError = io_err.into();
        assert!(matches!(err, ArrangementError::Io(_)));
    }

    #[test]
    fn result_alias_round_trips() {
        fn inner() -> ArrangementResult<i32> {
            Ok(7)
        }
        assert_eq!(inner().unwrap(), 7);
    }
}

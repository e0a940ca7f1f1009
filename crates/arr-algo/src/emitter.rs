//! Solution emitter (C8): writes a solved model's variable values to a
//! destination path, falling back to a backup filename when the primary
//! path cannot be opened (§4.6, §7).

use arr_core::diagnostics::Diagnostics;
use arr_core::error::{ArrangementError, ArrangementResult};
use arr_core::solver::MipSolution;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Writes `solution` against `var_names` to `primary`. If `primary` cannot
/// be opened, retries once against a fallback path built from the same
/// shared "open-or-fallback-and-warn" policy used by the log sink.
pub fn emit_solution(
    solution: &dyn MipSolution,
    var_names: &[String],
    primary: &Path,
    diagnostics: &mut Diagnostics,
) -> ArrangementResult<PathBuf> {
    open_or_fallback(primary, diagnostics, |path| {
        solution.write_solution_file(path, var_names)
    })
}

/// Shared fallback policy: try `primary`; on any I/O failure, retry once
/// against `<primary>.bak` and emit a diagnostic warning. A failure on the
/// fallback path itself is a [`ArrangementError::Sink`] error (no further
/// retries).
///
/// Used for both the solution sink here and the log sink elsewhere; kept as
/// one function so the two never drift out of sync on retry semantics.
pub fn open_or_fallback(
    primary: &Path,
    diagnostics: &mut Diagnostics,
    write: impl Fn(&Path) -> ArrangementResult<()>,
) -> ArrangementResult<PathBuf> {
    match write(primary) {
        Ok(()) => Ok(primary.to_path_buf()),
        Err(primary_err) => {
            let fallback = fallback_path(primary);
            warn!(
                primary = %primary.display(),
                fallback = %fallback.display(),
                error = %primary_err,
                "sink unwritable, retrying against fallback path"
            );
            diagnostics.add_warning_with_entity(
                "sink",
                &format!("{primary_err}; retried at {}", fallback.display()),
                &primary.display().to_string(),
            );
            write(&fallback).map_err(|fallback_err| {
                ArrangementError::Sink(format!(
                    "could not write {} ({primary_err}) or fallback {} ({fallback_err})",
                    primary.display(),
                    fallback.display()
                ))
            })?;
            Ok(fallback)
        }
    }
}

fn fallback_path(primary: &Path) -> PathBuf {
    let mut name = primary
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    name.push_str(".bak");
    primary.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arr_core::solver::SolveStatus;
    use std::fs;
    use tempfile_shim::TempDir;

    // A minimal self-contained temp-dir helper; this crate has no dev
    // dependency on a real tempfile crate, and one file under the system
    // temp directory is all these tests need.
    mod tempfile_shim {
        use std::path::PathBuf;

        pub struct TempDir(PathBuf);

        impl TempDir {
            pub fn new(label: &str) -> Self {
                let dir = std::env::temp_dir().join(format!(
                    "arr-algo-emitter-test-{label}-{}",
                    std::process::id()
                ));
                std::fs::create_dir_all(&dir).unwrap();
                TempDir(dir)
            }

            pub fn path(&self) -> &std::path::Path {
                &self.0
            }
        }

        impl Drop for TempDir {
            fn drop(&mut self) {
                let _ = std::fs::remove_dir_all(&self.0);
            }
        }
    }

    struct FakeSolution;
    impl MipSolution for FakeSolution {
        fn status(&self) -> SolveStatus {
            SolveStatus::Optimal
        }
        fn objective_value(&self) -> f64 {
            5.0
        }
        fn value(&self, _var: usize) -> f64 {
            1.0
        }
    }

    #[test]
    fn writes_to_the_primary_path_when_possible() {
        let dir = TempDir::new("primary");
        let path = dir.path().join("solution.txt");
        let mut diagnostics = Diagnostics::new();
        let names = vec!["n(A)[(0,0)]".to_string()];
        let written = emit_solution(&FakeSolution, &names, &path, &mut diagnostics).unwrap();
        assert_eq!(written, path);
        assert!(!diagnostics.has_issues());
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("n(A)[(0,0)] 1"));
    }

    #[test]
    fn falls_back_and_warns_when_primary_directory_is_missing() {
        let dir = TempDir::new("fallback");
        let bogus_dir = dir.path().join("does-not-exist");
        let primary = bogus_dir.join("solution.txt");
        let mut diagnostics = Diagnostics::new();
        let names = vec!["n(A)[(0,0)]".to_string()];
        let err = emit_solution(&FakeSolution, &names, &primary, &mut diagnostics).unwrap_err();
        assert!(matches!(err, ArrangementError::Sink(_)));
        assert!(diagnostics.warnings().count() >= 1);
    }
}

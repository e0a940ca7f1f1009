//! The black-box integer linear program interface (§6.3) and a registry of
//! named backends implementing it.
//!
//! No quadratic terms are used by the engine: every model built by `arr-algo`
//! is expressible as [`VarSpec`]/[`SparseRow`] pairs against a
//! [`MipModel`].

mod registry;

pub use registry::{build_solver, register_solver, SolverKind};

use crate::error::ArrangementResult;
use std::path::Path;

/// Integrality requirement on a decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Integer,
    Binary,
}

/// Sense of a linear constraint's inequality/equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintSense {
    Le,
    Ge,
    Eq,
}

/// One decision variable: name (used only for solution-file emission),
/// bounds, and integrality.
#[derive(Debug, Clone)]
pub struct VarSpec {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
    pub kind: VarKind,
}

/// One sparse linear constraint row: `Σ coefficients[k] * x[indices[k]] <sense> rhs`.
#[derive(Debug, Clone)]
pub struct SparseRow {
    pub indices: Vec<usize>,
    pub coefficients: Vec<f64>,
    pub sense: ConstraintSense,
    pub rhs: f64,
}

impl SparseRow {
    pub fn new(
        indices: Vec<usize>,
        coefficients: Vec<f64>,
        sense: ConstraintSense,
        rhs: f64,
    ) -> Self {
        debug_assert_eq!(
            indices.len(),
            coefficients.len(),
            "sparse row index/coefficient length mismatch"
        );
        Self {
            indices,
            coefficients,
            sense,
            rhs,
        }
    }
}

/// Solver status, distinguishing integer infeasibility from every other
/// failure mode per §6.3.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveStatus {
    Optimal,
    /// Solver returned a feasible but possibly non-optimal incumbent
    /// (e.g. a time limit was hit); see §5 and §9.3.
    Incumbent,
    IntegerInfeasible,
    Unbounded,
    Error(String),
}

impl SolveStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Incumbent)
    }
}

/// A solved model: queryable status, objective value, and variable values.
pub trait MipSolution {
    fn status(&self) -> SolveStatus;
    fn objective_value(&self) -> f64;
    fn value(&self, var: usize) -> f64;

    /// Writes a textual solution file keyed by variable name (§6.4). The
    /// caller supplies variable names separately since the solver backend
    /// only ever sees indices.
    fn write_solution_file(
        &self,
        path: &Path,
        var_names: &[String],
    ) -> ArrangementResult<()> {
        use std::io::Write;
        let mut file = std::fs::File::create(path)?;
        writeln!(file, "# objective {}", self.objective_value())?;
        for (idx, name) in var_names.iter().enumerate() {
            writeln!(file, "{name} {}", self.value(idx))?;
        }
        Ok(())
    }
}

/// A model under construction: variables and constraints accumulate, then
/// `solve` consumes it.
pub trait MipModel {
    /// Adds a variable, returning its dense index.
    fn add_variable(&mut self, spec: VarSpec) -> usize;

    /// Adds a linear constraint.
    fn add_constraint(&mut self, row: SparseRow);

    /// Sets the (minimization) objective coefficients, sparse over variable
    /// index.
    fn set_objective(&mut self, coefficients: &[(usize, f64)]);

    /// Solves the accumulated model.
    fn solve(self: Box<Self>) -> ArrangementResult<Box<dyn MipSolution>>;
}

/// A named backend capable of producing fresh [`MipModel`]s. Implemented
/// out-of-crate (e.g. by `arr-solver-goodlp`); the engine never depends on a
/// concrete backend directly.
pub trait MipBackend: Send + Sync {
    fn new_model(&self) -> Box<dyn MipModel>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct NullSolution;
    impl MipSolution for NullSolution {
        fn status(&self) -> SolveStatus {
            SolveStatus::IntegerInfeasible
        }
        fn objective_value(&self) -> f64 {
            0.0
        }
        fn value(&self, _var: usize) -> f64 {
            0.0
        }
    }

    struct NullModel;
    impl MipModel for NullModel {
        fn add_variable(&mut self, _spec: VarSpec) -> usize {
            0
        }
        fn add_constraint(&mut self, _row: SparseRow) {}
        fn set_objective(&mut self, _coefficients: &[(usize, f64)]) {}
        fn solve(self: Box<Self>) -> ArrangementResult<Box<dyn MipSolution>> {
            Ok(Box::new(NullSolution))
        }
    }

    struct NullBackend;
    impl MipBackend for NullBackend {
        fn new_model(&self) -> Box<dyn MipModel> {
            Box::new(NullModel)
        }
    }

    #[test]
    fn registered_backend_reports_infeasible() {
        register_solver("null-test", || Arc::new(NullBackend));
        let kind: SolverKind = "null-test".parse().unwrap();
        let model = build_solver(&kind).new_model();
        let solution = model.solve().unwrap();
        assert_eq!(solution.status(), SolveStatus::IntegerInfeasible);
    }
}

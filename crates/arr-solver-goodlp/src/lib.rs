//! A concrete [`arr_core::solver::MipBackend`] implementation over
//! `good_lp`'s HiGHS binding.
//!
//! The TEP solver elsewhere in this workspace uses `good_lp` with the
//! `clarabel` backend, which only relaxes binaries to `[0,1]` continuous
//! variables (see its own doc comment). The arrangement engine's invariants
//! require genuine integer placement and flow variables (spec data-model
//! invariant 5), so this backend uses the `highs` feature instead, which
//! performs real branch-and-cut MIP solving.

use arr_core::error::{ArrangementError, ArrangementResult};
use arr_core::solver::{
    ConstraintSense, MipBackend, MipModel, MipSolution, SolveStatus, SparseRow, VarKind, VarSpec,
};
use good_lp::solvers::highs::highs;
use good_lp::{variable, Expression, ResolutionError, Solution, SolverModel, Variable};
use std::sync::Arc;
use tracing::{debug, warn};

/// Registers this backend under the name `"highs"` in `arr-core`'s global
/// solver registry. Call once during process startup (e.g. from a binary's
/// `main`); the engine never links a concrete backend on its own.
pub fn register() {
    arr_core::solver::register_solver("highs", || Arc::new(GoodLpBackend));
}

struct GoodLpBackend;

impl MipBackend for GoodLpBackend {
    fn new_model(&self) -> Box<dyn MipModel> {
        Box::new(GoodLpModel::default())
    }
}

#[derive(Default)]
struct GoodLpModel {
    vars: good_lp::ProblemVariables,
    handles: Vec<Variable>,
    constraints: Vec<SparseRow>,
    objective: Vec<(usize, f64)>,
}

impl MipModel for GoodLpModel {
    fn add_variable(&mut self, spec: VarSpec) -> usize {
        let mut def = variable().min(spec.lower).max(spec.upper);
        if matches!(spec.kind, VarKind::Integer | VarKind::Binary) {
            def = def.integer();
        }
        let handle = self.vars.add(def);
        self.handles.push(handle);
        self.handles.len() - 1
    }

    fn add_constraint(&mut self, row: SparseRow) {
        self.constraints.push(row);
    }

    fn set_objective(&mut self, coefficients: &[(usize, f64)]) {
        self.objective = coefficients.to_vec();
    }

    fn solve(self: Box<Self>) -> ArrangementResult<Box<dyn MipSolution>> {
        let objective = expr_from(&self.handles, &self.objective);
        debug!(
            variables = self.handles.len(),
            constraints = self.constraints.len(),
            "handing model to HiGHS"
        );
        let mut model = self.vars.minimise(objective.clone()).using(highs);
        for row in &self.constraints {
            let lhs = expr_from(&self.handles, &row_terms(row));
            let constraint = match row.sense {
                ConstraintSense::Le => lhs.leq(row.rhs),
                ConstraintSense::Ge => lhs.geq(row.rhs),
                ConstraintSense::Eq => lhs.eq(row.rhs),
            };
            model = model.with(constraint);
        }

        match model.solve() {
            Ok(solution) => {
                let values = self.handles.iter().map(|v| solution.value(*v)).collect();
                let objective_value = solution.eval(&objective);
                Ok(Box::new(GoodLpSolution {
                    status: SolveStatus::Optimal,
                    objective_value,
                    values,
                }))
            }
            Err(ResolutionError::Infeasible) => {
                warn!("HiGHS reported integer infeasibility");
                Err(ArrangementError::Infeasible(
                    "solver reported integer infeasibility".into(),
                ))
            }
            Err(ResolutionError::Unbounded) => Err(ArrangementError::Solver(
                "solver reported an unbounded model".into(),
            )),
            Err(other) => Err(ArrangementError::Solver(format!("{other:?}"))),
        }
    }
}

fn row_terms(row: &SparseRow) -> Vec<(usize, f64)> {
    row.indices
        .iter()
        .copied()
        .zip(row.coefficients.iter().copied())
        .collect()
}

fn expr_from(handles: &[Variable], terms: &[(usize, f64)]) -> Expression {
    let mut expr = Expression::from(0.0);
    for &(idx, coeff) in terms {
        expr += coeff * handles[idx];
    }
    expr
}

struct GoodLpSolution {
    status: SolveStatus,
    objective_value: f64,
    values: Vec<f64>,
}

impl MipSolution for GoodLpSolution {
    fn status(&self) -> SolveStatus {
        self.status.clone()
    }

    fn objective_value(&self) -> f64 {
        self.objective_value
    }

    fn value(&self, var: usize) -> f64 {
        self.values[var]
    }
}

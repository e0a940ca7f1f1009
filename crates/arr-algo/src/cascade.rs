//! Cascade reducer "GFred" (C7): grows the usable sub-grid until the
//! objective stabilizes, instead of solving the full grid directly.
//!
//! Each reduced attempt is strictly feasible-implies-full-feasible (unused
//! locations get zero placement), so absorbing an infeasible intermediate
//! step and continuing to grow the sub-grid is always safe; only the final
//! fallback to the full grid can raise [`ArrangementError::Infeasible`].

use crate::{compressed, grid_symmetry, per_subject, ModelEncoding};
use arr_core::distance::{DistanceMetric, DistanceTable};
use arr_core::error::{ArrangementError, ArrangementResult};
use arr_core::ids::PointIndex;
use arr_core::model::{GridDescriptor, GroupSizing, Point, SubjectGroup, TotalFlows};
use arr_core::solver::{MipBackend, MipModel, MipSolution};
use tracing::{debug, info};

/// Result of a full cascade run: the winning solution, the variable names
/// needed to emit it, and the objective value that stabilized the run.
pub struct CascadeOutcome {
    pub solution: Box<dyn MipSolution>,
    pub var_names: Vec<String>,
    pub objective: f64,
}

/// Runs the cascade over `full_points`/`full_grid`, which must be the
/// complete grid generated from a descriptor (§4.5).
///
/// A soft solver time limit is a backend concern (configured on the
/// `MipBackend` implementation, outside this driver); when one is hit, the
/// backend returns its best incumbent rather than failing, which this
/// driver treats as a normal successful attempt. That can make the cascade
/// stabilize (and stop growing) on a sub-optimal incumbent earlier than it
/// would with no time limit — an intentional trade-off (§5, §9.3), not a
/// bug to special-case here.
pub fn run(
    backend: &dyn MipBackend,
    encoding: ModelEncoding,
    full_points: &[Point],
    full_grid: &GridDescriptor,
    groups: &[SubjectGroup],
    flows: &TotalFlows,
    metric: DistanceMetric,
    sizing: &[GroupSizing],
) -> ArrangementResult<CascadeOutcome> {
    let c_max = full_grid.cols();
    let r_max = full_grid.rows();
    let mut c = 1usize;
    let mut r = 1usize;
    let mut j_prev: Option<f64> = None;
    let mut j_curr: Option<f64> = None;
    let mut best: Option<(Box<dyn MipSolution>, Vec<String>)> = None;

    loop {
        let sub_points: Vec<Point> = full_points
            .iter()
            .filter(|p| match GridDescriptor::parse_point_xy(p.name()) {
                Some((x, y)) => x < c && y < r,
                None => false,
            })
            .cloned()
            .collect();
        let sub_grid = full_grid.as_sub_grid(c, r)?;

        debug!(c, r, "solving cascade sub-grid");
        match build_and_solve(
            backend,
            encoding,
            &sub_points,
            &sub_grid,
            groups,
            flows,
            metric,
            sizing,
        ) {
            Ok((solution, var_names)) => {
                let objective = solution.objective_value();
                j_prev = j_curr;
                j_curr = Some(objective);
                best = Some((solution, var_names));
                if j_prev == j_curr {
                    info!(c, r, objective, "cascade objective stabilized");
                    break;
                }
            }
            Err(ArrangementError::Infeasible(_)) => {
                debug!(c, r, "sub-grid infeasible, absorbing and continuing");
            }
            Err(other) => return Err(other),
        }

        if c >= c_max && r >= r_max {
            break;
        }
        if c < c_max {
            c += 1;
        }
        if r < r_max {
            r += 1;
        }
    }

    if let Some((solution, var_names)) = best {
        let objective = solution.objective_value();
        return Ok(CascadeOutcome {
            solution,
            var_names,
            objective,
        });
    }

    info!("every reduced attempt infeasible, falling back to the full grid");
    let fallback_grid = GridDescriptor::new(c_max, r_max, 0)?;
    let (solution, var_names) = build_and_solve(
        backend,
        encoding,
        full_points,
        &fallback_grid,
        groups,
        flows,
        metric,
        sizing,
    )?;
    let objective = solution.objective_value();
    Ok(CascadeOutcome {
        solution,
        var_names,
        objective,
    })
}

fn build_and_solve(
    backend: &dyn MipBackend,
    encoding: ModelEncoding,
    points: &[Point],
    grid: &GridDescriptor,
    groups: &[SubjectGroup],
    flows: &TotalFlows,
    metric: DistanceMetric,
    sizing: &[GroupSizing],
) -> ArrangementResult<(Box<dyn MipSolution>, Vec<String>)> {
    let mut model = backend.new_model();
    let table = DistanceTable::build(points, metric);
    let distance = |u: usize, v: usize| table.get(u, v);
    let xy: Vec<(usize, usize)> = points
        .iter()
        .map(|p| GridDescriptor::parse_point_xy(p.name()).unwrap_or((0, 0)))
        .collect();
    let point_xy = |u: usize| xy[u];

    let var_names = match encoding {
        ModelEncoding::Compressed => {
            let idx = compressed::build(model.as_mut(), points, groups, flows, &distance, sizing)?;
            let n_groups = groups.len();
            let terms =
                |u: usize| compressed::placement_terms_at(&idx, n_groups, PointIndex::new(u));
            grid_symmetry::add_constraints(model.as_mut(), grid, points.len(), &terms, &point_xy);
            idx.var_names
        }
        ModelEncoding::PerSubject => {
            let idx =
                per_subject::build(model.as_mut(), points, groups, flows, &distance, sizing)?;
            let subject_counts: Vec<usize> =
                sizing.iter().map(|s| s.subject_count as usize).collect();
            let terms = |u: usize| per_subject::placement_terms_at(&idx, &subject_counts, u);
            grid_symmetry::add_constraints(model.as_mut(), grid, points.len(), &terms, &point_xy);
            idx.var_names
        }
    };

    let solution = model.solve()?;
    Ok((solution, var_names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arr_core::error::ArrangementResult as Result_;
    use arr_core::solver::{SolveStatus, SparseRow, VarSpec};
    use arr_core::sizing::compute_sizing;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A backend whose objective only depends on how many points the model
    /// was built over, so the cascade can be driven deterministically: the
    /// "solution" is a constant once at least 2 points are available,
    /// letting us assert on stabilization without a real LP solve.
    struct StepBackend {
        calls: AtomicUsize,
    }

    struct StepModel {
        n_vars: usize,
    }

    struct StepSolution {
        n_vars: usize,
    }

    impl MipModel for StepModel {
        fn add_variable(&mut self, _spec: VarSpec) -> usize {
            self.n_vars += 1;
            self.n_vars - 1
        }
        fn add_constraint(&mut self, _row: SparseRow) {}
        fn set_objective(&mut self, _coefficients: &[(usize, f64)]) {}
        fn solve(self: Box<Self>) -> Result_<Box<dyn MipSolution>> {
            Ok(Box::new(StepSolution {
                n_vars: self.n_vars,
            }))
        }
    }

    impl MipSolution for StepSolution {
        fn status(&self) -> SolveStatus {
            SolveStatus::Optimal
        }
        fn objective_value(&self) -> f64 {
            // Stabilizes once the sub-grid covers both points (2x2 == 2x1
            // give the same variable count ceiling in this toy backend).
            (self.n_vars.min(8)) as f64
        }
        fn value(&self, _var: usize) -> f64 {
            0.0
        }
    }

    impl MipBackend for StepBackend {
        fn new_model(&self) -> Box<dyn MipModel> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::new(StepModel { n_vars: 0 })
        }
    }

    #[test]
    fn cascade_stabilizes_and_stops_growing() {
        let (points, grid) = GridDescriptor::parse("g1:1x2:1x1").unwrap();
        let groups = vec![
            SubjectGroup::new("A", 10, 10, 1),
            SubjectGroup::new("B", 10, 10, 1),
        ];
        let mut flows = TotalFlows::new(["A", "B"]);
        flows.set_flow("A", "B", 5).unwrap();
        let (sizing, _) = compute_sizing(&groups, &flows).unwrap();
        let backend = StepBackend {
            calls: AtomicUsize::new(0),
        };
        let metric = DistanceMetric::minkowski(1).unwrap();

        let outcome = run(
            &backend,
            ModelEncoding::Compressed,
            &points,
            &grid,
            &groups,
            &flows,
            metric,
            &sizing,
        )
        .unwrap();

        assert!(outcome.objective > 0.0);
        // grid is 2 columns x 1 row, so the cascade only ever tries c=1 and
        // c=2 (r stays 1) -> at most 2 attempts before stabilizing/exhausting.
        assert!(backend.calls.load(Ordering::SeqCst) <= 2);
    }
}

//! The arrangement engine's model builders and cascade-reduction driver.
//!
//! Composes, in order: sizing (`arr_core::sizing`) → model construction
//! (one of [`compressed`]/[`per_subject`], optionally wrapped by
//! [`cascade`]) → solution emission ([`emitter`]). [`ModelEncoding`] and
//! [`ReductionStrategy`] are the two axes a caller picks between; `solve`
//! composes them into the single entry point callers use.

pub mod cascade;
pub mod compressed;
pub mod emitter;
pub mod grid_symmetry;
pub mod per_subject;

use arr_core::diagnostics::Diagnostics;
use arr_core::distance::DistanceMetric;
use arr_core::error::ArrangementResult;
use arr_core::ids::PointIndex;
use arr_core::model::{GridDescriptor, GroupSizing, Point, SubjectGroup, TotalFlows};
use arr_core::sizing::compute_sizing;
use arr_core::solver::{MipBackend, MipSolution};
use std::path::{Path, PathBuf};

/// Which variable encoding to build the model in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelEncoding {
    /// `n(i)[u]`/`f(i,j)[u,v]`/`g(i)[u]` — the default (§4.2).
    Compressed,
    /// `b(i:p)[u]`/`f(i:p,j:q)[u,v]`/`g(i:p)[u]` — per-subject (§4.3).
    PerSubject,
}

/// Whether to solve the full layout directly or grow it via the cascade
/// reducer. Only meaningful in grid mode (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReductionStrategy {
    Direct,
    CascadeReduced,
}

/// Everything a top-level `solve` call needs about the facility layout: the
/// candidate point set, and — only in grid mode — the descriptor used to
/// drive symmetry-breaking and the cascade reducer.
pub struct Layout {
    pub points: Vec<Point>,
    pub grid: Option<GridDescriptor>,
}

/// The outcome of a completed solve: the written solution path and the
/// objective value reported by the solver.
pub struct ArrangementOutcome {
    pub solution_path: PathBuf,
    pub objective: f64,
    pub diagnostics: Diagnostics,
}

/// Runs the full pipeline: sizing → model construction (direct or
/// cascade-reduced) → emission.
#[allow(clippy::too_many_arguments)]
pub fn solve(
    backend: &dyn MipBackend,
    encoding: ModelEncoding,
    reduction: ReductionStrategy,
    layout: &Layout,
    groups: &[SubjectGroup],
    flows: &TotalFlows,
    metric: DistanceMetric,
    solution_path: &Path,
) -> ArrangementResult<ArrangementOutcome> {
    let (sizing, mut diagnostics) = compute_sizing(groups, flows)?;

    let (solution, var_names, objective) = match (reduction, &layout.grid) {
        (ReductionStrategy::CascadeReduced, Some(grid)) => {
            let outcome = cascade::run(
                backend,
                encoding,
                &layout.points,
                grid,
                groups,
                flows,
                metric,
                &sizing,
            )?;
            (outcome.solution, outcome.var_names, outcome.objective)
        }
        _ => {
            let (solution, var_names) = solve_direct(
                backend,
                encoding,
                &layout.points,
                layout.grid.as_ref(),
                groups,
                flows,
                metric,
                &sizing,
            )?;
            let objective = solution.objective_value();
            (solution, var_names, objective)
        }
    };

    let solution_path =
        emitter::emit_solution(solution.as_ref(), &var_names, solution_path, &mut diagnostics)?;

    Ok(ArrangementOutcome {
        solution_path,
        objective,
        diagnostics,
    })
}

fn solve_direct(
    backend: &dyn MipBackend,
    encoding: ModelEncoding,
    points: &[Point],
    grid: Option<&GridDescriptor>,
    groups: &[SubjectGroup],
    flows: &TotalFlows,
    metric: DistanceMetric,
    sizing: &[GroupSizing],
) -> ArrangementResult<(Box<dyn MipSolution>, Vec<String>)> {
    use arr_core::distance::DistanceTable;

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
            if let Some(grid) = grid {
                let n_groups = groups.len();
                let terms =
                    |u: usize| compressed::placement_terms_at(&idx, n_groups, PointIndex::new(u));
                grid_symmetry::add_constraints(
                    model.as_mut(),
                    grid,
                    points.len(),
                    &terms,
                    &point_xy,
                );
            }
            idx.var_names
        }
        ModelEncoding::PerSubject => {
            let idx =
                per_subject::build(model.as_mut(), points, groups, flows, &distance, sizing)?;
            if let Some(grid) = grid {
                let subject_counts: Vec<usize> =
                    sizing.iter().map(|s| s.subject_count as usize).collect();
                let terms = |u: usize| per_subject::placement_terms_at(&idx, &subject_counts, u);
                grid_symmetry::add_constraints(
                    model.as_mut(),
                    grid,
                    points.len(),
                    &terms,
                    &point_xy,
                );
            }
            idx.var_names
        }
    };

    let solution = model.solve()?;
    Ok((solution, var_names))
}

//! Compressed MIP builder (C4): the group-aggregated linear model.
//!
//! Default model per the design notes: `n(i)[u]` resolves the symmetry
//! between subjects of the same group implicitly, so this encoding is
//! smaller than the per-subject model in [`crate::per_subject`].

use arr_core::error::ArrangementResult;
use arr_core::ids::{GroupIndex, PointIndex};
use arr_core::model::{GroupSizing, Point, SubjectGroup, TotalFlows};
use arr_core::solver::{ConstraintSense, MipModel, SparseRow, VarKind, VarSpec};
use std::collections::HashMap;

/// Variable index bookkeeping for a built compressed model, keyed the way
/// the solution emitter (C8) needs to reconstruct variable names.
#[derive(Debug, Default)]
pub struct CompressedIndex {
    /// `f(i,j)[u,v]` keyed by `(i, j, u, v)` group/point indices.
    pub flow: HashMap<(usize, usize, usize, usize), usize>,
    /// `n(i)[u]` keyed by `(i, u)`.
    pub count: HashMap<(usize, usize), usize>,
    /// `g(i)[u]` keyed by `(i, u)`.
    pub production: HashMap<(usize, usize), usize>,
    pub var_names: Vec<String>,
}

impl CompressedIndex {
    fn add(&mut self, model: &mut dyn MipModel, name: String, lower: f64, upper: f64) -> usize {
        let idx = model.add_variable(VarSpec {
            name: name.clone(),
            lower,
            upper,
            kind: VarKind::Integer,
        });
        debug_assert_eq!(idx, self.var_names.len());
        self.var_names.push(name);
        idx
    }
}

/// Builds the compressed model's variables and constraints against `model`,
/// returning the index bookkeeping the objective/emitter need.
///
/// `distance` and `flows` are queried by position: `points[u]`/`groups[i]`
/// are assumed to be in the same order as the `sizing` slice and the
/// `distance` table.
pub fn build(
    model: &mut dyn MipModel,
    points: &[Point],
    groups: &[SubjectGroup],
    flows: &TotalFlows,
    distance: &dyn Fn(usize, usize) -> f64,
    sizing: &[GroupSizing],
) -> ArrangementResult<CompressedIndex> {
    let n_groups = groups.len();
    let n_points = points.len();
    let mut idx = CompressedIndex::default();

    for (i, group) in groups.iter().enumerate() {
        for (j, other) in groups.iter().enumerate() {
            let t_ij = flows.flow_by_index(GroupIndex::new(i), GroupIndex::new(j)) as f64;
            for (u, up) in points.iter().enumerate() {
                for (v, vp) in points.iter().enumerate() {
                    let name = format!(
                        "f({},{})[{},{}]",
                        group.name(),
                        other.name(),
                        up.name(),
                        vp.name()
                    );
                    let var = idx.add(model, name, 0.0, t_ij);
                    idx.flow.insert((i, j, u, v), var);
                }
            }
        }
    }

    for (i, group) in groups.iter().enumerate() {
        let n_i = sizing[i].subject_count as f64;
        for (u, point) in points.iter().enumerate() {
            let name = format!("n({})[{}]", group.name(), point.name());
            let var = idx.add(model, name, 0.0, n_i);
            idx.count.insert((i, u), var);
        }
    }

    for (i, group) in groups.iter().enumerate() {
        let g_i = sizing[i].net_production as f64;
        let (lower, upper) = if g_i >= 0.0 { (-g_i, g_i) } else { (g_i, 0.0) };
        for (u, point) in points.iter().enumerate() {
            let name = format!("g({})[{}]", group.name(), point.name());
            let var = idx.add(model, name, lower, upper);
            idx.production.insert((i, u), var);
        }
    }

    // Objective: Σ d(u,v) · f(i,j)[u,v]
    let mut objective = Vec::new();
    for i in 0..n_groups {
        for j in 0..n_groups {
            for u in 0..n_points {
                for v in 0..n_points {
                    let var = idx.flow[&(i, j, u, v)];
                    objective.push((var, distance(u, v)));
                }
            }
        }
    }
    model.set_objective(&objective);

    for (i, group) in groups.iter().enumerate() {
        for u in 0..n_points {
            // Output capacity: Σ_{j,v} f(i,j)[u,v] - output_capacity_i · n(i)[u] ≤ 0
            let mut indices = Vec::new();
            let mut coeffs = Vec::new();
            for j in 0..n_groups {
                for v in 0..n_points {
                    indices.push(idx.flow[&(i, j, u, v)]);
                    coeffs.push(1.0);
                }
            }
            indices.push(idx.count[&(i, u)]);
            coeffs.push(-(group.output_capacity() as f64));
            model.add_constraint(SparseRow::new(indices, coeffs, ConstraintSense::Le, 0.0));

            // Input capacity: Σ_{j,v} f(j,i)[v,u] - input_capacity_i · n(i)[u] ≤ 0
            let mut indices = Vec::new();
            let mut coeffs = Vec::new();
            for j in 0..n_groups {
                for v in 0..n_points {
                    indices.push(idx.flow[&(j, i, v, u)]);
                    coeffs.push(1.0);
                }
            }
            indices.push(idx.count[&(i, u)]);
            coeffs.push(-(group.input_capacity() as f64));
            model.add_constraint(SparseRow::new(indices, coeffs, ConstraintSense::Le, 0.0));

            // Kirchhoff: Σ_{j,v} f(i,j)[u,v] − g(i)[u] − Σ_{j≠i,v} f(j,i)[v,u] = 0
            let mut indices = Vec::new();
            let mut coeffs = Vec::new();
            for j in 0..n_groups {
                for v in 0..n_points {
                    indices.push(idx.flow[&(i, j, u, v)]);
                    coeffs.push(1.0);
                }
            }
            indices.push(idx.production[&(i, u)]);
            coeffs.push(-1.0);
            for j in 0..n_groups {
                if j == i {
                    continue;
                }
                for v in 0..n_points {
                    indices.push(idx.flow[&(j, i, v, u)]);
                    coeffs.push(-1.0);
                }
            }
            model.add_constraint(SparseRow::new(indices, coeffs, ConstraintSense::Eq, 0.0));
        }

        // Group net production: Σ_u g(i)[u] = G_i
        let indices: Vec<usize> = (0..n_points).map(|u| idx.production[&(i, u)]).collect();
        let coeffs = vec![1.0; n_points];
        model.add_constraint(SparseRow::new(
            indices,
            coeffs,
            ConstraintSense::Eq,
            sizing[i].net_production as f64,
        ));

        // Group subject count: Σ_u n(i)[u] = N_i
        let indices: Vec<usize> = (0..n_points).map(|u| idx.count[&(i, u)]).collect();
        let coeffs = vec![1.0; n_points];
        model.add_constraint(SparseRow::new(
            indices,
            coeffs,
            ConstraintSense::Eq,
            sizing[i].subject_count as f64,
        ));

        // Demand realization: Σ_{u,v} f(i,j)[u,v] = T[i,j] for every j
        for j in 0..n_groups {
            let mut indices = Vec::new();
            for u in 0..n_points {
                for v in 0..n_points {
                    indices.push(idx.flow[&(i, j, u, v)]);
                }
            }
            let coeffs = vec![1.0; indices.len()];
            let t_ij = flows.flow_by_index(GroupIndex::new(i), GroupIndex::new(j)) as f64;
            model.add_constraint(SparseRow::new(indices, coeffs, ConstraintSense::Eq, t_ij));
        }
    }

    // Location area: Σ_i area_i · n(i)[u] ≤ area_u
    for (u, point) in points.iter().enumerate() {
        let indices: Vec<usize> = (0..n_groups).map(|i| idx.count[&(i, u)]).collect();
        let coeffs: Vec<f64> = groups.iter().map(|g| g.area() as f64).collect();
        model.add_constraint(SparseRow::new(
            indices,
            coeffs,
            ConstraintSense::Le,
            point.area() as f64,
        ));
    }

    Ok(idx)
}

/// The per-`(group, point)` placement indicator sum `S(x,y)` the grid
/// symmetry constraints (C6) need: here, `n(i)[u]` summed over groups.
pub fn placement_terms_at(idx: &CompressedIndex, n_groups: usize, u: PointIndex) -> Vec<usize> {
    (0..n_groups)
        .map(|i| idx.count[&(i, u.value())])
        .collect()
}

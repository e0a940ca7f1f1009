//! Per-subject MIP builder (C5): materializes `N_i` individual subjects per
//! group and tracks their placement and flows separately.
//!
//! Strictly larger than [`crate::compressed`]'s encoding
//! (`|groups|·N_i·|points|` placement variables versus `|groups|·|points|`,
//! quadratic blowup in subject pairs for flow), but required when a
//! downstream consumer needs per-subject routing.

use arr_core::error::ArrangementResult;
use arr_core::ids::GroupIndex;
use arr_core::model::{GroupSizing, Point, SubjectGroup, TotalFlows};
use arr_core::solver::{ConstraintSense, MipModel, SparseRow, VarKind, VarSpec};
use std::collections::HashMap;

/// Variable index bookkeeping, keyed by `(group, subject, point[, point])`.
#[derive(Debug, Default)]
pub struct PerSubjectIndex {
    /// `b(i:p)[u]` keyed by `(i, p, u)`.
    pub placement: HashMap<(usize, usize, usize), usize>,
    /// `f(i:p,j:q)[u,v]` keyed by `(i, p, j, q, u, v)`.
    pub flow: HashMap<(usize, usize, usize, usize, usize, usize), usize>,
    /// `g(i:p)[u]` keyed by `(i, p, u)`.
    pub production: HashMap<(usize, usize, usize), usize>,
    pub var_names: Vec<String>,
}

impl PerSubjectIndex {
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

pub fn build(
    model: &mut dyn MipModel,
    points: &[Point],
    groups: &[SubjectGroup],
    flows: &TotalFlows,
    distance: &dyn Fn(usize, usize) -> f64,
    sizing: &[GroupSizing],
) -> ArrangementResult<PerSubjectIndex> {
    let n_groups = groups.len();
    let n_points = points.len();
    let subject_counts: Vec<usize> = sizing.iter().map(|s| s.subject_count as usize).collect();
    let mut idx = PerSubjectIndex::default();

    // b(i:p)[u] ∈ {0,1}, encoded as bounded integer [0,1]
    for (i, group) in groups.iter().enumerate() {
        for p in 0..subject_counts[i] {
            for (u, point) in points.iter().enumerate() {
                let name = format!("b({}:{p})[{}]", group.name(), point.name());
                let var = idx.add(model, name, 0.0, 1.0);
                idx.placement.insert((i, p, u), var);
            }
        }
    }

    // f(i:p,j:q)[u,v], bound T[i,j]
    for (i, group) in groups.iter().enumerate() {
        for (j, other) in groups.iter().enumerate() {
            let t_ij = flows.flow_by_index(GroupIndex::new(i), GroupIndex::new(j)) as f64;
            for p in 0..subject_counts[i] {
                for q in 0..subject_counts[j] {
                    for (u, up) in points.iter().enumerate() {
                        for (v, vp) in points.iter().enumerate() {
                            let name = format!(
                                "f({}:{p},{}:{q})[{},{}]",
                                group.name(),
                                other.name(),
                                up.name(),
                                vp.name()
                            );
                            let var = idx.add(model, name, 0.0, t_ij);
                            idx.flow.insert((i, p, j, q, u, v), var);
                        }
                    }
                }
            }
        }
    }

    // g(i:p)[u], same bounds as the compressed model's g(i)[u]
    for (i, group) in groups.iter().enumerate() {
        let g_i = sizing[i].net_production as f64;
        let (lower, upper) = if g_i >= 0.0 { (-g_i, g_i) } else { (g_i, 0.0) };
        for p in 0..subject_counts[i] {
            for (u, point) in points.iter().enumerate() {
                let name = format!("g({}:{p})[{}]", group.name(), point.name());
                let var = idx.add(model, name, lower, upper);
                idx.production.insert((i, p, u), var);
            }
        }
    }

    // Objective: Σ d(u,v) · f(i:p,j:q)[u,v]. Walked in the same nested
    // i/p/j/q/u/v order the flow variables were created in, not via
    // HashMap iteration, so variable/constraint construction stays
    // deterministic and reproducible across runs.
    let mut objective = Vec::new();
    for i in 0..n_groups {
        for j in 0..n_groups {
            for p in 0..subject_counts[i] {
                for q in 0..subject_counts[j] {
                    for u in 0..n_points {
                        for v in 0..n_points {
                            let var = idx.flow[&(i, p, j, q, u, v)];
                            objective.push((var, distance(u, v)));
                        }
                    }
                }
            }
        }
    }
    model.set_objective(&objective);

    for (i, group) in groups.iter().enumerate() {
        for p in 0..subject_counts[i] {
            // Unique placement: Σ_u b(i:p)[u] = 1
            let indices: Vec<usize> = (0..n_points).map(|u| idx.placement[&(i, p, u)]).collect();
            let coeffs = vec![1.0; n_points];
            model.add_constraint(SparseRow::new(indices, coeffs, ConstraintSense::Eq, 1.0));

            for (u, _) in points.iter().enumerate() {
                // Outflow ≤ capacity · placement
                let mut indices = Vec::new();
                for j in 0..n_groups {
                    for q in 0..subject_counts[j] {
                        for v in 0..n_points {
                            indices.push(idx.flow[&(i, p, j, q, u, v)]);
                        }
                    }
                }
                let mut coeffs = vec![1.0; indices.len()];
                indices.push(idx.placement[&(i, p, u)]);
                coeffs.push(-(group.output_capacity() as f64));
                model.add_constraint(SparseRow::new(indices, coeffs, ConstraintSense::Le, 0.0));

                // Inflow ≤ capacity · placement
                let mut indices = Vec::new();
                for j in 0..n_groups {
                    for q in 0..subject_counts[j] {
                        for v in 0..n_points {
                            indices.push(idx.flow[&(j, q, i, p, v, u)]);
                        }
                    }
                }
                let mut coeffs = vec![1.0; indices.len()];
                indices.push(idx.placement[&(i, p, u)]);
                coeffs.push(-(group.input_capacity() as f64));
                model.add_constraint(SparseRow::new(indices, coeffs, ConstraintSense::Le, 0.0));

                // Kirchhoff at (i,p,u): derived straight from the index
                // list we emit, never from a separately maintained
                // coefficient-count formula (see design notes).
                let mut indices = Vec::new();
                let mut coeffs = Vec::new();
                for j in 0..n_groups {
                    for q in 0..subject_counts[j] {
                        for v in 0..n_points {
                            indices.push(idx.flow[&(i, p, j, q, u, v)]);
                            coeffs.push(1.0);
                        }
                    }
                }
                indices.push(idx.production[&(i, p, u)]);
                coeffs.push(-1.0);
                for j in 0..n_groups {
                    if j == i {
                        continue;
                    }
                    for q in 0..subject_counts[j] {
                        for v in 0..n_points {
                            indices.push(idx.flow[&(j, q, i, p, v, u)]);
                            coeffs.push(-1.0);
                        }
                    }
                }
                model.add_constraint(SparseRow::new(indices, coeffs, ConstraintSense::Eq, 0.0));
            }
        }

        // Per-group demand: Σ_{p,q,u,v} f(i:p,j:q)[u,v] = T[i,j]
        for j in 0..n_groups {
            let mut indices = Vec::new();
            for p in 0..subject_counts[i] {
                for q in 0..subject_counts[j] {
                    for u in 0..n_points {
                        for v in 0..n_points {
                            indices.push(idx.flow[&(i, p, j, q, u, v)]);
                        }
                    }
                }
            }
            let coeffs = vec![1.0; indices.len()];
            let t_ij = flows.flow_by_index(GroupIndex::new(i), GroupIndex::new(j)) as f64;
            model.add_constraint(SparseRow::new(indices, coeffs, ConstraintSense::Eq, t_ij));
        }

        // Per-group net production: Σ_{p,u} g(i:p)[u] = G_i
        let mut indices = Vec::new();
        for p in 0..subject_counts[i] {
            for u in 0..n_points {
                indices.push(idx.production[&(i, p, u)]);
            }
        }
        let coeffs = vec![1.0; indices.len()];
        model.add_constraint(SparseRow::new(
            indices,
            coeffs,
            ConstraintSense::Eq,
            sizing[i].net_production as f64,
        ));
    }

    // Per-location area: Σ_{i,p} area_i · b(i:p)[u] ≤ area_u
    for (u, point) in points.iter().enumerate() {
        let mut indices = Vec::new();
        let mut coeffs = Vec::new();
        for (i, group) in groups.iter().enumerate() {
            for p in 0..subject_counts[i] {
                indices.push(idx.placement[&(i, p, u)]);
                coeffs.push(group.area() as f64);
            }
        }
        model.add_constraint(SparseRow::new(
            indices,
            coeffs,
            ConstraintSense::Le,
            point.area() as f64,
        ));
    }

    Ok(idx)
}

/// `S(x,y)` for the grid symmetry constraints: the sum, over every group
/// and every materialized subject of that group, of the placement
/// indicator at point `u`.
pub fn placement_terms_at(
    idx: &PerSubjectIndex,
    subject_counts: &[usize],
    u: usize,
) -> Vec<usize> {
    let mut terms = Vec::new();
    for (i, &count) in subject_counts.iter().enumerate() {
        for p in 0..count {
            terms.push(idx.placement[&(i, p, u)]);
        }
    }
    terms
}

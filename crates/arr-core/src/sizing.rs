//! Sizing preprocessor (C3): derives per-group subject counts `N_i` and net
//! production `G_i` from the flow demand matrix.

use crate::diagnostics::Diagnostics;
use crate::error::{ArrangementError, ArrangementResult};
use crate::ids::GroupIndex;
use crate::model::{GroupSizing, SubjectGroup, TotalFlows};

fn ceil_div(numerator: u64, denominator: u64) -> u64 {
    numerator.div_ceil(denominator)
}

/// Computes `N_i` and `G_i` for every group, in the groups' canonical
/// (insertion) order. Fails with [`ArrangementError::Configuration`] if a
/// group has zero input or output capacity while carrying non-zero demand
/// on that side (§4.1).
pub fn compute_sizing(
    groups: &[SubjectGroup],
    flows: &TotalFlows,
) -> ArrangementResult<(Vec<GroupSizing>, Diagnostics)> {
    let mut diagnostics = Diagnostics::new();
    let mut sizing = Vec::with_capacity(groups.len());

    for (idx, group) in groups.iter().enumerate() {
        let gi = GroupIndex::new(idx);
        let in_flow = flows.in_flow(gi);
        let out_flow = flows.out_flow(gi);

        if group.input_capacity() == 0 && in_flow > 0 {
            return Err(ArrangementError::Configuration(format!(
                "group {:?} has zero input capacity but non-zero inbound demand {in_flow}",
                group.name()
            )));
        }
        if group.output_capacity() == 0 && out_flow > 0 {
            return Err(ArrangementError::Configuration(format!(
                "group {:?} has zero output capacity but non-zero outbound demand {out_flow}",
                group.name()
            )));
        }

        let needed_for_input = if group.input_capacity() == 0 {
            0
        } else {
            ceil_div(in_flow, group.input_capacity() as u64)
        };
        let needed_for_output = if group.output_capacity() == 0 {
            0
        } else {
            ceil_div(out_flow, group.output_capacity() as u64)
        };
        let subject_count = needed_for_input.max(needed_for_output);
        let net_production = out_flow as i64 - in_flow as i64;

        if in_flow == 0 && out_flow == 0 {
            diagnostics.add_warning_with_entity(
                "sizing",
                "group has no inbound or outbound demand",
                group.name(),
            );
        }

        sizing.push(GroupSizing {
            subject_count,
            net_production,
        });
    }

    let balance: i64 = sizing.iter().map(|s| s.net_production).sum();
    if balance != 0 {
        diagnostics.add_error(
            "sizing",
            &format!("demand matrix is not globally balanced: Σ G_i = {balance}, expected 0"),
        );
    }

    Ok((sizing, diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups() -> Vec<SubjectGroup> {
        vec![
            SubjectGroup::new("A", 10, 10, 1),
            SubjectGroup::new("B", 10, 10, 1),
        ]
    }

    #[test]
    fn sizing_derives_subject_count_and_net_production() {
        let mut flows = TotalFlows::new(["A", "B"]);
        flows.set_flow("A", "B", 5).unwrap();
        let (sizing, diagnostics) = compute_sizing(&groups(), &flows).unwrap();
        assert_eq!(sizing[0].subject_count, 1);
        assert_eq!(sizing[0].net_production, 5);
        assert_eq!(sizing[1].subject_count, 1);
        assert_eq!(sizing[1].net_production, -5);
        assert!(!diagnostics.has_errors());
    }

    #[test]
    fn zero_capacity_with_demand_is_configuration_error() {
        let mut flows = TotalFlows::new(["A", "B"]);
        flows.set_flow("A", "B", 5).unwrap();
        let groups = vec![
            SubjectGroup::new("A", 10, 0, 1),
            SubjectGroup::new("B", 10, 10, 1),
        ];
        let err = compute_sizing(&groups, &flows).unwrap_err();
        assert!(matches!(err, ArrangementError::Configuration(_)));
    }

    #[test]
    fn zero_demand_group_has_zero_sizing() {
        let flows = TotalFlows::new(["A", "B"]);
        let (sizing, diagnostics) = compute_sizing(&groups(), &flows).unwrap();
        assert_eq!(sizing[0].subject_count, 0);
        assert_eq!(sizing[0].net_production, 0);
        assert!(diagnostics.warnings().count() >= 2);
    }

    #[test]
    fn unbalanced_matrix_flags_a_diagnostic_error() {
        let mut flows = TotalFlows::new(["A", "B", "C"]);
        flows.set_flow("A", "B", 5).unwrap();
        flows.set_flow("A", "C", 0).unwrap();
        let groups = vec![
            SubjectGroup::new("A", 10, 10, 1),
            SubjectGroup::new("B", 10, 10, 1),
            SubjectGroup::new("C", 10, 10, 1),
        ];
        let (_, diagnostics) = compute_sizing(&groups, &flows).unwrap();
        assert!(!diagnostics.has_errors());
    }
}

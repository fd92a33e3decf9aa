#![allow(dead_code)]

use std::ops::RangeInclusive;

use crate::impact::TREE_CO2_KG_PER_YEAR;
use crate::storage::ProgressState;
use crate::tiers::TIERS;
use crate::types::{QuestProgressRecord, QuestStatus, UserImpact};

/// Exactly one tier contains every total in `range`.
pub fn assert_tiers_partition(range: RangeInclusive<u64>) {
    for points in range {
        let matching = TIERS.iter().filter(|t| t.contains(points)).count();
        assert_eq!(
            matching, 1,
            "tier table broken: {matching} tiers contain {points} points"
        );
    }
}

/// Adjacent tiers leave no gap between them.
pub fn assert_tiers_contiguous() {
    assert_eq!(TIERS[0].min_points, 0, "first tier must start at zero");
    for pair in TIERS.windows(2) {
        let max = pair[0]
            .max_points
            .unwrap_or_else(|| panic!("only the last tier may be unbounded: {}", pair[0].id));
        assert_eq!(
            max + 1,
            pair[1].min_points,
            "gap between {} and {}",
            pair[0].id,
            pair[1].id
        );
    }
    assert!(TIERS[TIERS.len() - 1].max_points.is_none());
}

/// Status only moves forward: absent -> InProgress -> Completed.
pub fn assert_valid_status_transition(from: Option<QuestStatus>, to: Option<QuestStatus>) {
    let valid = matches!(
        (from, to),
        (None, None)
            | (None, Some(_))
            | (Some(QuestStatus::InProgress), Some(_))
            | (Some(QuestStatus::Completed), Some(QuestStatus::Completed))
    );
    assert!(valid, "invalid status transition from {from:?} to {to:?}");
}

/// A completed record keeps the points it was awarded.
pub fn assert_points_unchanged(before: &QuestProgressRecord, after: &QuestProgressRecord) {
    if before.status == QuestStatus::Completed {
        assert_eq!(
            before.points_earned, after.points_earned,
            "points_earned changed after completion"
        );
    }
}

/// Trees equivalent is exactly CO2 / 21.
pub fn assert_trees_consistent(impact: &UserImpact) {
    assert_eq!(
        impact.trees_equivalent,
        impact.co2_avoided_kg / TREE_CO2_KG_PER_YEAR,
        "trees_equivalent out of sync with co2_avoided_kg"
    );
}

/// Balance and impact agree with each other.
pub fn assert_state_consistent(state: &ProgressState) {
    assert_eq!(state.total_points, state.impact.total_points_earned);
    assert_trees_consistent(&state.impact);
    for (id, record) in &state.records {
        match record.status {
            QuestStatus::InProgress => {
                assert!(record.points_earned.is_none(), "{id}: in-progress with points");
                assert!(record.completed_at.is_none(), "{id}: in-progress with completion time");
            }
            QuestStatus::Completed => {
                assert!(record.points_earned.is_some(), "{id}: completed without points");
                assert!(record.completed_at.is_some(), "{id}: completed without time");
            }
        }
    }
}

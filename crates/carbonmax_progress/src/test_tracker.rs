use chrono::{TimeZone, Utc};

use crate::catalog::QuestCatalog;
use crate::invariants::{
    assert_points_unchanged, assert_state_consistent, assert_tiers_contiguous,
    assert_trees_consistent, assert_valid_status_transition,
};
use crate::storage::{self, KeyValueStore, MemoryStore, DEFAULT_STORAGE_KEY};
use crate::{ProgressTracker, QuestOutcome, QuestStatus};

fn setup() -> (MemoryStore, ProgressTracker<MemoryStore>) {
    let store = MemoryStore::new();
    let tracker = ProgressTracker::load(store.clone(), DEFAULT_STORAGE_KEY);
    (store, tracker)
}

fn transport(co2_avoided_kg: f64) -> QuestOutcome {
    QuestOutcome::Transport {
        transport_mode: "train".to_string(),
        distance_km: 25.0,
        co2_avoided_kg,
    }
}

#[test]
fn test_fresh_tracker_is_empty() {
    let (_, tracker) = setup();
    assert_eq!(tracker.total_points(), 0);
    assert!(tracker.records().is_empty());
    assert_eq!(tracker.user_impact().quests_completed, 0);

    let progress = tracker.tier_progress();
    assert_eq!(progress.current_tier.name, "Seedling");
    assert_eq!(progress.next_tier.map(|t| t.name), Some("Sapling"));
    assert_eq!(progress.points_to_next_tier, 500);
    assert_eq!(progress.progress_percent, 0.0);
}

#[test]
fn test_start_quest_marks_in_progress() {
    let (_, mut tracker) = setup();
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap();

    assert!(tracker.start_quest_at("hydration-hero", now));
    assert!(tracker.is_quest_in_progress("hydration-hero"));
    assert!(!tracker.is_quest_completed("hydration-hero"));

    let record = tracker.record("hydration-hero").unwrap();
    assert_eq!(record.status, QuestStatus::InProgress);
    assert_eq!(record.started_at, Some(now));
    assert_eq!(record.points_earned, None);
}

#[test]
fn test_restart_in_progress_quest_restamps() {
    let (_, mut tracker) = setup();
    let first = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
    let second = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();

    tracker.start_quest_at("green-commute", first);
    assert!(tracker.start_quest_at("green-commute", second));
    assert_eq!(
        tracker.record("green-commute").unwrap().started_at,
        Some(second)
    );
}

#[test]
fn test_start_completed_quest_is_noop() {
    let (store, mut tracker) = setup();
    tracker.start_quest("hydration-hero");
    tracker.complete_quest("hydration-hero", 100, false, None);
    let before = tracker.record("hydration-hero").unwrap().clone();
    let saved = store.get(DEFAULT_STORAGE_KEY);

    assert!(!tracker.start_quest("hydration-hero"));

    let after = tracker.record("hydration-hero").unwrap();
    assert_eq!(&before, after);
    assert_valid_status_transition(Some(before.status), Some(after.status));
    assert_points_unchanged(&before, after);
    assert_eq!(store.get(DEFAULT_STORAGE_KEY), saved);
}

#[test]
fn test_complete_quest_adds_exact_points() {
    let (_, mut tracker) = setup();
    tracker.start_quest("eco-explorer-quiz");
    let record = tracker.complete_quest("eco-explorer-quiz", 50, false, None);
    assert_eq!(record.points_earned, Some(50));
    assert!(!record.bonus_earned);

    assert_eq!(tracker.total_points(), 50);
    assert!(tracker.is_quest_completed("eco-explorer-quiz"));
    assert!(!tracker.is_quest_in_progress("eco-explorer-quiz"));
    assert_state_consistent(tracker.state());
}

#[test]
fn test_complete_with_bonus_recalculates_tier() {
    let (_, mut tracker) = setup();
    let catalog = QuestCatalog::builtin().unwrap();
    let commute = catalog.get("green-commute").unwrap();

    // Put the user 300 points below Sapling.
    tracker.complete_quest("fuel-the-future", 200, false, None);
    assert_eq!(tracker.tier_progress().current_tier.id, "seedling");

    let points = commute.points_for(true);
    assert_eq!(points, 350);
    tracker.start_quest(&commute.id);
    tracker.complete_quest(&commute.id, points, true, Some(transport(4.2)));

    assert_eq!(tracker.total_points(), 550);
    let progress = tracker.tier_progress();
    assert_eq!(progress.current_tier.id, "sapling");
    assert_eq!(progress.next_tier.map(|t| t.id), Some("evergreen"));
    assert_eq!(progress.points_to_next_tier, 950);
    assert!(tracker.record(&commute.id).unwrap().bonus_earned);
}

#[test]
fn test_completion_preserves_start_time_and_outcome() {
    let (_, mut tracker) = setup();
    let started = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
    let finished = Utc.with_ymd_and_hms(2024, 6, 1, 8, 40, 0).unwrap();
    let outcome = QuestOutcome::Meal {
        dish: "nasi lemak (vegan)".to_string(),
        co2_avoided_kg: 1.8,
        plastic_saved_g: 15.0,
    };

    tracker.start_quest_at("plant-based-plate", started);
    let record =
        tracker.complete_quest_at("plant-based-plate", 200, true, Some(outcome.clone()), finished);

    assert_eq!(record.started_at, Some(started));
    assert_eq!(record.completed_at, Some(finished));
    assert_eq!(record.outcome.as_ref(), Some(&outcome));
}

#[test]
fn test_completion_without_start_is_allowed() {
    let (_, mut tracker) = setup();
    let record = tracker.complete_quest("rail-home", 150, false, None);
    assert_eq!(record.status, QuestStatus::Completed);
    assert_eq!(record.started_at, None);
}

#[test]
fn test_impact_accumulates_across_completions() {
    let (_, mut tracker) = setup();
    tracker.complete_quest("green-commute", 150, false, Some(transport(10.5)));
    tracker.complete_quest(
        "hydration-hero",
        150,
        true,
        Some(QuestOutcome::Refill {
            refills: 2,
            plastic_saved_g: 40.0,
        }),
    );
    tracker.complete_quest(
        "plant-based-plate",
        120,
        false,
        Some(QuestOutcome::Meal {
            dish: "tempeh bowl".to_string(),
            co2_avoided_kg: 10.5,
            plastic_saved_g: 10.0,
        }),
    );

    let impact = tracker.user_impact();
    assert_eq!(impact.quests_completed, 3);
    assert_eq!(impact.total_points_earned, 420);
    assert_eq!(impact.co2_avoided_kg, 21.0);
    assert_eq!(impact.plastic_saved_g, 50.0);
    assert_eq!(impact.trees_equivalent, 1.0);
    assert_trees_consistent(impact);
    assert_state_consistent(tracker.state());
}

#[test]
fn test_trees_recomputed_after_every_completion() {
    let (_, mut tracker) = setup();
    tracker.complete_quest("green-commute", 150, false, Some(transport(7.0)));
    assert_eq!(tracker.user_impact().trees_equivalent, 7.0 / 21.0);
    tracker.complete_quest("rail-home", 150, false, Some(transport(14.0)));
    assert_eq!(tracker.user_impact().trees_equivalent, 21.0 / 21.0);
}

#[test]
fn test_double_completion_double_counts() {
    let (_, mut tracker) = setup();
    tracker.complete_quest("eco-explorer-quiz", 50, false, None);
    tracker.complete_quest("eco-explorer-quiz", 50, false, None);
    assert_eq!(tracker.total_points(), 100);
    assert_eq!(tracker.user_impact().quests_completed, 2);
}

#[test]
fn test_every_mutation_is_written_through() {
    let (store, mut tracker) = setup();
    assert!(store.get(DEFAULT_STORAGE_KEY).is_none());

    tracker.start_quest("hydration-hero");
    let after_start = storage::load_state(&store, DEFAULT_STORAGE_KEY);
    assert!(after_start.records.contains_key("hydration-hero"));

    tracker.complete_quest("hydration-hero", 100, false, None);
    let after_complete = storage::load_state(&store, DEFAULT_STORAGE_KEY);
    assert_eq!(after_complete.total_points, 100);
    assert_eq!(&after_complete, tracker.state());
}

#[test]
fn test_reload_restores_state() {
    let store = MemoryStore::new();
    {
        let mut tracker = ProgressTracker::load(&store, "progress:alice");
        tracker.start_quest("green-commute");
        tracker.complete_quest("green-commute", 350, true, Some(transport(21.0)));
        tracker.start_quest("hydration-hero");
    }

    let tracker = ProgressTracker::load(&store, "progress:alice");
    assert_eq!(tracker.key(), "progress:alice");
    assert_eq!(tracker.total_points(), 350);
    assert!(tracker.is_quest_completed("green-commute"));
    assert!(tracker.is_quest_in_progress("hydration-hero"));
    assert_eq!(tracker.user_impact().trees_equivalent, 1.0);

    let other = ProgressTracker::load(&store, "progress:bob");
    assert_eq!(other.total_points(), 0);
}

#[test]
fn test_malformed_storage_starts_empty() {
    let store = MemoryStore::new();
    store.set(DEFAULT_STORAGE_KEY, "not json at all".to_string());

    let tracker = ProgressTracker::load(store, DEFAULT_STORAGE_KEY);
    assert_eq!(tracker.total_points(), 0);
    assert!(tracker.records().is_empty());
    assert!(!tracker.is_quest_completed("green-commute"));
}

#[test]
fn test_reaching_canopy() {
    let (_, mut tracker) = setup();
    tracker.complete_quest("fuel-the-future", 10_000, false, None);
    let progress = tracker.tier_progress();
    assert_eq!(progress.current_tier.name, "Canopy");
    assert!(progress.next_tier.is_none());
    assert_eq!(progress.progress_percent, 0.0);
}

#[test]
fn test_tier_table_is_contiguous() {
    assert_tiers_contiguous();
}

#[test]
fn test_huge_impact_totals_survive_reload() {
    let (store, mut tracker) = setup();
    tracker.complete_quest("green-commute", 250, false, Some(transport(1.7e308)));
    tracker.complete_quest("rail-home", 250, false, Some(transport(1.7e308)));
    assert_eq!(tracker.user_impact().co2_avoided_kg, f64::MAX);

    let reloaded = ProgressTracker::load(store, DEFAULT_STORAGE_KEY);
    assert_eq!(reloaded.total_points(), 500);
    assert!(reloaded.is_quest_completed("green-commute"));
    assert!(reloaded.is_quest_completed("rail-home"));
    assert!(reloaded.user_impact().co2_avoided_kg.is_finite());
    assert!(reloaded.user_impact().trees_equivalent.is_finite());
}

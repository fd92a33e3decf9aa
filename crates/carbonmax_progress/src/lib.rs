//! # CarbonMax Progress
//!
//! The quest progress engine behind CarbonMax: users complete airport
//! eco-quests, earn Eco-Points, climb five tiers and accumulate simulated
//! impact (CO2 avoided, plastic saved, tree equivalents).
//!
//! | Phase      | Entry Point(s)                                              |
//! |------------|-------------------------------------------------------------|
//! | Bootstrap  | [`ProgressTracker::load`], [`QuestCatalog::builtin`]        |
//! | Progress   | [`ProgressTracker::start_quest`], [`ProgressTracker::complete_quest`] |
//! | Queries    | `is_quest_completed`, `is_quest_in_progress`, `tier_progress`, `user_impact` |
//! | Tiers      | [`tiers::tier_progress`], [`tiers::TIERS`]                  |
//!
//! ## Architecture
//!
//! Persistence is fully delegated to [`storage`], which talks to any
//! [`KeyValueStore`]. Tier lookups live in [`tiers`] and impact folding in
//! [`impact`]. The tracker only sequences state changes and write-through.

pub mod catalog;
pub mod error;
pub mod impact;
pub mod storage;
pub mod tiers;
mod tracker;
mod types;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod test_tracker;

pub use catalog::QuestCatalog;
pub use error::{ProgressError, Result};
pub use impact::{AggregateImpact, TREE_CO2_KG_PER_YEAR};
pub use storage::{KeyValueStore, MemoryStore, ProgressState};
pub use tracker::ProgressTracker;
pub use types::{
    Quest, QuestKind, QuestMode, QuestOutcome, QuestProgressRecord, QuestStatus, Tier,
    UserImpact, UserTierProgress,
};

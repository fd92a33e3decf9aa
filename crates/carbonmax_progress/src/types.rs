//! # Types
//!
//! Shared data structures used across all modules of the progress engine.
//!
//! ## Design decisions
//!
//! ### Catalog / Record split
//!
//! A quest is described by two separate structures:
//!
//! - [`Quest`]: loaded once from the catalog; never mutated.
//! - [`QuestProgressRecord`]: written on start and on completion, per user.
//!
//! ### Status as a Finite-State Machine
//!
//! [`QuestStatus`] enforces a strict forward-only lifecycle:
//!
//! ```text
//! (not started) ──► InProgress ──► Completed
//!       └────────────────────────────►┘
//! ```
//!
//! "Not started" is never stored; it is the absence of a record.
//! `Completed` is terminal.
//!
//! ### Typed outcomes
//!
//! Quest-specific completion data is a [`QuestOutcome`] variant per
//! [`QuestKind`] rather than a free-form map.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ProgressError, Result};

/// Where in the airport journey a quest takes place.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestMode {
    Departure,
    Arrival,
    Transit,
}

/// The shape of outcome data a quest reports on completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestKind {
    Refill,
    Transport,
    Meal,
    Offset,
    Shopping,
    Quiz,
}

impl QuestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Refill => "refill",
            Self::Transport => "transport",
            Self::Meal => "meal",
            Self::Offset => "offset",
            Self::Shopping => "shopping",
            Self::Quiz => "quiz",
        }
    }
}

/// A predefined quest from the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quest {
    /// Stable identifier, unique within the catalog.
    pub id: String,
    pub mode: QuestMode,
    pub kind: QuestKind,
    pub title: String,
    pub description: String,
    /// Eco-Points awarded for every completion.
    pub base_points: u32,
    /// Extra Eco-Points awarded when the bonus condition is met.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bonus_points: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bonus_condition: Option<String>,
    pub estimated_minutes: u32,
}

impl Quest {
    /// Points a completion is worth, with or without the bonus.
    pub fn points_for(&self, bonus_earned: bool) -> u32 {
        match (bonus_earned, self.bonus_points) {
            (true, Some(bonus)) => self.base_points.saturating_add(bonus),
            _ => self.base_points,
        }
    }
}

/// Stored lifecycle status of a quest for one user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    /// Started but not yet finished.
    InProgress,
    /// Finished; terminal.
    Completed,
}

/// Quest-specific data attached at completion time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestOutcome {
    /// Refilled a reusable bottle at a water station.
    Refill { refills: u32, plastic_saved_g: f64 },
    /// Reached the airport by a low-carbon transport mode.
    Transport {
        transport_mode: String,
        distance_km: f64,
        co2_avoided_kg: f64,
    },
    /// Chose a plant-based meal.
    Meal {
        dish: String,
        co2_avoided_kg: f64,
        plastic_saved_g: f64,
    },
    /// Contributed to sustainable aviation fuel.
    Offset { fuel_litres: f64, co2_avoided_kg: f64 },
    /// Shopped without single-use bags.
    Shopping { items: u32, plastic_saved_g: f64 },
    /// Answered the eco-knowledge quiz.
    Quiz {
        correct_answers: u32,
        total_questions: u32,
    },
}

impl QuestOutcome {
    pub fn kind(&self) -> QuestKind {
        match self {
            Self::Refill { .. } => QuestKind::Refill,
            Self::Transport { .. } => QuestKind::Transport,
            Self::Meal { .. } => QuestKind::Meal,
            Self::Offset { .. } => QuestKind::Offset,
            Self::Shopping { .. } => QuestKind::Shopping,
            Self::Quiz { .. } => QuestKind::Quiz,
        }
    }

    /// CO2 avoided in kilograms; zero for shapes that do not report it.
    pub fn co2_avoided_kg(&self) -> f64 {
        match self {
            Self::Transport { co2_avoided_kg, .. }
            | Self::Meal { co2_avoided_kg, .. }
            | Self::Offset { co2_avoided_kg, .. } => *co2_avoided_kg,
            _ => 0.0,
        }
    }

    /// Check that every reported amount is finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in self.amounts() {
            if !value.is_finite() || value < 0.0 {
                return Err(ProgressError::InvalidOutcome {
                    kind: self.kind().as_str(),
                    field,
                    value,
                });
            }
        }
        Ok(())
    }

    fn amounts(&self) -> Vec<(&'static str, f64)> {
        match self {
            Self::Refill {
                plastic_saved_g, ..
            }
            | Self::Shopping {
                plastic_saved_g, ..
            } => vec![("plastic_saved_g", *plastic_saved_g)],
            Self::Transport {
                distance_km,
                co2_avoided_kg,
                ..
            } => vec![
                ("distance_km", *distance_km),
                ("co2_avoided_kg", *co2_avoided_kg),
            ],
            Self::Meal {
                co2_avoided_kg,
                plastic_saved_g,
                ..
            } => vec![
                ("co2_avoided_kg", *co2_avoided_kg),
                ("plastic_saved_g", *plastic_saved_g),
            ],
            Self::Offset {
                fuel_litres,
                co2_avoided_kg,
            } => vec![
                ("fuel_litres", *fuel_litres),
                ("co2_avoided_kg", *co2_avoided_kg),
            ],
            Self::Quiz { .. } => Vec::new(),
        }
    }

    /// Plastic saved in grams; zero for shapes that do not report it.
    pub fn plastic_saved_g(&self) -> f64 {
        match self {
            Self::Refill { plastic_saved_g, .. }
            | Self::Meal { plastic_saved_g, .. }
            | Self::Shopping { plastic_saved_g, .. } => *plastic_saved_g,
            _ => 0.0,
        }
    }
}

/// Per-user progress on a single quest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuestProgressRecord {
    pub status: QuestStatus,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Set only on completion.
    #[serde(default)]
    pub points_earned: Option<u32>,
    #[serde(default)]
    pub bonus_earned: bool,
    #[serde(default)]
    pub outcome: Option<QuestOutcome>,
}

impl QuestProgressRecord {
    pub(crate) fn started(now: DateTime<Utc>) -> Self {
        Self {
            status: QuestStatus::InProgress,
            started_at: Some(now),
            completed_at: None,
            points_earned: None,
            bonus_earned: false,
            outcome: None,
        }
    }
}

/// Cumulative impact of every completion so far.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserImpact {
    pub quests_completed: u32,
    pub total_points_earned: u64,
    pub co2_avoided_kg: f64,
    pub plastic_saved_g: f64,
    pub trees_equivalent: f64,
}

/// A point-threshold rank.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Tier {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    /// Inclusive lower bound.
    pub min_points: u64,
    /// Inclusive upper bound; `None` for the top tier.
    pub max_points: Option<u64>,
    pub perks: &'static [&'static str],
}

impl Tier {
    pub fn contains(&self, points: u64) -> bool {
        points >= self.min_points && self.max_points.map_or(true, |max| points <= max)
    }
}

/// Where a point total sits in the tier table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserTierProgress {
    pub current_tier: &'static Tier,
    pub next_tier: Option<&'static Tier>,
    pub points_to_next_tier: u64,
    pub progress_percent: f64,
}

//! Impact accumulator: folds completions into running [`UserImpact`] totals.

use serde::Serialize;

use crate::types::{QuestOutcome, UserImpact};

/// Kilograms of CO2 one tree absorbs in a year.
pub const TREE_CO2_KG_PER_YEAR: f64 = 21.0;

pub fn trees_equivalent(co2_avoided_kg: f64) -> f64 {
    co2_avoided_kg / TREE_CO2_KG_PER_YEAR
}

/// Add an impact amount to a running total.
///
/// Negative or non-finite amounts are ignored and the sum saturates at
/// `f64::MAX`, so totals always stay serializable.
fn accumulate(total: f64, amount: f64) -> f64 {
    if !amount.is_finite() || amount <= 0.0 {
        return total;
    }
    let sum = total + amount;
    if sum.is_finite() {
        sum
    } else {
        f64::MAX
    }
}

impl UserImpact {
    /// Fold one completion into the totals. Missing outcome data counts as zero.
    pub fn record_completion(&mut self, points: u32, outcome: Option<&QuestOutcome>) {
        self.quests_completed += 1;
        self.total_points_earned += u64::from(points);
        if let Some(outcome) = outcome {
            self.co2_avoided_kg = accumulate(self.co2_avoided_kg, outcome.co2_avoided_kg());
            self.plastic_saved_g = accumulate(self.plastic_saved_g, outcome.plastic_saved_g());
        }
        self.trees_equivalent = trees_equivalent(self.co2_avoided_kg);
    }
}

/// Impact summed over many users.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AggregateImpact {
    pub users: u32,
    pub quests_completed: u64,
    pub total_points_earned: u64,
    pub co2_avoided_kg: f64,
    pub plastic_saved_g: f64,
    pub trees_equivalent: f64,
}

impl AggregateImpact {
    pub fn add_user(&mut self, impact: &UserImpact) {
        self.users += 1;
        self.quests_completed += u64::from(impact.quests_completed);
        self.total_points_earned += impact.total_points_earned;
        self.co2_avoided_kg = accumulate(self.co2_avoided_kg, impact.co2_avoided_kg);
        self.plastic_saved_g = accumulate(self.plastic_saved_g, impact.plastic_saved_g);
        self.trees_equivalent = trees_equivalent(self.co2_avoided_kg);
    }
}

impl<'a> FromIterator<&'a UserImpact> for AggregateImpact {
    fn from_iter<I: IntoIterator<Item = &'a UserImpact>>(iter: I) -> Self {
        let mut total = AggregateImpact::default();
        for impact in iter {
            total.add_user(impact);
        }
        total
    }
}

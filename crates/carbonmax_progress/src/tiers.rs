//! # Tier Table
//!
//! Five tiers whose ranges partition the non-negative integers:
//!
//! | Tier            | Range          |
//! |-----------------|----------------|
//! | Seedling        | 0 – 499        |
//! | Sapling         | 500 – 1 499    |
//! | Evergreen       | 1 500 – 3 999  |
//! | Forest Guardian | 4 000 – 9 999  |
//! | Canopy          | 10 000 +       |

use crate::types::{Tier, UserTierProgress};

/// Range used for progress within the unbounded top tier.
pub const TOP_TIER_PROGRESS_SPAN: u64 = 1000;

pub static TIERS: &[Tier] = &[
    Tier {
        id: "seedling",
        name: "Seedling",
        icon: "🌱",
        min_points: 0,
        max_points: Some(499),
        perks: &[
            "Welcome badge on your CarbonMax profile",
            "Monthly eco-tips newsletter",
        ],
    },
    Tier {
        id: "sapling",
        name: "Sapling",
        icon: "🌿",
        min_points: 500,
        max_points: Some(1499),
        perks: &[
            "Free drink refill at partner cafés",
            "5% off at participating green retailers",
        ],
    },
    Tier {
        id: "evergreen",
        name: "Evergreen",
        icon: "🌲",
        min_points: 1500,
        max_points: Some(3999),
        perks: &[
            "10% off at participating green retailers",
            "Priority access to eco-events",
            "Complimentary reusable tote",
        ],
    },
    Tier {
        id: "forest-guardian",
        name: "Forest Guardian",
        icon: "🌳",
        min_points: 4000,
        max_points: Some(9999),
        perks: &[
            "15% off at participating green retailers",
            "Lounge day pass once per year",
            "A tree planted in your name",
        ],
    },
    Tier {
        id: "canopy",
        name: "Canopy",
        icon: "🌍",
        min_points: 10_000,
        max_points: None,
        perks: &[
            "20% off at participating green retailers",
            "Unlimited lounge access on green travel days",
            "Annual sustainability impact certificate",
            "Invitation to the CarbonMax leadership circle",
        ],
    },
];

/// Index of the first tier whose range contains `points`.
fn tier_index(points: u64) -> usize {
    TIERS
        .iter()
        .position(|tier| tier.contains(points))
        .unwrap_or(TIERS.len() - 1)
}

/// The tier a point total belongs to.
pub fn tier_for_points(points: u64) -> &'static Tier {
    &TIERS[tier_index(points)]
}

/// Look up a tier by its identifier.
pub fn tier_by_id(id: &str) -> Option<&'static Tier> {
    TIERS.iter().find(|tier| tier.id == id)
}

/// Derive the current/next tier and in-tier progress from a point total.
pub fn tier_progress(total_points: u64) -> UserTierProgress {
    let index = tier_index(total_points);
    let current_tier = &TIERS[index];
    let next_tier = TIERS.get(index + 1);

    let points_to_next_tier = next_tier
        .map(|next| next.min_points.saturating_sub(total_points))
        .unwrap_or(0);

    let span = current_tier
        .max_points
        .map(|max| max - current_tier.min_points)
        .unwrap_or(TOP_TIER_PROGRESS_SPAN);
    let gained = total_points.saturating_sub(current_tier.min_points);
    let progress_percent = (gained as f64 / span as f64 * 100.0).clamp(0.0, 100.0);

    UserTierProgress {
        current_tier,
        next_tier,
        points_to_next_tier,
        progress_percent,
    }
}

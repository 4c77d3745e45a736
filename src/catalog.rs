//! Built-in insurer catalog
//!
//! The insurers users can pick during onboarding, each with its bonus program.

use crate::error::MetricsError;
use crate::types::{BonusProgram, BonusProgramRequirement, Insurer};

/// Window used by every built-in bonus program
pub const DEFAULT_PERIOD_DAYS: u32 = 30;

#[allow(clippy::too_many_arguments)]
fn insurer(
    id: &str,
    name: &str,
    logo: &str,
    program: &str,
    description: &str,
    steps_per_day: u32,
    days_required: u32,
    reward: &str,
) -> Insurer {
    Insurer {
        id: id.to_string(),
        name: name.to_string(),
        logo: logo.to_string(),
        bonus_program: BonusProgram {
            name: program.to_string(),
            description: description.to_string(),
            requirement: BonusProgramRequirement {
                steps_per_day,
                days_required,
                period_days: DEFAULT_PERIOD_DAYS,
            },
            reward: reward.to_string(),
        },
    }
}

/// All insurers in display order
pub fn insurers() -> Vec<Insurer> {
    vec![
        insurer(
            "tk",
            "Techniker Krankenkasse",
            "🏥",
            "TK-Fit",
            "Earn bonus points for staying active",
            8000,
            20,
            "€50 bonus payment",
        ),
        insurer(
            "aok",
            "AOK",
            "💚",
            "AOK Bonus",
            "Get rewarded for healthy habits",
            7500,
            18,
            "€40 bonus payment",
        ),
        insurer(
            "demo",
            "Demo Insurance",
            "🎯",
            "Step Challenge",
            "Demo bonus program for testing",
            6000,
            15,
            "€30 bonus payment",
        ),
    ]
}

/// Look up an insurer by id (case-insensitive)
pub fn find_insurer(id: &str) -> Result<Insurer, MetricsError> {
    let wanted = id.trim();
    insurers()
        .into_iter()
        .find(|insurer| insurer.id.eq_ignore_ascii_case(wanted))
        .ok_or_else(|| MetricsError::UnknownInsurer(id.to_string()))
}

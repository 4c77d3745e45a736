//! Derived activity views
//!
//! Builds the figures the client screens show on top of the raw metrics:
//! per-day goal progress, the weekly breakdown, the whole-period overview,
//! streak tiers, and the combined dashboard snapshot.

use crate::metrics::{self, WEEK_DAYS};
use crate::types::{BonusProgram, BonusProgramRequirement, BonusProgress, DailyActivityRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Share of `target` reached by `steps`, capped at 100
///
/// A zero target counts as met.
pub fn goal_progress_percentage(steps: u32, target: u32) -> f64 {
    if target == 0 {
        return 100.0;
    }
    (f64::from(steps) / f64::from(target) * 100.0).min(100.0)
}

/// Qualifying days still missing before the bonus can be claimed
pub fn days_remaining(progress: &BonusProgress, requirement: &BonusProgramRequirement) -> u32 {
    requirement
        .days_required
        .saturating_sub(progress.days_achieved)
}

/// Goal progress of a single day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayProgress {
    pub date: NaiveDate,
    pub steps: u32,
    pub target: u32,
    pub goal_met: bool,
    pub progress_percentage: f64,
}

impl From<&DailyActivityRecord> for DayProgress {
    fn from(record: &DailyActivityRecord) -> Self {
        Self {
            date: record.date,
            steps: record.steps,
            target: record.target,
            goal_met: record.goal_met(),
            progress_percentage: goal_progress_percentage(record.steps, record.target),
        }
    }
}

/// Breakdown of the trailing week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySummary {
    /// Oldest first; the last entry is the most recent day
    pub days: Vec<DayProgress>,
    pub total_steps: u64,
    /// Rounded daily mean, 0 when there is no data
    pub average_steps: u64,
    pub days_with_goal: u32,
}

/// Summarize the last seven records
pub fn weekly_summary(records: &[DailyActivityRecord]) -> WeeklySummary {
    let week = metrics::last_n(records, WEEK_DAYS);
    let total_steps = metrics::weekly_total(records);

    let average_steps = if week.is_empty() {
        0
    } else {
        (total_steps as f64 / week.len() as f64).round() as u64
    };

    WeeklySummary {
        days: week.iter().map(DayProgress::from).collect(),
        total_steps,
        average_steps,
        days_with_goal: week.iter().filter(|record| record.goal_met()).count() as u32,
    }
}

/// Totals over the whole record sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodOverview {
    pub total_steps: u64,
    pub goals_achieved: u32,
    pub days: u32,
}

pub fn period_overview(records: &[DailyActivityRecord]) -> PeriodOverview {
    PeriodOverview {
        total_steps: records.iter().map(|record| u64::from(record.steps)).sum(),
        goals_achieved: records.iter().filter(|record| record.goal_met()).count() as u32,
        days: records.len() as u32,
    }
}

/// Streak classification shown next to the streak count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakTier {
    NotStarted,
    GettingStarted,
    Building,
    Momentum,
    OnFire,
    Legendary,
}

impl StreakTier {
    pub fn from_streak(streak: u32) -> Self {
        match streak {
            30.. => StreakTier::Legendary,
            14..=29 => StreakTier::OnFire,
            7..=13 => StreakTier::Momentum,
            3..=6 => StreakTier::Building,
            1..=2 => StreakTier::GettingStarted,
            0 => StreakTier::NotStarted,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            StreakTier::Legendary => "🏆",
            StreakTier::OnFire => "🔥",
            StreakTier::Momentum => "💪",
            StreakTier::Building => "⭐",
            StreakTier::GettingStarted | StreakTier::NotStarted => "🌱",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            StreakTier::Legendary => "Legendary streak!",
            StreakTier::OnFire => "On fire!",
            StreakTier::Momentum => "Great momentum!",
            StreakTier::Building => "Building habits!",
            StreakTier::GettingStarted => "Getting started!",
            StreakTier::NotStarted => "Start your streak today!",
        }
    }
}

/// Everything the dashboard screen renders, computed in one pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub date: NaiveDate,
    pub today_steps: u32,
    pub today_target: u32,
    pub today_progress_percentage: f64,
    pub weekly_total: u64,
    pub streak: u32,
    pub streak_tier: StreakTier,
    pub bonus: BonusProgress,
    pub days_required: u32,
    pub days_remaining: u32,
    pub reward: String,
}

impl DashboardSnapshot {
    /// Compute the snapshot for `today`.
    ///
    /// The daily target comes from today's record when present, otherwise from
    /// the program's per-day threshold.
    pub fn compute(
        records: &[DailyActivityRecord],
        program: &BonusProgram,
        today: NaiveDate,
    ) -> Self {
        let requirement = &program.requirement;
        let today_record = records.iter().find(|record| record.date == today);
        let today_steps = metrics::steps_on(records, today);
        let today_target = today_record
            .map(|record| record.target)
            .unwrap_or(requirement.steps_per_day);

        let streak = metrics::calculate_streak(records);
        let bonus = metrics::calculate_bonus_progress(records, requirement);

        Self {
            date: today,
            today_steps,
            today_target,
            today_progress_percentage: goal_progress_percentage(today_steps, today_target),
            weekly_total: metrics::weekly_total(records),
            streak,
            streak_tier: StreakTier::from_streak(streak),
            bonus,
            days_required: requirement.days_required,
            days_remaining: days_remaining(&bonus, requirement),
            reward: program.reward.clone(),
        }
    }
}

//! Core types for Bewegungsliga
//!
//! This module defines the data that flows between the host application and the
//! metrics engine: daily activity records, insurer bonus programs, users, leagues,
//! and the computed outputs derived from them.
//!
//! JSON field names are camelCase so payloads line up with the web client.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One day of step activity
///
/// Sequences of records are ordered oldest-first, one record per date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyActivityRecord {
    /// Calendar date this record covers (YYYY-MM-DD)
    pub date: NaiveDate,
    /// Steps recorded on that date
    pub steps: u32,
    /// Step goal for that date
    pub target: u32,
}

impl DailyActivityRecord {
    pub fn new(date: NaiveDate, steps: u32, target: u32) -> Self {
        Self {
            date,
            steps,
            target,
        }
    }

    /// Whether the day's own target was reached
    pub fn goal_met(&self) -> bool {
        self.steps >= self.target
    }
}

/// Qualification rule of an insurer bonus program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BonusProgramRequirement {
    /// Minimum steps for a day to count
    pub steps_per_day: u32,
    /// Qualifying days needed inside the window
    pub days_required: u32,
    /// Window size in most-recent records
    pub period_days: u32,
}

/// Insurer-defined bonus program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BonusProgram {
    pub name: String,
    pub description: String,
    pub requirement: BonusProgramRequirement,
    /// Human-readable reward, e.g. "€50 bonus payment"
    pub reward: String,
}

/// Health insurer offering a bonus program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insurer {
    pub id: String,
    pub name: String,
    pub logo: String,
    pub bonus_program: BonusProgram,
}

/// Signed-in user of the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub insurer: Option<Insurer>,
    pub has_consented: bool,
    pub is_onboarded: bool,
    pub activity_connected: bool,
    pub created_at: NaiveDate,
}

/// Member entry inside a league
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueMember {
    pub id: String,
    pub name: String,
    pub total_steps: u64,
    pub streak: u32,
    /// Bonus progress percentage (0-100)
    pub bonus_progress: f64,
}

/// Step league shared between users through a join code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct League {
    pub id: String,
    pub name: String,
    pub code: String,
    pub members: Vec<LeagueMember>,
    pub created_at: NaiveDate,
}

/// Unlocked achievement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub emoji: String,
    pub unlocked_at: NaiveDate,
}

/// Bonus program qualification state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BonusProgress {
    /// Days in the window at or above the daily threshold
    pub days_achieved: u32,
    /// Progress towards `days_required` (0-100, unrounded)
    pub progress_percentage: f64,
    /// Whether enough days were achieved
    pub is_eligible: bool,
}

/// Record of a submitted bonus claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BonusClaim {
    pub claim_id: Uuid,
    pub insurer_id: String,
    pub program: String,
    pub reward: String,
    /// First date of the qualifying window
    pub period_start: NaiveDate,
    pub claimed_on: NaiveDate,
}

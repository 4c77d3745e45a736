//! League standings
//!
//! Ranks league members by total steps and locates the current user.

use crate::types::{League, LeagueMember};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of a league join code
pub const LEAGUE_CODE_LEN: usize = 6;

/// Streak length at which a member is shown as on fire
pub const ON_FIRE_STREAK: u32 = 7;

/// Generate a join code: uppercase alphanumerics drawn from a v4 UUID
pub fn generate_league_code() -> String {
    Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(LEAGUE_CODE_LEN)
        .collect::<String>()
        .to_ascii_uppercase()
}

/// Normalize user-entered codes for comparison
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// A ranked member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedMember {
    /// 1-based position
    pub rank: usize,
    pub member: LeagueMember,
    pub on_fire: bool,
}

/// League leaderboard from one user's point of view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueStandings {
    pub league_id: String,
    pub league_name: String,
    pub member_count: usize,
    /// Ordered by total steps, highest first; ties keep league order
    pub ranking: Vec<RankedMember>,
    /// Position of the viewing user, if they are a member
    pub user_rank: Option<usize>,
}

impl LeagueStandings {
    pub fn from_league(league: &League, user_id: &str) -> Self {
        let mut members: Vec<&LeagueMember> = league.members.iter().collect();
        members.sort_by(|a, b| b.total_steps.cmp(&a.total_steps));

        let ranking: Vec<RankedMember> = members
            .into_iter()
            .enumerate()
            .map(|(i, member)| RankedMember {
                rank: i + 1,
                member: member.clone(),
                on_fire: member.streak >= ON_FIRE_STREAK,
            })
            .collect();

        let user_rank = ranking
            .iter()
            .find(|ranked| ranked.member.id == user_id)
            .map(|ranked| ranked.rank);

        Self {
            league_id: league.id.clone(),
            league_name: league.name.clone(),
            member_count: league.members.len(),
            ranking,
            user_rank,
        }
    }

    /// Top three members
    pub fn podium(&self) -> &[RankedMember] {
        &self.ranking[..self.ranking.len().min(3)]
    }

    /// The viewing user's entry; `None` if the rank does not point into the ranking
    pub fn user_entry(&self) -> Option<&RankedMember> {
        self.user_rank
            .and_then(|rank| rank.checked_sub(1))
            .and_then(|index| self.ranking.get(index))
    }
}

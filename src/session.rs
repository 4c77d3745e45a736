//! Session context
//!
//! [`SessionContext`] owns everything a single signed-in session works with:
//! the user, their activity records, leagues, achievements and bonus claims.
//! Hosts create one per session and pass it to whatever handler needs it.

use crate::error::MetricsError;
use crate::league::{generate_league_code, normalize_code, LeagueStandings};
use crate::metrics;
use crate::summary::{period_overview, DashboardSnapshot};
use crate::types::{
    Achievement, BonusClaim, DailyActivityRecord, Insurer, League, LeagueMember, User,
};
use chrono::{Duration, NaiveDate};
use tracing::{debug, info};
use uuid::Uuid;

/// Streak length that unlocks the streak achievement
pub const STREAK_ACHIEVEMENT_DAYS: u32 = 7;

const STREAK_ACHIEVEMENT_ID: &str = "streak-7";

/// State of one user session
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    user: Option<User>,
    records: Vec<DailyActivityRecord>,
    leagues: Vec<League>,
    achievements: Vec<Achievement>,
    claims: Vec<BonusClaim>,
}

impl SessionContext {
    /// Create a session for `user` with their activity history
    pub fn new(user: Option<User>, records: Vec<DailyActivityRecord>) -> Self {
        Self {
            user,
            records,
            ..Default::default()
        }
    }

    /// Attach leagues the user already belongs to
    pub fn with_leagues(mut self, leagues: Vec<League>) -> Self {
        self.leagues = leagues;
        self
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn records(&self) -> &[DailyActivityRecord] {
        &self.records
    }

    pub fn leagues(&self) -> &[League] {
        &self.leagues
    }

    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    pub fn claims(&self) -> &[BonusClaim] {
        &self.claims
    }

    /// Replace the signed-in user
    pub fn sign_in(&mut self, user: User) {
        info!(user_id = %user.id, "user signed in");
        self.user = Some(user);
    }

    /// Clear the signed-in user
    pub fn sign_out(&mut self) {
        if let Some(user) = self.user.take() {
            info!(user_id = %user.id, "user signed out");
        }
    }

    /// Select the user's insurer. Returns false when nobody is signed in.
    pub fn update_insurer(&mut self, insurer: Insurer) -> bool {
        match self.user.as_mut() {
            Some(user) => {
                debug!(user_id = %user.id, insurer = %insurer.id, "insurer updated");
                user.insurer = Some(insurer);
                true
            }
            None => false,
        }
    }

    /// Record data-sharing consent. Returns false when nobody is signed in.
    pub fn update_consent(&mut self, consented: bool) -> bool {
        match self.user.as_mut() {
            Some(user) => {
                debug!(user_id = %user.id, consented, "consent updated");
                user.has_consented = consented;
                true
            }
            None => false,
        }
    }

    /// Mark the activity source as connected. Returns false when nobody is signed in.
    pub fn connect_activity(&mut self) -> bool {
        match self.user.as_mut() {
            Some(user) => {
                debug!(user_id = %user.id, "activity source connected");
                user.activity_connected = true;
                true
            }
            None => false,
        }
    }

    /// Mark onboarding finished once consent, insurer and activity source are
    /// all in place. Returns whether the user is now onboarded.
    pub fn complete_onboarding(&mut self) -> bool {
        match self.user.as_mut() {
            Some(user) => {
                if user.has_consented && user.insurer.is_some() && user.activity_connected {
                    user.is_onboarded = true;
                }
                user.is_onboarded
            }
            None => false,
        }
    }

    /// Replace the activity history after a sync
    pub fn replace_records(&mut self, records: Vec<DailyActivityRecord>) {
        debug!(count = records.len(), "activity records replaced");
        self.records = records;
    }

    fn active_user(&self) -> Result<&User, MetricsError> {
        self.user.as_ref().ok_or(MetricsError::NoActiveUser)
    }

    fn active_insurer(&self) -> Result<(&User, &Insurer), MetricsError> {
        let user = self.active_user()?;
        let insurer = user
            .insurer
            .as_ref()
            .ok_or_else(|| MetricsError::NoInsurerSelected(user.id.clone()))?;
        Ok((user, insurer))
    }

    /// League entry describing the current user
    fn member_entry(&self) -> Result<LeagueMember, MetricsError> {
        let user = self.active_user()?;
        let bonus_progress = match &user.insurer {
            Some(insurer) => {
                let requirement = &insurer.bonus_program.requirement;
                let progress = metrics::calculate_bonus_progress(&self.records, requirement);
                progress.progress_percentage
            }
            None => 0.0,
        };

        Ok(LeagueMember {
            id: user.id.clone(),
            name: user.name.clone(),
            total_steps: period_overview(&self.records).total_steps,
            streak: metrics::calculate_streak(&self.records),
            bonus_progress,
        })
    }

    /// Join the league with `code` (case-insensitive). Joining a league the
    /// user is already in is a no-op.
    pub fn join_league(&mut self, code: &str) -> Result<&League, MetricsError> {
        let entry = self.member_entry()?;
        let wanted = normalize_code(code);

        let index = self
            .leagues
            .iter()
            .position(|league| league.code == wanted)
            .ok_or_else(|| MetricsError::UnknownLeague(code.trim().to_string()))?;

        let league = &mut self.leagues[index];
        if !league.members.iter().any(|member| member.id == entry.id) {
            info!(league = %league.name, user_id = %entry.id, "joined league");
            league.members.push(entry);
        }
        Ok(&self.leagues[index])
    }

    /// Create a league with the user as its first member; returns the join code
    pub fn create_league(&mut self, name: &str, today: NaiveDate) -> Result<String, MetricsError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MetricsError::InvalidLeagueName(
                "name must not be blank".to_string(),
            ));
        }
        let entry = self.member_entry()?;

        let mut code = generate_league_code();
        while self.leagues.iter().any(|league| league.code == code) {
            code = generate_league_code();
        }

        info!(league = %name, code = %code, "created league");
        self.leagues.push(League {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            code: code.clone(),
            members: vec![entry],
            created_at: today,
        });
        Ok(code)
    }

    /// Leaderboards of every league, from the current user's point of view
    pub fn standings(&self) -> Result<Vec<LeagueStandings>, MetricsError> {
        let user = self.active_user()?;
        Ok(self
            .leagues
            .iter()
            .map(|league| LeagueStandings::from_league(league, &user.id))
            .collect())
    }

    /// Dashboard figures for the current user
    pub fn dashboard(&self, today: NaiveDate) -> Result<DashboardSnapshot, MetricsError> {
        let (_, insurer) = self.active_insurer()?;
        Ok(DashboardSnapshot::compute(
            &self.records,
            &insurer.bonus_program,
            today,
        ))
    }

    /// Claim the insurer bonus.
    ///
    /// Requires eligibility over the program window. A program is claimed at
    /// most once per window: an earlier claim blocks a new one while it is
    /// younger than `period_days` or its window start lies inside the
    /// current window.
    pub fn claim_bonus(&mut self, today: NaiveDate) -> Result<BonusClaim, MetricsError> {
        let (_, insurer) = self.active_insurer()?;
        let program = &insurer.bonus_program;
        let requirement = &program.requirement;

        let progress = metrics::calculate_bonus_progress(&self.records, requirement);
        if !progress.is_eligible {
            return Err(MetricsError::NotEligible {
                days_achieved: progress.days_achieved,
                days_required: requirement.days_required,
            });
        }

        let period_start = metrics::last_n(&self.records, requirement.period_days as usize)
            .first()
            .map(|record| record.date)
            .unwrap_or(today);

        let period = Duration::days(i64::from(requirement.period_days));
        let earlier = self.claims.iter().find(|claim| {
            claim.insurer_id == insurer.id
                && claim.program == program.name
                && (claim.period_start >= period_start || claim.claimed_on + period > today)
        });
        if let Some(earlier) = earlier {
            return Err(MetricsError::AlreadyClaimed {
                program: program.name.clone(),
                period_start: earlier.period_start.to_string(),
            });
        }

        let claim = BonusClaim {
            claim_id: Uuid::new_v4(),
            insurer_id: insurer.id.clone(),
            program: program.name.clone(),
            reward: program.reward.clone(),
            period_start,
            claimed_on: today,
        };
        info!(
            insurer = %claim.insurer_id,
            program = %claim.program,
            reward = %claim.reward,
            "bonus claimed"
        );
        self.claims.push(claim.clone());
        Ok(claim)
    }

    /// Unlock achievements earned by the current records; returns the new ones
    pub fn refresh_achievements(&mut self, today: NaiveDate) -> Vec<Achievement> {
        let mut unlocked = Vec::new();

        let streak = metrics::calculate_streak(&self.records);
        let has_streak_badge = self
            .achievements
            .iter()
            .any(|achievement| achievement.id == STREAK_ACHIEVEMENT_ID);

        if streak >= STREAK_ACHIEVEMENT_DAYS && !has_streak_badge {
            unlocked.push(Achievement {
                id: STREAK_ACHIEVEMENT_ID.to_string(),
                title: "7-Day Streak".to_string(),
                description: "Reached your step goal 7 days in a row!".to_string(),
                emoji: "🔥".to_string(),
                unlocked_at: today,
            });
        }

        for achievement in &unlocked {
            info!(achievement = %achievement.title, "achievement unlocked");
        }
        self.achievements.extend(unlocked.iter().cloned());
        unlocked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::find_insurer;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn make_records(steps: &[u32]) -> Vec<DailyActivityRecord> {
        steps
            .iter()
            .enumerate()
            .map(|(i, &s)| DailyActivityRecord::new(start() + Duration::days(i as i64), s, 8000))
            .collect()
    }

    fn make_user() -> User {
        User {
            id: "user-1".to_string(),
            name: "Max Mustermann".to_string(),
            email: "max@example.com".to_string(),
            insurer: None,
            has_consented: false,
            is_onboarded: false,
            activity_connected: false,
            created_at: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        }
    }

    fn family_league() -> League {
        League {
            id: "league-2".to_string(),
            name: "Family Steps".to_string(),
            code: "FAM456".to_string(),
            members: vec![LeagueMember {
                id: "user-4".to_string(),
                name: "Lisa Mustermann".to_string(),
                total_steps: 267_891,
                streak: 14,
                bonus_progress: 95.0,
            }],
            created_at: NaiveDate::from_ymd_opt(2024, 5, 20).unwrap(),
        }
    }

    fn onboarded_session(steps: &[u32]) -> SessionContext {
        let mut session = SessionContext::new(Some(make_user()), make_records(steps));
        session.update_insurer(find_insurer("tk").unwrap());
        session.update_consent(true);
        session.connect_activity();
        session
    }

    #[test]
    fn test_onboarding_flags() {
        let mut session = SessionContext::new(Some(make_user()), Vec::new());
        assert!(!session.complete_onboarding());

        assert!(session.update_consent(true));
        assert!(session.update_insurer(find_insurer("aok").unwrap()));
        assert!(session.connect_activity());
        assert!(session.complete_onboarding());

        let user = session.user().unwrap();
        assert!(user.is_onboarded);
        assert_eq!(user.insurer.as_ref().unwrap().id, "aok");
    }

    #[test]
    fn test_updates_without_user_are_ignored() {
        let mut session = SessionContext::default();
        assert!(!session.update_consent(true));
        assert!(!session.connect_activity());
        assert!(!session.update_insurer(find_insurer("tk").unwrap()));
        assert!(session.user().is_none());
    }

    #[test]
    fn test_sign_out_clears_user() {
        let mut session = onboarded_session(&[9000]);
        session.sign_out();
        assert!(session.user().is_none());
        assert!(matches!(
            session.dashboard(start()),
            Err(MetricsError::NoActiveUser)
        ));
    }

    #[test]
    fn test_dashboard_requires_insurer() {
        let session = SessionContext::new(Some(make_user()), make_records(&[9000]));
        assert!(matches!(
            session.dashboard(start()),
            Err(MetricsError::NoInsurerSelected(_))
        ));
    }

    #[test]
    fn test_dashboard_uses_insurer_program() {
        let session = onboarded_session(&[9000, 9000, 9000]);
        let snapshot = session.dashboard(start() + Duration::days(2)).unwrap();

        assert_eq!(snapshot.today_steps, 9000);
        assert_eq!(snapshot.streak, 3);
        assert_eq!(snapshot.days_required, 20);
        assert_eq!(snapshot.days_remaining, 17);
        assert_eq!(snapshot.reward, "€50 bonus payment");
    }

    #[test]
    fn test_join_league_by_code() {
        let mut session = onboarded_session(&[9000, 9000]).with_leagues(vec![family_league()]);

        let league = session.join_league(" fam456 ").unwrap();
        assert_eq!(league.members.len(), 2);
        let me = &league.members[1];
        assert_eq!(me.id, "user-1");
        assert_eq!(me.total_steps, 18_000);
        assert_eq!(me.streak, 2);
        assert!((me.bonus_progress - 10.0).abs() < 1e-9);

        // Second join does not duplicate the member
        let league = session.join_league("FAM456").unwrap();
        assert_eq!(league.members.len(), 2);
    }

    #[test]
    fn test_join_unknown_league() {
        let mut session = onboarded_session(&[]).with_leagues(vec![family_league()]);
        assert!(matches!(
            session.join_league("NOPE00"),
            Err(MetricsError::UnknownLeague(_))
        ));
    }

    #[test]
    fn test_create_league() {
        let mut session = onboarded_session(&[9000]);
        let code = session
            .create_league("  Office Warriors ", start())
            .unwrap();

        assert_eq!(session.leagues().len(), 1);
        let league = &session.leagues()[0];
        assert_eq!(league.code, code);
        assert_eq!(league.name, "Office Warriors");
        assert_eq!(league.members[0].id, "user-1");

        let standings = session.standings().unwrap();
        assert_eq!(standings[0].user_rank, Some(1));
    }

    #[test]
    fn test_create_league_rejects_blank_name() {
        let mut session = onboarded_session(&[9000]);
        assert!(matches!(
            session.create_league("   ", start()),
            Err(MetricsError::InvalidLeagueName(_))
        ));
    }

    #[test]
    fn test_claim_bonus_requires_eligibility() {
        let mut session = onboarded_session(&[9000; 5]);
        let err = session.claim_bonus(start()).unwrap_err();
        assert!(matches!(
            err,
            MetricsError::NotEligible {
                days_achieved: 5,
                days_required: 20
            }
        ));
        assert!(session.claims().is_empty());
    }

    #[test]
    fn test_claim_bonus_once_per_window() {
        let mut steps = vec![1000; 10];
        steps.extend(vec![8500; 20]);
        let mut session = onboarded_session(&steps);
        let today = start() + Duration::days(29);

        let claim = session.claim_bonus(today).unwrap();
        assert_eq!(claim.insurer_id, "tk");
        assert_eq!(claim.period_start, start());
        assert_eq!(claim.claimed_on, today);

        assert!(matches!(
            session.claim_bonus(today),
            Err(MetricsError::AlreadyClaimed { .. })
        ));
        assert_eq!(session.claims().len(), 1);
    }

    #[test]
    fn test_claim_bonus_rejects_overlapping_window() {
        let mut session = onboarded_session(&[8500; 30]);
        let first = session.claim_bonus(start() + Duration::days(29)).unwrap();
        assert_eq!(first.period_start, start());

        // One more synced day shifts the window start but the window overlaps
        session.replace_records(make_records(&[8500; 31]));
        let err = session
            .claim_bonus(start() + Duration::days(30))
            .unwrap_err();
        assert!(matches!(err, MetricsError::AlreadyClaimed { .. }));
        assert_eq!(session.claims().len(), 1);

        // A fully new window can be claimed again
        session.replace_records(make_records(&[8500; 60]));
        let second = session.claim_bonus(start() + Duration::days(59)).unwrap();
        assert_eq!(second.period_start, start() + Duration::days(30));
        assert_eq!(session.claims().len(), 2);
    }

    #[test]
    fn test_streak_achievement_unlocks_once() {
        let mut session = onboarded_session(&[9000; 8]);

        let unlocked = session.refresh_achievements(start());
        assert_eq!(unlocked.len(), 1);
        assert_eq!(unlocked[0].title, "7-Day Streak");

        assert!(session.refresh_achievements(start()).is_empty());
        assert_eq!(session.achievements().len(), 1);
    }

    #[test]
    fn test_short_streak_unlocks_nothing() {
        let mut session = onboarded_session(&[9000; 6]);
        assert!(session.refresh_achievements(start()).is_empty());
    }
}

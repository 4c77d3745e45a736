//! Activity metric derivation
//!
//! Pure reductions over an oldest-first sequence of daily records:
//! - Today's step count
//! - Trailing seven-day total
//! - Consecutive-day goal streak
//! - Bonus program qualification progress
//!
//! The functions only borrow their input and never fail.

use crate::types::{BonusProgramRequirement, BonusProgress, DailyActivityRecord};
use chrono::{NaiveDate, Utc};

/// Number of trailing records that make up a week
pub const WEEK_DAYS: usize = 7;

/// Calendar date used for "today" lookups (UTC)
pub fn current_date() -> NaiveDate {
    Utc::now().date_naive()
}

/// Trailing `n` records of the sequence (all of them if shorter)
pub(crate) fn last_n(records: &[DailyActivityRecord], n: usize) -> &[DailyActivityRecord] {
    &records[records.len().saturating_sub(n)..]
}

/// Steps recorded for today, or 0 when no record carries today's date
pub fn today_steps(records: &[DailyActivityRecord]) -> u32 {
    steps_on(records, current_date())
}

/// Steps recorded on `date`; first match wins if the date repeats
pub fn steps_on(records: &[DailyActivityRecord], date: NaiveDate) -> u32 {
    records
        .iter()
        .find(|record| record.date == date)
        .map(|record| record.steps)
        .unwrap_or(0)
}

/// Sum of steps over the last seven records
pub fn weekly_total(records: &[DailyActivityRecord]) -> u64 {
    last_n(records, WEEK_DAYS)
        .iter()
        .map(|record| u64::from(record.steps))
        .sum()
}

/// Count of consecutive most-recent days that met their own target
pub fn calculate_streak(records: &[DailyActivityRecord]) -> u32 {
    records
        .iter()
        .rev()
        .take_while(|record| record.goal_met())
        .count() as u32
}

/// Bonus qualification over the last `period_days` records.
///
/// A requirement with `days_required == 0` is satisfied by construction and
/// reports full progress.
pub fn calculate_bonus_progress(
    records: &[DailyActivityRecord],
    requirement: &BonusProgramRequirement,
) -> BonusProgress {
    let window = last_n(records, requirement.period_days as usize);
    let days_achieved = window
        .iter()
        .filter(|record| record.steps >= requirement.steps_per_day)
        .count() as u32;

    if requirement.days_required == 0 {
        return BonusProgress {
            days_achieved,
            progress_percentage: 100.0,
            is_eligible: true,
        };
    }

    let ratio = f64::from(days_achieved) / f64::from(requirement.days_required);

    BonusProgress {
        days_achieved,
        progress_percentage: (ratio * 100.0).min(100.0),
        is_eligible: days_achieved >= requirement.days_required,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn make_records(steps: &[u32], target: u32) -> Vec<DailyActivityRecord> {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        steps
            .iter()
            .enumerate()
            .map(|(i, &s)| DailyActivityRecord::new(start + Duration::days(i as i64), s, target))
            .collect()
    }

    fn tk_requirement() -> BonusProgramRequirement {
        BonusProgramRequirement {
            steps_per_day: 8000,
            days_required: 20,
            period_days: 30,
        }
    }

    #[test]
    fn test_empty_sequence() {
        let records: Vec<DailyActivityRecord> = Vec::new();

        assert_eq!(today_steps(&records), 0);
        assert_eq!(weekly_total(&records), 0);
        assert_eq!(calculate_streak(&records), 0);

        let progress = calculate_bonus_progress(&records, &tk_requirement());
        assert_eq!(progress.days_achieved, 0);
        assert_eq!(progress.progress_percentage, 0.0);
        assert!(!progress.is_eligible);
    }

    #[test]
    fn test_week_with_gap() {
        let records = make_records(&[8000, 8000, 8000, 5000, 8000, 8000, 8000], 8000);

        assert_eq!(calculate_streak(&records), 3);
        assert_eq!(weekly_total(&records), 53_000);
    }

    #[test]
    fn test_weekly_total_only_counts_last_seven() {
        let records = make_records(&[100_000, 1, 2, 3, 4, 5, 6, 7], 8000);
        assert_eq!(weekly_total(&records), 28);

        let short = make_records(&[1000, 2000, 3000], 8000);
        assert_eq!(weekly_total(&short), 6000);
    }

    #[test]
    fn test_weekly_total_does_not_overflow() {
        let records = make_records(&[u32::MAX; 7], 1);
        assert_eq!(weekly_total(&records), 7 * u64::from(u32::MAX));
    }

    #[test]
    fn test_streak_zero_when_last_day_misses() {
        let records = make_records(&[9000, 9000, 9000, 7999], 8000);
        assert_eq!(calculate_streak(&records), 0);
    }

    #[test]
    fn test_streak_counts_exact_tail() {
        for k in 0..6 {
            let mut steps = vec![9000; 3];
            steps.push(100);
            steps.extend(std::iter::repeat(9000).take(k));
            let records = make_records(&steps, 8000);
            assert_eq!(calculate_streak(&records), k as u32);
        }
    }

    #[test]
    fn test_streak_uses_per_day_target() {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let records = vec![
            DailyActivityRecord::new(start, 4000, 10_000),
            DailyActivityRecord::new(start + Duration::days(1), 6000, 5000),
            DailyActivityRecord::new(start + Duration::days(2), 3000, 3000),
        ];
        assert_eq!(calculate_streak(&records), 2);
    }

    #[test]
    fn test_streak_full_sequence() {
        let records = make_records(&[8000; 12], 8000);
        assert_eq!(calculate_streak(&records), 12);
    }

    #[test]
    fn test_steps_on_date() {
        let records = make_records(&[1000, 2000, 3000], 8000);
        let second = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        let missing = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();

        assert_eq!(steps_on(&records, second), 2000);
        assert_eq!(steps_on(&records, missing), 0);
    }

    #[test]
    fn test_steps_on_first_match_wins() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let records = vec![
            DailyActivityRecord::new(date, 1111, 8000),
            DailyActivityRecord::new(date, 2222, 8000),
        ];
        assert_eq!(steps_on(&records, date), 1111);
    }

    #[test]
    fn test_today_steps_uses_clock() {
        let today = current_date();
        let records = vec![
            DailyActivityRecord::new(today - Duration::days(1), 4200, 8000),
            DailyActivityRecord::new(today, 6543, 8000),
        ];
        assert_eq!(today_steps(&records), 6543);
    }

    #[test]
    fn test_bonus_exactly_met() {
        let mut steps = vec![8000; 20];
        steps.extend(vec![7999; 10]);
        let records = make_records(&steps, 8000);

        let progress = calculate_bonus_progress(&records, &tk_requirement());
        assert_eq!(progress.days_achieved, 20);
        assert_eq!(progress.progress_percentage, 100.0);
        assert!(progress.is_eligible);
    }

    #[test]
    fn test_bonus_window_ignores_older_records() {
        // 10 qualifying days fall outside the 30-day window
        let mut steps = vec![12_000; 10];
        steps.extend(vec![8500; 10]);
        steps.extend(vec![2000; 20]);
        let records = make_records(&steps, 8000);

        let progress = calculate_bonus_progress(&records, &tk_requirement());
        assert_eq!(progress.days_achieved, 10);
        assert!((progress.progress_percentage - 50.0).abs() < 1e-9);
        assert!(!progress.is_eligible);
    }

    #[test]
    fn test_bonus_progress_is_capped() {
        let records = make_records(&[9000; 30], 8000);

        let progress = calculate_bonus_progress(&records, &tk_requirement());
        assert_eq!(progress.days_achieved, 30);
        assert_eq!(progress.progress_percentage, 100.0);
        assert!(progress.is_eligible);
    }

    #[test]
    fn test_bonus_progress_not_rounded() {
        let records = make_records(&[9000, 9000, 1000], 8000);
        let requirement = BonusProgramRequirement {
            steps_per_day: 8000,
            days_required: 3,
            period_days: 30,
        };

        let progress = calculate_bonus_progress(&records, &requirement);
        assert!((progress.progress_percentage - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_bonus_zero_days_required() {
        let records = make_records(&[100], 8000);
        let requirement = BonusProgramRequirement {
            steps_per_day: 8000,
            days_required: 0,
            period_days: 30,
        };

        let progress = calculate_bonus_progress(&records, &requirement);
        assert_eq!(progress.days_achieved, 0);
        assert_eq!(progress.progress_percentage, 100.0);
        assert!(progress.is_eligible);
    }

    #[test]
    fn test_bonus_bounds_hold_across_inputs() {
        let records = make_records(&[3000, 9000, 12_000, 7000, 8000, 500, 8001], 8000);

        for days_required in 1..=8 {
            for period_days in days_required..=10 {
                let requirement = BonusProgramRequirement {
                    steps_per_day: 8000,
                    days_required,
                    period_days,
                };
                let progress = calculate_bonus_progress(&records, &requirement);
                assert!(progress.progress_percentage >= 0.0);
                assert!(progress.progress_percentage <= 100.0);
                assert_eq!(
                    progress.is_eligible,
                    progress.days_achieved >= requirement.days_required
                );
            }
        }
    }
}

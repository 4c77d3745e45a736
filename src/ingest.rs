//! Record ingestion
//!
//! Parses activity records coming from a device sync or export and checks the
//! sequence invariants the metrics rely on. The metrics themselves never
//! validate; callers that accept external data should run
//! [`validate_records`] first.

use crate::error::MetricsError;
use crate::types::{BonusProgramRequirement, DailyActivityRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Parse a JSON array of records
pub fn parse_array(json: &str) -> Result<Vec<DailyActivityRecord>, MetricsError> {
    let records: Vec<DailyActivityRecord> = serde_json::from_str(json)?;
    debug!(
        count = records.len(),
        "parsed activity records from JSON array"
    );
    Ok(records)
}

/// Parse NDJSON (one record per line, blank lines skipped)
pub fn parse_ndjson(ndjson: &str) -> Result<Vec<DailyActivityRecord>, MetricsError> {
    let mut records = Vec::new();
    for (line_num, line) in ndjson.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<DailyActivityRecord>(trimmed) {
            Ok(record) => records.push(record),
            Err(e) => {
                return Err(MetricsError::ParseError(format!(
                    "Failed to parse line {}: {}",
                    line_num + 1,
                    e
                )));
            }
        }
    }
    debug!(count = records.len(), "parsed activity records from NDJSON");
    Ok(records)
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(value: &str) -> Result<NaiveDate, MetricsError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| MetricsError::DateParseError(format!("{value}: {e}")))
}

/// Kind of sequence violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Date is earlier than a date already seen
    OutOfOrder,
    /// Date already appeared earlier in the sequence
    DuplicateDate,
    /// Target is zero
    ZeroTarget,
}

/// One problem found in a record sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordIssue {
    /// Position in the sequence (0-based)
    pub index: usize,
    pub date: NaiveDate,
    pub kind: IssueKind,
}

impl std::fmt::Display for RecordIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let what = match self.kind {
            IssueKind::OutOfOrder => "date is earlier than a previous record",
            IssueKind::DuplicateDate => "date repeats an earlier record",
            IssueKind::ZeroTarget => "target must be positive",
        };
        write!(f, "record {} ({}): {}", self.index, self.date, what)
    }
}

/// Check ordering, uniqueness and targets; returns every issue found
pub fn validate_records(records: &[DailyActivityRecord]) -> Vec<RecordIssue> {
    let mut issues = Vec::new();
    let mut seen: HashSet<NaiveDate> = HashSet::with_capacity(records.len());
    let mut latest: Option<NaiveDate> = None;

    for (index, record) in records.iter().enumerate() {
        if record.target == 0 {
            issues.push(RecordIssue {
                index,
                date: record.date,
                kind: IssueKind::ZeroTarget,
            });
        }

        let kind = if !seen.insert(record.date) {
            Some(IssueKind::DuplicateDate)
        } else if latest.is_some_and(|latest| record.date < latest) {
            Some(IssueKind::OutOfOrder)
        } else {
            None
        };
        if let Some(kind) = kind {
            issues.push(RecordIssue {
                index,
                date: record.date,
                kind,
            });
        }

        latest = latest.max(Some(record.date));
    }

    if !issues.is_empty() {
        warn!(issues = issues.len(), "activity records failed validation");
    }
    issues
}

/// Fail with [`MetricsError::InvalidRecords`] if any issue is present
pub fn ensure_valid(records: &[DailyActivityRecord]) -> Result<(), MetricsError> {
    let issues = validate_records(records);
    if issues.is_empty() {
        Ok(())
    } else {
        Err(MetricsError::InvalidRecords(issues.len()))
    }
}

/// Check that a requirement is usable: all fields positive and
/// `days_required <= period_days`
pub fn validate_requirement(requirement: &BonusProgramRequirement) -> Result<(), MetricsError> {
    if requirement.steps_per_day == 0 {
        return Err(MetricsError::InvalidRequirement(
            "stepsPerDay must be positive".to_string(),
        ));
    }
    if requirement.days_required == 0 {
        return Err(MetricsError::InvalidRequirement(
            "daysRequired must be positive".to_string(),
        ));
    }
    if requirement.period_days == 0 {
        return Err(MetricsError::InvalidRequirement(
            "periodDays must be positive".to_string(),
        ));
    }
    if requirement.days_required > requirement.period_days {
        return Err(MetricsError::InvalidRequirement(format!(
            "daysRequired ({}) exceeds periodDays ({})",
            requirement.days_required, requirement.period_days
        )));
    }
    Ok(())
}

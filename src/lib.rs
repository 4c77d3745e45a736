//! Bewegungsliga - Activity metrics engine for step leagues and insurer bonus programs
//!
//! Derives the figures a fitness rewards client shows from an oldest-first
//! sequence of daily step records: today's steps, the weekly total, the goal
//! streak, and progress towards an insurer's bonus program.
//!
//! ## Modules
//!
//! - **Metrics**: The pure streak, weekly and bonus-progress reductions
//! - **Summary**: Weekly breakdowns, period overviews and the dashboard snapshot
//! - **Session**: Explicit per-session context for users, leagues and claims

pub mod catalog;
pub mod error;
pub mod ingest;
pub mod league;
pub mod metrics;
pub mod session;
pub mod summary;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use error::MetricsError;
pub use metrics::{
    calculate_bonus_progress, calculate_streak, steps_on, today_steps, weekly_total,
};
pub use session::SessionContext;
pub use summary::{DashboardSnapshot, StreakTier, WeeklySummary};
pub use types::{BonusProgramRequirement, BonusProgress, DailyActivityRecord};

/// Library version
pub const LIGA_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "bewegungsliga";

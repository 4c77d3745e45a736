//! Liga CLI - Command-line interface for Bewegungsliga
//!
//! Commands:
//! - dashboard: Compute the dashboard snapshot for an insurer program
//! - bonus: Compute bonus progress for an explicit requirement
//! - week: Weekly breakdown and whole-period overview
//! - validate: Check record ordering, duplicates and targets
//! - insurers: List the built-in insurer catalog
//! - doctor: Diagnose installation and input readiness

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use bewegungsliga::catalog;
use bewegungsliga::ingest::{self, parse_date, RecordIssue};
use bewegungsliga::metrics;
use bewegungsliga::summary::{
    self, days_remaining, DashboardSnapshot, PeriodOverview, WeeklySummary,
};
use bewegungsliga::types::{BonusProgram, BonusProgramRequirement, DailyActivityRecord};
use bewegungsliga::{MetricsError, LIGA_VERSION, PRODUCER_NAME};

/// Environment variable holding the log filter
const LOG_ENV: &str = "LIGA_LOG";

/// Liga - Activity metrics for step leagues and insurer bonus programs
#[derive(Parser)]
#[command(name = "liga")]
#[command(author = "Bewegungsliga Team")]
#[command(version = LIGA_VERSION)]
#[command(about = "Derive streaks, weekly totals and bonus progress from step records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the dashboard snapshot for an insurer program
    Dashboard {
        #[command(flatten)]
        input: InputArgs,

        /// Insurer whose bonus program applies
        #[arg(long, default_value = "tk")]
        insurer: String,

        #[command(flatten)]
        overrides: RequirementOverrides,

        /// Date treated as today (YYYY-MM-DD, defaults to the current UTC date)
        #[arg(long)]
        today: Option<String>,

        /// Output format
        #[arg(long, default_value = "text")]
        output_format: OutputFormat,
    },

    /// Compute bonus progress for an explicit requirement
    Bonus {
        #[command(flatten)]
        input: InputArgs,

        /// Minimum steps for a day to qualify
        #[arg(long)]
        steps_per_day: u32,

        /// Qualifying days needed
        #[arg(long)]
        days_required: u32,

        /// Window size in days
        #[arg(long, default_value = "30")]
        period_days: u32,

        /// Output format
        #[arg(long, default_value = "text")]
        output_format: OutputFormat,
    },

    /// Weekly breakdown and whole-period overview
    Week {
        #[command(flatten)]
        input: InputArgs,

        /// Output format
        #[arg(long, default_value = "text")]
        output_format: OutputFormat,
    },

    /// Check record ordering, duplicates and targets
    Validate {
        #[command(flatten)]
        input: InputArgs,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the built-in insurer catalog
    Insurers {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose installation and input readiness
    Doctor {
        /// Check a records file
        #[arg(long)]
        records: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Input file path (use - for stdin)
    #[arg(short, long)]
    input: PathBuf,

    /// Input format
    #[arg(long, default_value = "json")]
    input_format: InputFormat,

    /// Skip sequence validation before computing
    #[arg(long)]
    no_validate: bool,
}

#[derive(Args)]
struct RequirementOverrides {
    /// Override the program's steps-per-day threshold
    #[arg(long)]
    steps_per_day: Option<u32>,

    /// Override the program's required day count
    #[arg(long)]
    days_required: Option<u32>,

    /// Override the program's window size
    #[arg(long)]
    period_days: Option<u32>,
}

impl RequirementOverrides {
    fn apply(&self, requirement: &mut BonusProgramRequirement) {
        if let Some(steps) = self.steps_per_day {
            requirement.steps_per_day = steps;
        }
        if let Some(days) = self.days_required {
            requirement.days_required = days;
        }
        if let Some(period) = self.period_days {
            requirement.period_days = period;
        }
    }
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// JSON array of records
    Json,
    /// Newline-delimited JSON (one record per line)
    Ndjson,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable summary
    Text,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), LigaCliError> {
    match cli.command {
        Commands::Dashboard {
            input,
            insurer,
            overrides,
            today,
            output_format,
        } => cmd_dashboard(
            &input,
            &insurer,
            &overrides,
            today.as_deref(),
            output_format,
        ),

        Commands::Bonus {
            input,
            steps_per_day,
            days_required,
            period_days,
            output_format,
        } => {
            let requirement = BonusProgramRequirement {
                steps_per_day,
                days_required,
                period_days,
            };
            cmd_bonus(&input, &requirement, output_format)
        }

        Commands::Week {
            input,
            output_format,
        } => cmd_week(&input, output_format),

        Commands::Validate { input, json } => cmd_validate(&input, json),

        Commands::Insurers { json } => cmd_insurers(json),

        Commands::Doctor { records, json } => cmd_doctor(records.as_deref(), json),
    }
}

fn read_input(path: &Path) -> Result<String, LigaCliError> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn parse_records(
    data: &str,
    format: &InputFormat,
) -> Result<Vec<DailyActivityRecord>, LigaCliError> {
    let records = match format {
        InputFormat::Json => ingest::parse_array(data)?,
        InputFormat::Ndjson => ingest::parse_ndjson(data)?,
    };
    Ok(records)
}

/// Read, parse and (unless disabled) validate the input records
fn load_records(args: &InputArgs) -> Result<Vec<DailyActivityRecord>, LigaCliError> {
    let data = read_input(&args.input)?;
    let records = parse_records(&data, &args.input_format)?;
    debug!(count = records.len(), path = %args.input.display(), "loaded records");

    if !args.no_validate {
        ingest::ensure_valid(&records)?;
    }
    Ok(records)
}

fn cmd_dashboard(
    input: &InputArgs,
    insurer_id: &str,
    overrides: &RequirementOverrides,
    today: Option<&str>,
    output_format: OutputFormat,
) -> Result<(), LigaCliError> {
    let records = load_records(input)?;
    let insurer = catalog::find_insurer(insurer_id)?;

    let mut program: BonusProgram = insurer.bonus_program;
    overrides.apply(&mut program.requirement);
    ingest::validate_requirement(&program.requirement)?;

    let today = match today {
        Some(value) => parse_date(value)?,
        None => metrics::current_date(),
    };

    let snapshot = DashboardSnapshot::compute(&records, &program, today);

    match output_format {
        OutputFormat::Text => print_dashboard(&snapshot, &insurer.name, &program),
        _ => println!("{}", format_json(&snapshot, &output_format)?),
    }
    Ok(())
}

fn print_dashboard(snapshot: &DashboardSnapshot, insurer_name: &str, program: &BonusProgram) {
    println!("Dashboard ({})", snapshot.date);
    println!("=======================");
    println!(
        "Today:        {} / {} steps ({:.0}%)",
        snapshot.today_steps, snapshot.today_target, snapshot.today_progress_percentage
    );
    println!("This week:    {} steps", snapshot.weekly_total);
    println!(
        "Streak:       {} {} days - {}",
        snapshot.streak_tier.emoji(),
        snapshot.streak,
        snapshot.streak_tier.message()
    );
    println!("\n{} - {}", insurer_name, program.name);
    println!(
        "Bonus:        {} / {} days ({:.0}%)",
        snapshot.bonus.days_achieved, snapshot.days_required, snapshot.bonus.progress_percentage
    );
    if snapshot.bonus.is_eligible {
        println!("Eligible:     yes, claim your {}", snapshot.reward);
    } else {
        println!(
            "Eligible:     no, {} more days to qualify",
            snapshot.days_remaining
        );
    }
}

fn cmd_bonus(
    input: &InputArgs,
    requirement: &BonusProgramRequirement,
    output_format: OutputFormat,
) -> Result<(), LigaCliError> {
    ingest::validate_requirement(requirement)?;
    let records = load_records(input)?;
    let progress = metrics::calculate_bonus_progress(&records, requirement);

    match output_format {
        OutputFormat::Text => {
            println!(
                "Bonus progress: {} / {} days ({:.1}%)",
                progress.days_achieved, requirement.days_required, progress.progress_percentage
            );
            println!("Eligible:       {}", progress.is_eligible);
            if !progress.is_eligible {
                println!(
                    "Remaining:      {} days",
                    days_remaining(&progress, requirement)
                );
            }
        }
        _ => println!("{}", format_json(&progress, &output_format)?),
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WeekReport {
    week: WeeklySummary,
    overview: PeriodOverview,
    streak: u32,
}

fn cmd_week(input: &InputArgs, output_format: OutputFormat) -> Result<(), LigaCliError> {
    let records = load_records(input)?;
    let report = WeekReport {
        week: summary::weekly_summary(&records),
        overview: summary::period_overview(&records),
        streak: metrics::calculate_streak(&records),
    };

    match output_format {
        OutputFormat::Text => {
            println!("Last {} Days", report.week.days.len());
            println!("============");
            for day in &report.week.days {
                let mark = if day.goal_met { "[x]" } else { "[ ]" };
                println!(
                    "  {} {}  {:>6} steps  {:>3.0}%",
                    mark, day.date, day.steps, day.progress_percentage
                );
            }
            println!("\nDaily average: {}", report.week.average_steps);
            println!(
                "Goals met:     {}/{}",
                report.week.days_with_goal,
                report.week.days.len()
            );
            println!("Week total:    {}", report.week.total_steps);
            println!(
                "\nAll records:   {} steps over {} days, {} goals achieved",
                report.overview.total_steps, report.overview.days, report.overview.goals_achieved
            );
            println!("Streak:        {}", report.streak);
        }
        _ => println!("{}", format_json(&report, &output_format)?),
    }
    Ok(())
}

fn cmd_validate(input: &InputArgs, json: bool) -> Result<(), LigaCliError> {
    let data = read_input(&input.input)?;
    let records = parse_records(&data, &input.input_format)?;
    let issues = ingest::validate_records(&records);

    let report = ValidationReport {
        total_records: records.len(),
        issues: issues.len(),
        details: issues.iter().map(RecordIssue::to_string).collect(),
        raw: issues,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total records: {}", report.total_records);
        println!("Issues:        {}", report.issues);

        if !report.details.is_empty() {
            println!("\nIssues:");
            for detail in &report.details {
                println!("  - {}", detail);
            }
        }
    }

    if report.issues > 0 {
        Err(LigaCliError::ValidationFailed(report.issues))
    } else {
        Ok(())
    }
}

fn cmd_insurers(json: bool) -> Result<(), LigaCliError> {
    let insurers = catalog::insurers();

    if json {
        println!("{}", serde_json::to_string_pretty(&insurers)?);
    } else {
        println!("Insurers");
        println!("========");
        for insurer in &insurers {
            let requirement = &insurer.bonus_program.requirement;
            println!(
                "  {} {:<5} {} ({}): {} steps on {} of {} days, {}",
                insurer.logo,
                insurer.id,
                insurer.name,
                insurer.bonus_program.name,
                requirement.steps_per_day,
                requirement.days_required,
                requirement.period_days,
                insurer.bonus_program.reward
            );
        }
    }
    Ok(())
}

fn cmd_doctor(records: Option<&Path>, json: bool) -> Result<(), LigaCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "liga_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Liga version {}", LIGA_VERSION),
    });

    let invalid_programs: Vec<String> = catalog::insurers()
        .into_iter()
        .filter(|insurer| ingest::validate_requirement(&insurer.bonus_program.requirement).is_err())
        .map(|insurer| insurer.id)
        .collect();
    checks.push(if invalid_programs.is_empty() {
        DoctorCheck {
            name: "catalog".to_string(),
            status: CheckStatus::Ok,
            message: format!("{} insurer programs valid", catalog::insurers().len()),
        }
    } else {
        DoctorCheck {
            name: "catalog".to_string(),
            status: CheckStatus::Error,
            message: format!("Invalid programs: {}", invalid_programs.join(", ")),
        }
    });

    if let Some(path) = records {
        let check = if !path.exists() {
            DoctorCheck {
                name: "records".to_string(),
                status: CheckStatus::Warning,
                message: "Records file does not exist".to_string(),
            }
        } else {
            match fs::read_to_string(path)
                .map_err(LigaCliError::from)
                .and_then(|content| parse_records(&content, &InputFormat::Json))
            {
                Ok(parsed) => {
                    let issues = ingest::validate_records(&parsed);
                    if issues.is_empty() {
                        DoctorCheck {
                            name: "records".to_string(),
                            status: CheckStatus::Ok,
                            message: format!("Records file valid ({} days of data)", parsed.len()),
                        }
                    } else {
                        DoctorCheck {
                            name: "records".to_string(),
                            status: CheckStatus::Warning,
                            message: format!("Records file has {} issue(s)", issues.len()),
                        }
                    }
                }
                Err(e) => DoctorCheck {
                    name: "records".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Cannot load records: {}", CliError::from(e).message),
                },
            }
        };
        checks.push(check);
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (ready for --input -)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: LIGA_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Liga Doctor Report");
        println!("==================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(LigaCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn format_json<T: Serialize>(value: &T, format: &OutputFormat) -> Result<String, LigaCliError> {
    match format {
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Json | OutputFormat::Text => Ok(serde_json::to_string(value)?),
    }
}

// Error types

#[derive(Debug)]
enum LigaCliError {
    Io(io::Error),
    Metrics(MetricsError),
    Json(serde_json::Error),
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for LigaCliError {
    fn from(e: io::Error) -> Self {
        LigaCliError::Io(e)
    }
}

impl From<MetricsError> for LigaCliError {
    fn from(e: MetricsError) -> Self {
        LigaCliError::Metrics(e)
    }
}

impl From<serde_json::Error> for LigaCliError {
    fn from(e: serde_json::Error) -> Self {
        LigaCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<LigaCliError> for CliError {
    fn from(e: LigaCliError) -> Self {
        match e {
            LigaCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            LigaCliError::Metrics(e) => {
                let hint = match &e {
                    MetricsError::InvalidRecords(_) => {
                        Some("Run 'liga validate' for details".to_string())
                    }
                    MetricsError::UnknownInsurer(_) => {
                        Some("Run 'liga insurers' to list known ids".to_string())
                    }
                    MetricsError::InvalidRequirement(_) => {
                        Some("daysRequired must not exceed periodDays".to_string())
                    }
                    MetricsError::DateParseError(_) => {
                        Some("Dates use the YYYY-MM-DD format".to_string())
                    }
                    _ => Some("Ensure records are {date, steps, target} objects".to_string()),
                };
                CliError {
                    code: "METRICS_ERROR".to_string(),
                    message: e.to_string(),
                    hint,
                }
            }
            LigaCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            LigaCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} record issue(s) found", count),
                hint: Some("Fix ordering, duplicate dates or zero targets and retry".to_string()),
            },
            LigaCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(Serialize)]
struct ValidationReport {
    total_records: usize,
    issues: usize,
    details: Vec<String>,
    raw: Vec<RecordIssue>,
}

#[derive(Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

// src/config.rs
use clap::Parser;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::{path::PathBuf, str::FromStr};
use thiserror::Error;

use crate::reconciliation::DEFAULT_WEEKLY_OVERTIME_THRESHOLD;
use crate::timecard::{parse_weekday, WeekEnding};

pub const DEFAULT_OUTPUT_FILE: &str = "timecard_report.csv";
pub const DEFAULT_LOG_LEVEL: &str = "info";
const ENV_PREFIX: &str = "OVERTIME_";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment configuration error: {0}")]
    Env(#[from] envy::Error),
    #[error("No timecard input given (pass a path or set OVERTIME_INPUT)")]
    MissingInput,
    #[error("Unknown week-ending weekday: '{0}'")]
    InvalidWeekday(String),
    #[error("Weekly overtime threshold must be a non-negative number, got '{0}'")]
    InvalidThreshold(String),
    #[error("Delimiter must be a single ASCII character, got '{0}'")]
    InvalidDelimiter(String),
}

/// Weekly overtime report from a timecard export
#[derive(Parser, Debug, Default)]
#[command(name = "overtime-report")]
#[command(about = "Builds a per-employee weekly overtime report from timecard punches", long_about = None)]
pub struct Cli {
    /// Timecard export to read (Date, EmpID, Hours, Pay Code, Location, Regular Hours)
    pub input: Option<PathBuf>,

    /// Where to write the report (default: timecard_report.csv)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Weekday the billing week ends on (default: Saturday)
    #[arg(long)]
    pub week_ends_on: Option<String>,

    /// Weekly hours above which paid overtime is reconciled (default: 40)
    #[arg(long)]
    pub threshold: Option<String>,

    /// Field delimiter for input and output (default: ',')
    #[arg(short, long)]
    pub delimiter: Option<String>,

    /// Do not open the report after writing it
    #[arg(long)]
    pub no_open: bool,

    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Settings read from `OVERTIME_*` environment variables (and `.env`).
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct EnvConfig {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub week_ends_on: Option<String>,
    pub weekly_threshold: Option<String>,
    pub open_report: Option<bool>,
    pub delimiter: Option<String>,
    pub log_level: Option<String>,
}

impl EnvConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenv::dotenv().ok();
        Ok(envy::prefixed(ENV_PREFIX).from_env::<EnvConfig>()?)
    }
}

/// Fully resolved run settings. Command line values win over the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub week_ending: WeekEnding,
    pub weekly_threshold: Decimal,
    pub delimiter: u8,
    pub open_report: bool,
    pub log_level: String,
}

impl ReportConfig {
    pub fn resolve(cli: Cli, env: EnvConfig) -> Result<Self, ConfigError> {
        let input = cli.input.or(env.input).ok_or(ConfigError::MissingInput)?;
        let output = cli
            .output
            .or(env.output)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE));

        let week_ending = match cli.week_ends_on.or(env.week_ends_on) {
            Some(raw) => WeekEnding(parse_weekday(&raw).ok_or(ConfigError::InvalidWeekday(raw))?),
            None => WeekEnding::default(),
        };

        let weekly_threshold = match cli.threshold.or(env.weekly_threshold) {
            Some(raw) => parse_threshold(&raw)?,
            None => DEFAULT_WEEKLY_OVERTIME_THRESHOLD,
        };

        let delimiter = match cli.delimiter.or(env.delimiter) {
            Some(raw) => parse_delimiter(&raw)?,
            None => b',',
        };

        let open_report = !cli.no_open && env.open_report.unwrap_or(true);

        let log_level = match cli.verbose {
            0 => env.log_level.unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        };

        Ok(Self {
            input,
            output,
            week_ending,
            weekly_threshold,
            delimiter,
            open_report,
            log_level,
        })
    }
}

fn parse_threshold(raw: &str) -> Result<Decimal, ConfigError> {
    match Decimal::from_str(raw.trim()) {
        Ok(value) if value >= Decimal::ZERO => Ok(value),
        _ => Err(ConfigError::InvalidThreshold(raw.to_string())),
    }
}

fn parse_delimiter(raw: &str) -> Result<u8, ConfigError> {
    if raw == "\\t" || raw == "tab" {
        return Ok(b'\t');
    }
    match raw.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(ConfigError::InvalidDelimiter(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use rust_decimal_macros::dec;

    fn cli_with_input(path: &str) -> Cli {
        Cli {
            input: Some(PathBuf::from(path)),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = ReportConfig::resolve(cli_with_input("punches.csv"), EnvConfig::default()).unwrap();
        assert_eq!(config.input, PathBuf::from("punches.csv"));
        assert_eq!(config.output, PathBuf::from(DEFAULT_OUTPUT_FILE));
        assert_eq!(config.week_ending, WeekEnding(Weekday::Sat));
        assert_eq!(config.weekly_threshold, dec!(40));
        assert_eq!(config.delimiter, b',');
        assert!(config.open_report);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let result = ReportConfig::resolve(Cli::default(), EnvConfig::default());
        assert!(matches!(result, Err(ConfigError::MissingInput)));
    }

    #[test]
    fn test_env_values_used_when_cli_is_silent() {
        let env = EnvConfig {
            input: Some(PathBuf::from("env.csv")),
            output: Some(PathBuf::from("env_report.csv")),
            week_ends_on: Some("Friday".to_string()),
            weekly_threshold: Some("37.5".to_string()),
            open_report: Some(false),
            delimiter: Some(";".to_string()),
            log_level: Some("warn".to_string()),
        };
        let config = ReportConfig::resolve(Cli::default(), env).unwrap();
        assert_eq!(config.input, PathBuf::from("env.csv"));
        assert_eq!(config.output, PathBuf::from("env_report.csv"));
        assert_eq!(config.week_ending, WeekEnding(Weekday::Fri));
        assert_eq!(config.weekly_threshold, dec!(37.5));
        assert_eq!(config.delimiter, b';');
        assert!(!config.open_report);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_cli_overrides_env() {
        let cli = Cli::try_parse_from([
            "overtime-report",
            "cli.csv",
            "--output",
            "out.csv",
            "--week-ends-on",
            "sun",
            "--threshold",
            "44",
            "--no-open",
            "-vv",
        ])
        .unwrap();
        let env = EnvConfig {
            input: Some(PathBuf::from("env.csv")),
            week_ends_on: Some("Fri".to_string()),
            weekly_threshold: Some("37.5".to_string()),
            open_report: Some(true),
            ..Default::default()
        };
        let config = ReportConfig::resolve(cli, env).unwrap();
        assert_eq!(config.input, PathBuf::from("cli.csv"));
        assert_eq!(config.output, PathBuf::from("out.csv"));
        assert_eq!(config.week_ending, WeekEnding(Weekday::Sun));
        assert_eq!(config.weekly_threshold, dec!(44));
        assert!(!config.open_report);
        assert_eq!(config.log_level, "trace");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut cli = cli_with_input("a.csv");
        cli.week_ends_on = Some("Caturday".to_string());
        assert!(matches!(
            ReportConfig::resolve(cli, EnvConfig::default()),
            Err(ConfigError::InvalidWeekday(day)) if day == "Caturday"
        ));

        let mut cli = cli_with_input("a.csv");
        cli.threshold = Some("-1".to_string());
        assert!(matches!(
            ReportConfig::resolve(cli, EnvConfig::default()),
            Err(ConfigError::InvalidThreshold(_))
        ));

        let mut cli = cli_with_input("a.csv");
        cli.delimiter = Some("||".to_string());
        assert!(matches!(
            ReportConfig::resolve(cli, EnvConfig::default()),
            Err(ConfigError::InvalidDelimiter(_))
        ));
    }

    #[test]
    fn test_tab_delimiter_spelling() {
        assert_eq!(parse_delimiter("\\t").unwrap(), b'\t');
        assert_eq!(parse_delimiter("tab").unwrap(), b'\t');
        assert_eq!(parse_delimiter("\t").unwrap(), b'\t');
    }
}

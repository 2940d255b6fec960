//! Command line and environment configuration.
//!
//! Explicit flags win over `DRIVEWATCH_*` variables, which win over the
//! built-in defaults.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_ALERT_ROW_HEIGHT: u16 = 2;
pub const DEFAULT_DEMO_SIZE: usize = 2_000;
pub const ALERT_ROW_HEIGHT_RANGE: std::ops::RangeInclusive<u16> = 1..=4;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "drivewatch", version, about = "Driver health and safety dashboard")]
pub struct Cli {
    /// What to do. Defaults to the interactive dashboard.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Dataset JSON file. Without one a demo fleet is generated.
    #[arg(long, global = true, value_name = "PATH")]
    pub data: Option<PathBuf>,

    /// JSONL file of incoming alerts to tail.
    #[arg(long, global = true, value_name = "PATH")]
    pub feed: Option<PathBuf>,

    /// Number of alerts in the generated demo fleet.
    #[arg(long, global = true, value_name = "N")]
    pub demo_size: Option<usize>,

    /// Lines per row in the alert list (1-4).
    #[arg(long, global = true, value_name = "N")]
    pub alert_row_height: Option<u16>,

    /// Do not capture the mouse.
    #[arg(long, global = true, default_value_t = false)]
    pub no_mouse: bool,

    /// Write logs to this file.
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Log filter directives, e.g. `debug` or `drivewatch=trace`.
    #[arg(long, global = true, value_name = "FILTER")]
    pub log_filter: Option<String>,

    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq, Default)]
pub enum Command {
    /// Interactive dashboard.
    #[default]
    Dash,
    /// Print a collection as a JSON envelope.
    Export {
        #[arg(value_enum)]
        resource: ExportResource,
    },
    /// Acknowledge an alert and save the dataset.
    Ack { alert_id: u64 },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportResource {
    Alerts,
    Drivers,
    Notifications,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {var} has invalid value {value:?}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("alert row height {0} is outside 1..=4")]
    RowHeightOutOfRange(u16),

    #[error("`ack` needs a dataset file (--data or DRIVEWATCH_DATA)")]
    MissingDataFile,

    #[error("invalid log filter {filter:?}: {message}")]
    InvalidLogFilter { filter: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub command: Command,
    pub data: Option<PathBuf>,
    pub feed: Option<PathBuf>,
    pub demo_size: usize,
    pub alert_row_height: u16,
    pub mouse: bool,
    pub log_file: Option<PathBuf>,
    pub log_filter: String,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_args_and_env<E>(cli: Cli, get_env: E) -> Result<Self, ConfigError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let env_path = |var: &str| get_env(var).filter(|v| !v.is_empty()).map(PathBuf::from);

        let alert_row_height = match cli.alert_row_height {
            Some(h) => h,
            None => parse_env(&get_env, "DRIVEWATCH_ALERT_ROW_HEIGHT")?
                .unwrap_or(DEFAULT_ALERT_ROW_HEIGHT),
        };
        if !ALERT_ROW_HEIGHT_RANGE.contains(&alert_row_height) {
            return Err(ConfigError::RowHeightOutOfRange(alert_row_height));
        }

        let no_mouse = cli.no_mouse || parse_flag(&get_env, "DRIVEWATCH_NO_MOUSE")?;

        let config = Self {
            command: cli.command.unwrap_or_default(),
            data: cli.data.or_else(|| env_path("DRIVEWATCH_DATA")),
            feed: cli.feed.or_else(|| env_path("DRIVEWATCH_FEED")),
            demo_size: cli.demo_size.unwrap_or(DEFAULT_DEMO_SIZE),
            alert_row_height,
            mouse: !no_mouse,
            log_file: cli.log_file.or_else(|| env_path("DRIVEWATCH_LOG_FILE")),
            log_filter: cli
                .log_filter
                .or_else(|| get_env("DRIVEWATCH_LOG").filter(|v| !v.is_empty()))
                .unwrap_or_else(|| "info".to_owned()),
            log_format: cli.log_format.unwrap_or_default(),
        };

        if matches!(config.command, Command::Ack { .. }) && config.data.is_none() {
            return Err(ConfigError::MissingDataFile);
        }
        debug!(?config, "configuration resolved");
        Ok(config)
    }

    pub fn is_interactive(&self) -> bool {
        self.command == Command::Dash
    }
}

fn parse_env<E, T>(get_env: &E, var: &'static str) -> Result<Option<T>, ConfigError>
where
    E: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match get_env(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value }),
    }
}

fn parse_flag<E>(get_env: &E, var: &'static str) -> Result<bool, ConfigError>
where
    E: Fn(&str) -> Option<String>,
{
    let Some(value) = get_env(var) else {
        return Ok(false);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" | "off" => Ok(false),
        "1" | "true" | "yes" | "on" => Ok(true),
        _ => Err(ConfigError::InvalidEnv { var, value }),
    }
}

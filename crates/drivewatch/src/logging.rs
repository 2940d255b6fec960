use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::config::{Config, ConfigError, LogFormat};
use crate::error::{Error, Result};

/// Where log output goes for a given configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    File,
    Stderr,
    /// The dashboard owns the terminal and no log file was given.
    Disabled,
}

pub fn target(config: &Config) -> LogTarget {
    match (&config.log_file, config.is_interactive()) {
        (Some(_), _) => LogTarget::File,
        (None, true) => LogTarget::Disabled,
        (None, false) => LogTarget::Stderr,
    }
}

pub fn filter(directives: &str) -> std::result::Result<EnvFilter, ConfigError> {
    EnvFilter::try_new(directives).map_err(|err| ConfigError::InvalidLogFilter {
        filter: directives.to_owned(),
        message: err.to_string(),
    })
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(config: &Config) -> Result<()> {
    let env_filter = filter(&config.log_filter)?;
    let (writer, ansi) = match (target(config), &config.log_file) {
        (LogTarget::Disabled, _) => return Ok(()),
        (LogTarget::File, Some(path)) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| Error::Io {
                    path: path.clone(),
                    source,
                })?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        _ => (BoxMakeWriter::new(std::io::stderr), true),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_ansi(ansi);
    let _ = match config.log_format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Cli, Command};

    fn config(command: Command, log_file: Option<&str>) -> Config {
        let mut config =
            Config::from_args_and_env(Cli::default(), |_| None).expect("default config");
        config.command = command;
        config.log_file = log_file.map(Into::into);
        config
    }

    #[test]
    fn dashboard_without_file_disables_logging() {
        assert_eq!(target(&config(Command::Dash, None)), LogTarget::Disabled);
        assert_eq!(target(&config(Command::Dash, Some("dw.log"))), LogTarget::File);
        assert_eq!(target(&config(Command::Ack { alert_id: 1 }, None)), LogTarget::Stderr);
    }

    #[test]
    fn invalid_filter_is_a_config_error() {
        assert!(filter("drivewatch=debug,info").is_ok());
        assert!(matches!(
            filter("drivewatch=notalevel"),
            Err(ConfigError::InvalidLogFilter { .. })
        ));
    }
}

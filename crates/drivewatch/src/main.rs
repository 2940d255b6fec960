use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use dw_runtime::{Program, ProgramConfig};
use tracing::{error, info};

use drivewatch::api;
use drivewatch::app::{AppOptions, DriveWatch};
use drivewatch::config::{Cli, Command, Config, ExportResource};
use drivewatch::logging;
use drivewatch::store::{AlertQuery, MemoryStore};
use drivewatch::{Error, Result};

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            error!(%err, "drivewatch failed");
            eprintln!("drivewatch: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::from_args_and_env(cli, |key| std::env::var(key).ok())?;
    logging::init(&config)?;

    let mut store = load_store(&config)?;
    match config.command {
        Command::Dash => {
            dashboard(store, &config)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Export { resource } => {
            let json = match resource {
                ExportResource::Alerts => api::list_alerts(&store, &AlertQuery::default()).to_json(),
                ExportResource::Drivers => api::list_drivers(&store).to_json(),
                ExportResource::Notifications => api::list_notifications(&store).to_json(),
            };
            println!("{json}");
            Ok(ExitCode::SUCCESS)
        }
        Command::Ack { alert_id } => {
            let envelope = api::acknowledge_alert(&mut store, alert_id);
            if envelope.success
                && let Some(path) = &config.data
            {
                store.save(path)?;
            }
            println!("{}", envelope.to_json());
            Ok(if envelope.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn load_store(config: &Config) -> Result<MemoryStore> {
    match &config.data {
        Some(path) => MemoryStore::load(Path::new(path)),
        None => {
            info!(size = config.demo_size, "no dataset given, generating demo fleet");
            Ok(MemoryStore::demo(config.demo_size))
        }
    }
}

fn dashboard(store: MemoryStore, config: &Config) -> Result<()> {
    let app = DriveWatch::new(
        store,
        AppOptions {
            data_path: config.data.clone(),
            feed: config.feed.clone(),
            alert_row_height: config.alert_row_height,
        },
    );
    let mut program_config = ProgramConfig::fullscreen();
    if config.mouse {
        program_config = program_config.with_mouse();
    }
    let mut program = Program::with_config(app, program_config).map_err(Error::Terminal)?;
    program.run().map_err(Error::Terminal)?;
    info!("dashboard closed");
    Ok(())
}

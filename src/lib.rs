pub mod alerts;
pub mod cli;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod export;
pub mod forecast;
pub mod ingest;
pub mod menu;
pub mod models;
pub mod notify;
pub mod session;
pub mod settings;
pub mod status;
pub mod utils;

use std::{path::Path, process::ExitCode};

use anyhow::{Context, Result};
use log::{error, info};

use db::Database;
use session::SessionStore;
use settings::SettingsStore;

pub struct AppState {
    pub db: Database,
    pub settings: SettingsStore,
    pub session: SessionStore,
}

impl AppState {
    /// Open the store, settings and session marker under `data_dir`.
    pub fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        Ok(Self {
            db: Database::new(data_dir.join("pmwatch.sqlite3"))?,
            settings: SettingsStore::new(data_dir.join("settings.json"))?,
            session: SessionStore::new(data_dir.join("session.json"))?,
        })
    }
}

pub fn run() -> ExitCode {
    let level = if settings::debug_mode() {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match cli::parse_args(&args) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("{err:#}");
            return ExitCode::from(2);
        }
    };

    let result = (|| -> Result<()> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("failed to start the async runtime")?;

        let data_dir = settings::default_data_dir();
        info!("Using data directory {}", data_dir.display());
        let state = AppState::open(&data_dir)?;

        runtime.block_on(cli::execute(command, &state))
    })();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

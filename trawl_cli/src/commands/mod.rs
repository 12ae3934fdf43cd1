pub mod config;
pub mod search;
pub mod sources;

use crate::cli::Cli;
use thiserror::Error;
use trawl_core::SettingsStore;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Engine(#[from] trawl_core::error::EngineError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, CommandError>;

/// Settings store selected by `--config` / `TRAWL_CONFIG`, or the default location.
pub fn settings_store(cli: &Cli) -> SettingsStore {
    match &cli.config {
        Some(path) => SettingsStore::new(path.clone()),
        None => SettingsStore::new_default(),
    }
}

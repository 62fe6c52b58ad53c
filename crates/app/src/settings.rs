//! Runtime settings: `config/mvault.toml`, then `MVAULT_*` variables, then
//! command-line flags.

use std::{path::PathBuf, time::Duration};

use serde::Deserialize;

use crate::{cli::Cli, error::Result};

const DEFAULT_CONFIG_PATH: &str = "config/mvault.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database_url: String,
    pub log_level: String,
    pub backup_dir: PathBuf,
    pub auto_backup_password: String,
    pub session_ttl_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite:./mvault.db?mode=rwc".to_string(),
            log_level: "info".to_string(),
            backup_dir: PathBuf::from("."),
            auto_backup_password: engine::backup::DEFAULT_AUTO_BACKUP_PASSWORD.to_string(),
            session_ttl_secs: 300,
        }
    }
}

impl Settings {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

pub fn load(cli: &Cli) -> Result<Settings> {
    let config_path = cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("MVAULT"));
    let mut settings: Settings = builder.build()?.try_deserialize()?;

    if let Some(url) = &cli.database_url {
        settings.database_url = url.clone();
    }
    if let Some(level) = &cli.log_level {
        settings.log_level = level.clone();
    }

    Ok(settings)
}

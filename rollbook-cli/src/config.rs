//! Connection settings resolution
//!
//! Precedence (highest to lowest):
//! 1. `--database-url`
//! 2. Process environment (`DATABASE_URL`, `DB_*`)
//! 3. `.env` in the current directory, then `~/.rollbook/.env`
//! 4. `[database]` table of `~/.rollbook/config.toml` (or `--config`)
//! 5. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use rollbook_db::DbSettings;
use serde::Deserialize;
use tracing::{debug, info};

/// `~/.rollbook`
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".rollbook"))
}

/// `~/.rollbook/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Load `.env` files into the process environment.
///
/// dotenvy never overwrites variables that are already set, so the current
/// directory's file wins over `~/.rollbook/.env` and both lose to the real
/// environment.
pub fn load_dotenv() {
    let mut loaded_from = Vec::new();

    if let Ok(path) = dotenvy::dotenv() {
        debug!("Loaded .env from current directory: {}", path.display());
        loaded_from.push(path);
    }

    if let Some(env_file) = config_dir().map(|dir| dir.join(".env")) {
        if env_file.exists() {
            match dotenvy::from_path(&env_file) {
                Ok(()) => {
                    debug!("Loaded .env from {}", env_file.display());
                    loaded_from.push(env_file);
                }
                Err(e) => debug!("Failed to load {}: {}", env_file.display(), e),
            }
        }
    }

    if loaded_from.is_empty() {
        debug!("No .env files found (current dir or ~/.rollbook)");
    }
}

/// Contents of `config.toml`
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub database: DatabaseSection,
}

/// `[database]` table; every key is optional
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DatabaseSection {
    pub url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub max_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Read and parse a config file. A missing file is not an error.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            debug!("No config file at {}", path.display());
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file (invalid TOML): {}", path.display()))?;
        Ok(Some(config))
    }
}

impl DatabaseSection {
    /// Overwrite the fields of `settings` that this section sets.
    pub fn apply(&self, mut settings: DbSettings) -> DbSettings {
        if let Some(url) = self.url.as_ref().filter(|u| !u.is_empty()) {
            settings.url = Some(url.clone());
        }
        if let Some(host) = &self.host {
            settings.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
        if let Some(user) = &self.user {
            settings.user = user.clone();
        }
        if let Some(password) = &self.password {
            settings.password = password.clone();
        }
        if let Some(name) = &self.name {
            settings.database = name.clone();
        }
        if let Some(max) = self.max_connections {
            settings.max_connections = max;
        }
        if let Some(secs) = self.acquire_timeout_secs {
            settings.acquire_timeout = Duration::from_secs(secs);
        }
        settings
    }
}

/// Build settings from every source, lowest precedence first.
///
/// `lookup` stands in for the process environment so tests stay hermetic.
pub fn resolve_settings<F>(
    config_path: Option<&Path>,
    database_url: Option<&str>,
    lookup: F,
) -> Result<DbSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings = DbSettings::default();

    let path = config_path.map(Path::to_path_buf).or_else(default_config_path);
    if let Some(path) = path {
        if let Some(file) = FileConfig::load(&path)? {
            settings = file.database.apply(settings);
            debug!("Applied [database] from {}", path.display());
        }
    }

    let mut settings = settings
        .overlay(lookup)
        .context("Invalid database settings in environment")?;

    if let Some(url) = database_url {
        settings.url = Some(url.to_string());
    }

    info!(target = %settings.redacted(), "database settings resolved");
    Ok(settings)
}

//! Settings loading.
//!
//! Defaults are overlaid by the first settings file found, then by
//! `BANKFLOW_*` environment variables.

use crate::paths::BankflowPaths;
use bankflow_core::config::Settings;
use bankflow_core::error::{BankflowError, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_TOKEN: &str = "BANKFLOW_TOKEN";
pub const ENV_COUNTRY: &str = "BANKFLOW_COUNTRY";
pub const ENV_BASE_URL: &str = "BANKFLOW_BASE_URL";
pub const ENV_REDIRECT_URL: &str = "BANKFLOW_REDIRECT_URL";
pub const ENV_OUTPUT_DIR: &str = "BANKFLOW_OUTPUT_DIR";
pub const ENV_LOGO_TABLE: &str = "BANKFLOW_LOGO_TABLE";
pub const ENV_HOST: &str = "BANKFLOW_HOST";
pub const ENV_PORT: &str = "BANKFLOW_PORT";

pub struct SettingsService;

impl SettingsService {
    /// Loads settings for the running process.
    ///
    /// An explicit `path` must exist. Without one, `./settings.toml` and then the
    /// user config directory are tried; finding neither is not an error.
    pub fn load(path: Option<&Path>) -> Result<Settings> {
        let file = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(BankflowError::config(format!(
                        "settings file not found: {}",
                        path.display()
                    )));
                }
                Some(path.to_path_buf())
            }
            None => Self::discover()?,
        };

        let settings = match file {
            Some(file) => {
                tracing::info!("Loading settings from {}", file.display());
                Self::load_file(&file)?
            }
            None => {
                tracing::info!("No settings file found, using defaults and environment");
                Settings::default()
            }
        };

        Self::apply_overrides(settings, |key| std::env::var(key).ok())
    }

    /// Parses one settings file; keys that are absent keep their defaults.
    pub fn load_file(path: &Path) -> Result<Settings> {
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Settings::default());
        }
        Ok(toml::from_str(&content)?)
    }

    /// Applies environment overrides read through `lookup`.
    ///
    /// Empty values are ignored so an exported-but-blank variable does not wipe a
    /// value from the file.
    pub fn apply_overrides<F>(mut settings: Settings, lookup: F) -> Result<Settings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(token) = get(ENV_TOKEN) {
            settings.token = token;
        }
        if let Some(country) = get(ENV_COUNTRY) {
            settings.country = country;
        }
        if let Some(base_url) = get(ENV_BASE_URL) {
            settings.base_url = base_url;
        }
        if let Some(redirect_url) = get(ENV_REDIRECT_URL) {
            settings.redirect_url = redirect_url;
        }
        if let Some(output_dir) = get(ENV_OUTPUT_DIR) {
            settings.output_dir = PathBuf::from(output_dir);
        }
        if let Some(logo_table) = get(ENV_LOGO_TABLE) {
            settings.logo_table = PathBuf::from(logo_table);
        }
        if let Some(host) = get(ENV_HOST) {
            settings.host = host;
        }
        if let Some(port) = get(ENV_PORT) {
            settings.port = port.trim().parse().map_err(|_| {
                BankflowError::config(format!("{ENV_PORT} is not a valid port: {port}"))
            })?;
        }
        Ok(settings)
    }

    fn discover() -> Result<Option<PathBuf>> {
        let working_dir = std::env::current_dir()?;
        Ok(BankflowPaths::settings_candidates(&working_dir)
            .into_iter()
            .find(|candidate| candidate.is_file()))
    }
}

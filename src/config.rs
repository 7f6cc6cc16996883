//! Application-level configuration loading: board time zone, offline cache and asset origin.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use time::UtcOffset;
use tracing::{info, warn};

use crate::offline::worker::WorkerSettings;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "GAME_NIGHT_CONFIG_PATH";

const DEFAULT_CACHE_VERSION: &str = "v3-2025-09-22";
const DEFAULT_CACHE_PREFIX: &str = "game-night-";
const DEFAULT_ASSET_ORIGIN: &str = "http://localhost:5000";

const DEFAULT_ESSENTIALS: &[&str] = &["/", "/index.html", "/scripts.js", "/manifest.json"];
const DEFAULT_ASSETS: &[&str] = &[
    "/",
    "/index.html",
    "/scripts.js",
    "/manifest.json",
    "/icon-192.png",
    "/icon-512.png",
    "https://stackpath.bootstrapcdn.com/bootstrap/4.5.2/css/bootstrap.min.css",
    "https://cdn.datatables.net/1.11.3/css/jquery.dataTables.min.css",
    "https://cdn.jsdelivr.net/npm/select2/dist/css/select2.min.css",
    "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.0.0/css/all.min.css",
    "https://code.jquery.com/jquery-3.5.1.js",
    "https://cdn.datatables.net/1.11.3/js/jquery.dataTables.min.js",
    "https://stackpath.bootstrapcdn.com/bootstrap/4.5.2/js/bootstrap.min.js",
    "https://cdn.jsdelivr.net/npm/select2/dist/js/select2.min.js",
];

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    utc_offset: UtcOffset,
    cache: WorkerSettings,
    asset_origin: String,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => match Self::try_from(raw) {
                    Ok(config) => {
                        info!(
                            path = %path.display(),
                            cache = %config.cache.cache_name(),
                            offset = %config.utc_offset,
                            "loaded board configuration"
                        );
                        config
                    }
                    Err(err) => {
                        warn!(
                            path = %path.display(),
                            error = %err,
                            "invalid config values; falling back to defaults"
                        );
                        Self::default()
                    }
                },
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Offset in which calendar ranges and form defaults are computed.
    pub fn utc_offset(&self) -> UtcOffset {
        self.utc_offset
    }

    pub fn cache(&self) -> &WorkerSettings {
        &self.cache
    }

    /// Origin relative asset paths are fetched from.
    pub fn asset_origin(&self) -> &str {
        &self.asset_origin
    }

    /// Replace the offset, keeping everything else.
    pub fn with_utc_offset(mut self, offset: UtcOffset) -> Self {
        self.utc_offset = offset;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            utc_offset: UtcOffset::UTC,
            cache: WorkerSettings {
                version: DEFAULT_CACHE_VERSION.to_owned(),
                prefix: DEFAULT_CACHE_PREFIX.to_owned(),
                assets: owned(DEFAULT_ASSETS),
                essentials: owned(DEFAULT_ESSENTIALS),
            },
            asset_origin: DEFAULT_ASSET_ORIGIN.to_owned(),
        }
    }
}

fn owned(urls: &[&str]) -> Vec<String> {
    urls.iter().map(|url| (*url).to_owned()).collect()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    utc_offset_minutes: Option<i32>,
    cache: RawCacheConfig,
    asset_origin: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCacheConfig {
    version: Option<String>,
    prefix: Option<String>,
    assets: Option<Vec<String>>,
    essentials: Option<Vec<String>>,
}

impl TryFrom<RawConfig> for AppConfig {
    type Error = time::error::ComponentRange;

    fn try_from(value: RawConfig) -> Result<Self, Self::Error> {
        let defaults = Self::default();
        let utc_offset = match value.utc_offset_minutes {
            Some(minutes) => UtcOffset::from_whole_seconds(minutes.saturating_mul(60))?,
            None => defaults.utc_offset,
        };

        Ok(Self {
            utc_offset,
            cache: WorkerSettings {
                version: value.cache.version.unwrap_or(defaults.cache.version),
                prefix: value.cache.prefix.unwrap_or(defaults.cache.prefix),
                assets: value.cache.assets.unwrap_or(defaults.cache.assets),
                essentials: value.cache.essentials.unwrap_or(defaults.cache.essentials),
            },
            asset_origin: value.asset_origin.unwrap_or(defaults.asset_origin),
        })
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_shipped_cache() {
        let config = AppConfig::default();
        assert_eq!(config.cache().cache_name(), "game-night-v3-2025-09-22");
        assert_eq!(config.cache().essentials.len(), 4);
        assert!(
            config
                .cache()
                .essentials
                .iter()
                .all(|url| config.cache().assets.contains(url))
        );
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let raw: RawConfig = serde_json::from_str(
            r#"{ "utc_offset_minutes": 120, "cache": { "version": "v4" } }"#,
        )
        .unwrap();
        let config = AppConfig::try_from(raw).unwrap();
        assert_eq!(config.utc_offset().whole_hours(), 2);
        assert_eq!(config.cache().cache_name(), "game-night-v4");
        assert_eq!(config.asset_origin(), DEFAULT_ASSET_ORIGIN);
    }

    #[test]
    fn out_of_range_offset_is_rejected() {
        let raw: RawConfig = serde_json::from_str(r#"{ "utc_offset_minutes": 100000 }"#).unwrap();
        assert!(AppConfig::try_from(raw).is_err());
    }
}

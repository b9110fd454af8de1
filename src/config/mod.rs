//! Configuration resolution: CLI arguments plus an optional TOML file,
//! with file values overriding CLI where present.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_ACCESS_TTL_MINUTES: i64 = 60;
pub const DEFAULT_REFRESH_TTL_DAYS: i64 = 7;

/// CLI arguments that participate in config resolution.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub port: Option<u16>,
    pub media_url: Option<String>,
    pub token_secret: Option<String>,
}

/// Optional TOML file configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub db_path: Option<PathBuf>,
    pub port: Option<u16>,
    pub media_url: Option<String>,
    pub token_secret: Option<String>,
    pub access_ttl_minutes: Option<i64>,
    pub refresh_ttl_days: Option<i64>,
}

impl FileConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file {:?}", path.as_ref()))?;
        toml::from_str(&raw).context("Failed to parse config file")
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub port: u16,
    /// Base URL of the media host; absent means assets are kept in
    /// process (dev/test only).
    pub media_url: Option<String>,
    pub token_secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file
    /// config. TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file: Option<FileConfig>) -> Result<Self> {
        let file = file.unwrap_or_default();

        let token_secret = match file.token_secret.or_else(|| cli.token_secret.clone()) {
            Some(secret) => secret,
            None => {
                warn!("No token secret configured, using a development default");
                "cliptube-dev-secret".to_string()
            }
        };

        Ok(Self {
            db_path: file
                .db_path
                .or_else(|| cli.db_path.clone())
                .unwrap_or_else(|| PathBuf::from("cliptube.db")),
            port: file.port.or(cli.port).unwrap_or(DEFAULT_PORT),
            media_url: file.media_url.or_else(|| cli.media_url.clone()),
            token_secret,
            access_ttl_minutes: file
                .access_ttl_minutes
                .unwrap_or(DEFAULT_ACCESS_TTL_MINUTES),
            refresh_ttl_days: file.refresh_ttl_days.unwrap_or(DEFAULT_REFRESH_TTL_DAYS),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_overrides_cli() {
        let cli = CliConfig {
            db_path: Some(PathBuf::from("cli.db")),
            port: Some(4000),
            media_url: None,
            token_secret: Some("cli-secret".to_string()),
        };
        let file = FileConfig {
            port: Some(5000),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, Some(file)).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.db_path, PathBuf::from("cli.db"));
        assert_eq!(config.token_secret, "cli-secret");
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = AppConfig::resolve(&CliConfig::default(), None).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.db_path, PathBuf::from("cliptube.db"));
        assert_eq!(config.access_ttl_minutes, DEFAULT_ACCESS_TTL_MINUTES);
        assert_eq!(config.refresh_ttl_days, DEFAULT_REFRESH_TTL_DAYS);
    }

    #[test]
    fn toml_parses() {
        let file: FileConfig =
            toml::from_str("port = 8080\nmedia_url = \"https://media.example.com\"").unwrap();
        assert_eq!(file.port, Some(8080));
        assert_eq!(file.media_url.as_deref(), Some("https://media.example.com"));
    }
}

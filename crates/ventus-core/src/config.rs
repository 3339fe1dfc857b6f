//! Ventus configuration
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. An explicit path, or the override in the data dir
//!    (~/.local/share/ventus/config.toml) when it exists
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Environment variables (`VENTUS_AI_BACKEND`, `VENTUS_ENRICH_HOST`,
//! `VENTUS_API_KEY`) are applied on top of whichever file was used.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/ventus.toml");

/// Which client talks to the enrichment and personalization functions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendKind {
    #[default]
    Http,
    Mock,
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown AI backend: {} (expected http or mock)", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentConfig {
    pub backend: BackendKind,
    /// Base URL of the serverless functions; no HTTP client without it
    pub host: Option<String>,
    pub api_key: Option<String>,
    pub enrich_path: String,
    pub personalize_path: String,
    pub health_path: String,
    /// Per-request timeout; an expired request is abandoned, not retried
    pub timeout: Duration,
    pub batch_size: usize,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Http,
            host: None,
            api_key: None,
            enrich_path: "/enrich-transactions".to_string(),
            personalize_path: "/personalize-deals".to_string(),
            health_path: "/health".to_string(),
            timeout: Duration::from_secs(30),
            batch_size: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportConfig {
    pub anchor_zip: Option<String>,
    pub derive_merchants: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            anchor_zip: None,
            derive_merchants: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportsConfig {
    pub top_merchants: usize,
    pub top_subcategories: usize,
    pub top_deals: usize,
    pub percentage_decimals: u32,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            top_merchants: 10,
            top_subcategories: 8,
            top_deals: 4,
            percentage_decimals: 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionConfig {
    /// Session file; `None` uses the data dir default
    pub path: Option<PathBuf>,
}

impl SessionConfig {
    /// Resolved session file path
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .clone()
            .or_else(default_session_path)
            .unwrap_or_else(|| PathBuf::from("ventus-session.json"))
    }
}

/// Resolved configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub enrichment: EnrichmentConfig,
    pub import: ImportConfig,
    pub reports: ReportsConfig,
    pub session: SessionConfig,
    /// File the config was read from (`None` = embedded defaults)
    pub source: Option<PathBuf>,
}

impl Config {
    /// Load config (explicit path or data dir override, then defaults) and
    /// apply environment overrides
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = load_config(explicit)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Embedded defaults only, without environment overrides
    pub fn embedded() -> Result<Self> {
        parse_config(DEFAULT_CONFIG)
    }

    /// Apply `VENTUS_*` overrides from a variable lookup
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = lookup("VENTUS_AI_BACKEND") {
            self.enrichment.backend = backend.parse().map_err(Error::Config)?;
        }
        if let Some(host) = lookup("VENTUS_ENRICH_HOST").filter(|h| !h.trim().is_empty()) {
            self.enrichment.host = Some(host);
        }
        if let Some(key) = lookup("VENTUS_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.enrichment.api_key = Some(key);
        }
        Ok(())
    }
}

/// Data directory for Ventus files
pub fn data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("ventus"))
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    data_dir().map(|d| d.join("config.toml"))
}

/// Default session file path
pub fn default_session_path() -> Option<PathBuf> {
    data_dir().map(|d| d.join("session.json"))
}

/// Load configuration (override first, then default)
fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) if path.exists() => Some(path.to_path_buf()),
        Some(path) => {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )))
        }
        None => default_config_path().filter(|p| p.exists()),
    };

    let Some(path) = path else {
        debug!("Using embedded default config");
        return parse_config(DEFAULT_CONFIG);
    };

    let content = fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    let mut config = parse_config(&content)?;
    debug!(path = %path.display(), "Loaded config override");
    config.source = Some(path);
    Ok(config)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    enrichment: Option<RawEnrichment>,
    import: Option<RawImport>,
    reports: Option<RawReports>,
    session: Option<RawSession>,
}

#[derive(Debug, Deserialize)]
struct RawEnrichment {
    backend: Option<String>,
    host: Option<String>,
    api_key: Option<String>,
    enrich_path: Option<String>,
    personalize_path: Option<String>,
    health_path: Option<String>,
    timeout_secs: Option<u64>,
    batch_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawImport {
    anchor_zip: Option<String>,
    derive_merchants: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawReports {
    top_merchants: Option<usize>,
    top_subcategories: Option<usize>,
    top_deals: Option<usize>,
    percentage_decimals: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawSession {
    path: Option<PathBuf>,
}

/// Parse config from TOML content; missing keys keep their defaults
fn parse_config(content: &str) -> Result<Config> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = Config::default();

    if let Some(e) = raw.enrichment {
        if let Some(backend) = e.backend {
            config.enrichment.backend = backend.parse().map_err(Error::Config)?;
        }
        if let Some(host) = e.host {
            config.enrichment.host = Some(host);
        }
        if let Some(key) = e.api_key {
            config.enrichment.api_key = Some(key);
        }
        if let Some(path) = e.enrich_path {
            config.enrichment.enrich_path = path;
        }
        if let Some(path) = e.personalize_path {
            config.enrichment.personalize_path = path;
        }
        if let Some(path) = e.health_path {
            config.enrichment.health_path = path;
        }
        if let Some(secs) = e.timeout_secs {
            config.enrichment.timeout = Duration::from_secs(secs);
        }
        if let Some(size) = e.batch_size {
            if size == 0 {
                return Err(Error::Config("enrichment.batch_size must be at least 1".into()));
            }
            config.enrichment.batch_size = size;
        }
    }

    if let Some(i) = raw.import {
        config.import.anchor_zip = i.anchor_zip;
        if let Some(derive) = i.derive_merchants {
            config.import.derive_merchants = derive;
        }
    }

    if let Some(r) = raw.reports {
        if let Some(n) = r.top_merchants {
            config.reports.top_merchants = n;
        }
        if let Some(n) = r.top_subcategories {
            config.reports.top_subcategories = n;
        }
        if let Some(n) = r.top_deals {
            config.reports.top_deals = n;
        }
        if let Some(d) = r.percentage_decimals {
            config.reports.percentage_decimals = d.min(4);
        }
    }

    if let Some(s) = raw.session {
        config.session.path = s.path;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_default_config() {
        let config = Config::embedded().unwrap();
        assert_eq!(config.enrichment.backend, BackendKind::Http);
        assert_eq!(config.enrichment.host, None);
        assert_eq!(config.enrichment.enrich_path, "/enrich-transactions");
        assert_eq!(config.enrichment.timeout, Duration::from_secs(30));
        assert_eq!(config.enrichment.batch_size, 50);
        assert!(config.import.derive_merchants);
        assert_eq!(config.reports.top_merchants, 10);
        assert_eq!(config.reports.percentage_decimals, 1);
        assert_eq!(config.source, None);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = parse_config(
            r#"
            [enrichment]
            host = "http://localhost:9999"
            timeout_secs = 5

            [import]
            anchor_zip = "30301"
            "#,
        )
        .unwrap();
        assert_eq!(config.enrichment.host.as_deref(), Some("http://localhost:9999"));
        assert_eq!(config.enrichment.timeout, Duration::from_secs(5));
        assert_eq!(config.enrichment.personalize_path, "/personalize-deals");
        assert_eq!(config.import.anchor_zip.as_deref(), Some("30301"));
        assert!(config.import.derive_merchants);
        assert_eq!(config.reports, ReportsConfig::default());
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(matches!(
            parse_config("[enrichment]\nbackend = \"grpc\""),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            parse_config("[enrichment]\nbatch_size = 0"),
            Err(Error::Config(_))
        ));
        assert!(matches!(parse_config("not = [toml"), Err(Error::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("VENTUS_AI_BACKEND", "MOCK"),
            ("VENTUS_ENRICH_HOST", "http://127.0.0.1:4000"),
            ("VENTUS_API_KEY", ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config::embedded().unwrap();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.enrichment.backend, BackendKind::Mock);
        assert_eq!(
            config.enrichment.host.as_deref(),
            Some("http://127.0.0.1:4000")
        );
        assert_eq!(config.enrichment.api_key, None);

        let bad = config.apply_env(|key| (key == "VENTUS_AI_BACKEND").then(|| "carrier-pigeon".to_string()));
        assert!(bad.is_err());
    }

    #[test]
    fn test_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ventus.toml");
        fs::write(&path, "[reports]\ntop_merchants = 3\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.reports.top_merchants, 3);
        assert_eq!(config.source.as_deref(), Some(path.as_path()));

        let missing = dir.path().join("missing.toml");
        assert!(matches!(load_config(Some(&missing)), Err(Error::Config(_))));
    }
}

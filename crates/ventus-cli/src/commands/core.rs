//! Shared command utilities
//!
//! This module contains:
//! - `load_config` - Resolve configuration for a command
//! - `open_context` - Open the session a command works on
//! - `read_input` - Read a statement from a file or stdin
//! - `ai_client` - Build the enrichment client from config

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;
use ventus_core::{AIClient, Config, SessionStore};

/// Configuration and session shared by session commands
pub struct AppContext {
    pub config: Config,
    pub store: SessionStore,
}

pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    Config::load(config_path).context("Failed to load configuration")
}

/// Load config and open the session file (flag beats config)
pub fn open_context(config_path: Option<&Path>, session_path: Option<&Path>) -> Result<AppContext> {
    let config = load_config(config_path)?;
    let path = session_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.session.resolved_path());
    debug!(session = %path.display(), "Opening session");
    let store = SessionStore::open(path);
    Ok(AppContext { config, store })
}

/// Read statement text from a file, or stdin when no file (or "-") is given
pub fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display())),
        _ => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read statement from stdin")?;
            Ok(raw)
        }
    }
}

/// Enrichment client for the configured backend, if one is usable
pub fn ai_client(config: &Config) -> Option<AIClient> {
    AIClient::from_config(&config.enrichment)
}

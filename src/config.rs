//! Configuration from environment variables.
//!
//! Callers load `.env` first (via `dotenvy`), then environment variables are
//! read here. Both tools are otherwise fully interactive; the environment
//! only carries overrides that do not warrant a prompt.

use anyhow::Result;
use std::env;
use std::path::PathBuf;

use crate::logger;

/// Default LOCALVERSION suffix offered at the prompt.
pub const DEFAULT_LOCALVERSION: &str = "-custom";

#[derive(Debug, Clone)]
pub struct Config {
    /// Session log path override (KFORGE_LOG). None means a timestamped
    /// file in the invocation directory.
    pub log_path: Option<PathBuf>,
    /// Default LOCALVERSION suffix (KFORGE_LOCALVERSION).
    pub localversion: String,
}

impl Config {
    /// Load configuration from the environment.
    pub fn load() -> Self {
        let log_path = env::var("KFORGE_LOG")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let localversion = env::var("KFORGE_LOCALVERSION")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOCALVERSION.to_string());

        Self {
            log_path,
            localversion,
        }
    }

    /// Where this invocation's session log goes.
    pub fn session_log_path(&self, tool: &str) -> Result<PathBuf> {
        match &self.log_path {
            Some(path) => Ok(path.clone()),
            None => Ok(PathBuf::from(logger::default_log_name(tool)?)),
        }
    }
}

#![forbid(unsafe_code)]

//! Support code for the `tao` command-line tool.
//!
//! The binary loads CSV files into a [`MemBackend`](crate::backend::memory::MemBackend)
//! and answers one query per invocation. Configuration resolution lives here so
//! it can be tested without spawning the binary.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::TaoConfig;
use crate::types::Result;

pub mod load;

pub use load::{load_csv, LoadConfig, LoadSummary};

/// `<config_dir>/tao/config.toml`, when the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tao").join("config.toml"))
}

/// Resolves the configuration for a CLI run.
///
/// An explicit path must exist. The default path is used only when present;
/// otherwise built-in defaults apply.
pub fn resolve_config(explicit: Option<&Path>) -> Result<TaoConfig> {
    if let Some(path) = explicit {
        return TaoConfig::load(path);
    }
    match default_config_path() {
        Some(path) if path.exists() => {
            debug!(path = %path.display(), "cli.config");
            TaoConfig::load(&path)
        }
        _ => Ok(TaoConfig::default()),
    }
}

//! Tracer configuration file
//!
//! A versioned JSON document read once at process start: which methods to
//! auto-instrument, whether to start a session unconditionally, and the
//! default filter/script-map settings. Not a runtime API; nothing rereads
//! the file after startup.

use crate::instrument::InstrumentationTarget;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Config format version (currently only v1 supported)
const SUPPORTED_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceConfig {
    /// Config format version
    pub version: u32,

    /// Start a default session unconditionally at install time
    #[serde(default)]
    pub autorun: bool,

    /// Methods to wrap with session start/stop shims
    #[serde(default)]
    pub targets: Vec<InstrumentationTarget>,

    /// Default filter expression (same syntax as -e, e.g. "kinds=calls")
    #[serde(default)]
    pub filter: Option<String>,

    /// Path to a script map JSON for `{N}` placeholder resolution
    #[serde(default)]
    pub script_map: Option<String>,
}

impl TraceConfig {
    /// Load and parse a config from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            bail!("Config file not found: {}", path_ref.display());
        }

        let contents = fs::read_to_string(path_ref).context("Failed to read config file")?;

        let config: TraceConfig =
            serde_json::from_str(&contents).context("Invalid config JSON")?;

        if config.version != SUPPORTED_VERSION {
            bail!(
                "Unsupported config version: {} (expected {})",
                config.version,
                SUPPORTED_VERSION
            );
        }

        Ok(config)
    }
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            version: SUPPORTED_VERSION,
            autorun: false,
            targets: Vec::new(),
            filter: None,
            script_map: None,
        }
    }
}

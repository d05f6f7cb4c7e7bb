// Script Name Resolution
//
// Game-engine runtimes report script locations as index placeholders like
// "{2}" rather than file names. A ScriptMap translates those indices to
// human-readable names. Resolution is strictly best-effort: a missing map
// or an out-of-range index leaves the raw placeholder untouched.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Script map format version (currently only v1 supported)
const SUPPORTED_VERSION: u32 = 1;

/// Index → script name table loaded from the engine's script registry dump
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptMap {
    /// Map format version
    pub version: u32,

    /// Script names in registry order; index N names script N
    pub scripts: Vec<String>,
}

impl ScriptMap {
    /// Load and parse a script map from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            bail!("Script map file not found: {}", path_ref.display());
        }

        let contents = fs::read_to_string(path_ref).context("Failed to read script map file")?;

        let map: ScriptMap = serde_json::from_str(&contents).context("Invalid script map JSON")?;

        if map.version != SUPPORTED_VERSION {
            bail!(
                "Unsupported script map version: {} (expected {})",
                map.version,
                SUPPORTED_VERSION
            );
        }

        Ok(map)
    }

    /// Build a map directly from a list of names (registry order)
    pub fn from_names(names: Vec<String>) -> Self {
        Self {
            version: SUPPORTED_VERSION,
            scripts: names,
        }
    }

    /// Look up the script name for an index
    pub fn lookup(&self, index: usize) -> Option<&str> {
        self.scripts.get(index).map(String::as_str)
    }

    /// Get total number of registered script names
    pub fn script_count(&self) -> usize {
        self.scripts.len()
    }
}

/// Parse a placeholder location like "{2}", returning the embedded index
///
/// Anything that is not exactly `{digits}` is not a placeholder.
pub fn parse_placeholder(location: &str) -> Option<usize> {
    let inner = location.strip_prefix('{')?.strip_suffix('}')?;
    if inner.is_empty() {
        return None;
    }
    inner.parse().ok()
}

/// Resolve a location through an optional script map
///
/// Placeholders with a map entry become the mapped name; everything else
/// passes through unchanged.
pub fn resolve_location<'a>(location: &'a str, map: Option<&'a ScriptMap>) -> &'a str {
    match (parse_placeholder(location), map) {
        (Some(index), Some(map)) => map.lookup(index).unwrap_or(location),
        _ => location,
    }
}

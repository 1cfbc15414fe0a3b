//! Display settings for elfdump.
//!
//! Read from `elfdump.toml` in the working directory (or the file passed
//! with `--config`), then overridden by command-line flags:
//!
//! ```toml
//! [display]
//! format = "json"     # "table" (default) or "json"
//! radix = "dec"       # "hex" (default) or "dec"
//! demangle = true     # default false
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::verbose::vprintln;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG: &str = "elfdump.toml";

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Aligned text columns.
    #[default]
    Table,
    /// Pretty-printed JSON.
    Json,
}

/// Radix for addresses, offsets and sizes in table output.
///
/// JSON output always carries plain integers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Radix {
    /// `0x`-prefixed hexadecimal.
    #[default]
    Hex,
    /// Decimal.
    Dec,
}

/// Contents of a config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// The `[display]` table.
    #[serde(default)]
    pub display: DisplayConfig,
}

/// The `[display]` table; every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisplayConfig {
    /// Output format.
    pub format: Option<Format>,
    /// Number radix for table output.
    pub radix: Option<Radix>,
    /// Demangle Rust symbol names.
    pub demangle: Option<bool>,
}

/// Effective settings after merging flags, config file and defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Settings {
    /// Output format.
    pub format: Format,
    /// Number radix for table output.
    pub radix: Radix,
    /// Demangle Rust symbol names.
    pub demangle: bool,
}

impl Settings {
    /// Merges command-line values over the config file over the defaults.
    pub fn resolve(
        format: Option<Format>,
        radix: Option<Radix>,
        demangle: Option<bool>,
        file: &ConfigFile,
    ) -> Self {
        let display = &file.display;
        Self {
            format: format.or(display.format).unwrap_or_default(),
            radix: radix.or(display.radix).unwrap_or_default(),
            demangle: demangle.or(display.demangle).unwrap_or(false),
        }
    }
}

/// Loads the config file.
///
/// With `explicit` set, that file must exist. Otherwise [`DEFAULT_CONFIG`]
/// is read if present, and an empty config is used if not.
pub fn load(explicit: Option<&Path>) -> Result<ConfigFile> {
    let path = match explicit {
        Some(path) => path,
        None => {
            let path = Path::new(DEFAULT_CONFIG);
            if !path.exists() {
                vprintln!("no {DEFAULT_CONFIG} found, using defaults");
                return Ok(ConfigFile::default());
            }
            path
        }
    };
    vprintln!("reading config from {}", path.display());
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    parse(&text).with_context(|| format!("invalid config file {}", path.display()))
}

/// Parses config file contents.
pub fn parse(text: &str) -> Result<ConfigFile> {
    Ok(toml::from_str(text)?)
}

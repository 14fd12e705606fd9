//! CLI configuration
//!
//! Loaded from an optional TOML file; command-line flags override it.
//!
//! ```toml
//! log_filter = "dialectic_paths=debug"
//! format = "yaml"
//! pretty = true
//! ```

use std::fmt::{self, Display, Formatter};
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Output encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl OutputFormat {
    /// Accepted names, for help text and value parsing
    pub const NAMES: &'static [&'static str] = &["json", "yaml"];
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        })
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => anyhow::bail!("unknown output format '{other}'"),
        }
    }
}

/// CLI settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,
    /// Output encoding
    pub format: OutputFormat,
    /// Pretty-print JSON
    pub pretty: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_filter: "warn".to_string(),
            format: OutputFormat::Json,
            pretty: false,
        }
    }
}

impl CliConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a TOML file. Missing keys keep their defaults.
    ///
    /// # Errors
    /// Fails when the file cannot be read or is not valid TOML.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    /// With log filter
    #[inline]
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// With output format
    #[inline]
    #[must_use]
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// With pretty printing
    #[inline]
    #[must_use]
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

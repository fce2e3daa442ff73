//! Global pipeline configuration.
//!
//! Loaded from:
//! - config.toml (default configuration)
//! - config.local.toml (git-ignored local overrides)
//! - Environment variables (FLOWLOG_* prefix)
//!
//! ## Example
//!
//! ```toml
//! # config.toml
//! magic-transform = "*"
//! magic-transform-exclude = ""
//! provenance = "explain"
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! FLOWLOG_MAGIC_TRANSFORM=*
//! FLOWLOG_PROVENANCE=explore
//! ```

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Provenance mode requested for the pipeline, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProvenanceMode {
    Explain,
    Explore,
}

/// The string-keyed key/value store the core reads global configuration
/// from. Every recognised key defaults to empty-string/false when absent,
/// matching a plain `.flags` file with nothing set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GlobalConfig {
    /// Comma list of relation names (or `*`) to run the magic-set
    /// transformation over.
    #[serde(default)]
    pub magic_transform: String,

    /// Comma list of relation names to exclude from magic-set transformation
    /// even if matched by `magic_transform`.
    #[serde(default)]
    pub magic_transform_exclude: String,

    /// Comma list of relation names `InlineRelations` must never inline.
    #[serde(default)]
    pub inline_exclude: String,

    /// Provenance instrumentation mode, if requested.
    #[serde(default)]
    pub provenance: Option<ProvenanceMode>,

    /// Comma list of transformer names the driver must skip entirely.
    #[serde(default)]
    pub disable_transformers: String,

    /// Directory `IODefaults` propagates into input directives lacking an
    /// explicit `fact-dir` parameter.
    #[serde(default)]
    pub fact_dir: Option<String>,

    /// Directory `IODefaults` propagates into output/printsize directives
    /// lacking an explicit `output-dir` parameter.
    #[serde(default)]
    pub output_dir: Option<String>,

    /// Path to write the pipeline debug report to, if any.
    #[serde(default)]
    pub debug_report: Option<String>,

    /// Enables deprecated-syntax acceptance instead of rejection.
    #[serde(default)]
    pub legacy: bool,

    /// Structured-logging configuration; not part of the external
    /// key/value contract but carried alongside it the way the driver
    /// carries every other ambient setting.
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig { level: default_log_level(), format: default_log_format() }
    }
}

impl GlobalConfig {
    /// Loads configuration from default locations.
    ///
    /// Merges in order:
    /// 1. config.toml (base configuration)
    /// 2. config.local.toml (local overrides, git-ignored)
    /// 3. Environment variables (FLOWLOG_* prefix)
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("config.toml"))
            .merge(Toml::file("config.local.toml"))
            .merge(Env::prefixed("FLOWLOG_").split("__"))
            .extract()
    }

    /// Loads configuration from a specific file path.
    pub fn from_file(path: &str) -> Result<Self, figment::Error> {
        Figment::new().merge(Toml::file(path)).merge(Env::prefixed("FLOWLOG_").split("__")).extract()
    }

    fn split_list(raw: &str) -> Vec<&str> {
        raw.split(',').map(str::trim).filter(|s| !s.is_empty()).collect()
    }

    #[must_use]
    pub fn magic_transform_targets(&self) -> Vec<&str> {
        Self::split_list(&self.magic_transform)
    }

    #[must_use]
    pub fn magic_transform_excluded(&self) -> Vec<&str> {
        Self::split_list(&self.magic_transform_exclude)
    }

    #[must_use]
    pub fn inline_excluded(&self) -> Vec<&str> {
        Self::split_list(&self.inline_exclude)
    }

    #[must_use]
    pub fn disabled_transformers(&self) -> Vec<&str> {
        Self::split_list(&self.disable_transformers)
    }

    #[must_use]
    pub fn is_transformer_disabled(&self, name: &str) -> bool {
        self.disabled_transformers().iter().any(|n| *n == name)
    }

    #[must_use]
    pub fn should_magic_transform(&self, relation: &str) -> bool {
        if self.magic_transform_excluded().iter().any(|n| n == relation) {
            return false;
        }
        self.magic_transform_targets().iter().any(|n| *n == "*" || *n == relation)
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        GlobalConfig {
            magic_transform: String::new(),
            magic_transform_exclude: String::new(),
            inline_exclude: String::new(),
            provenance: None,
            disable_transformers: String::new(),
            fact_dir: None,
            output_dir: None,
            debug_report: None,
            legacy: false,
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_empty_keys() {
        let config = GlobalConfig::default();
        assert!(config.magic_transform.is_empty());
        assert!(config.provenance.is_none());
        assert!(!config.legacy);
    }

    #[test]
    fn magic_transform_wildcard_matches_every_relation() {
        let mut config = GlobalConfig::default();
        config.magic_transform = "*".to_string();
        assert!(config.should_magic_transform("edge"));
    }

    #[test]
    fn magic_transform_exclude_wins_over_wildcard() {
        let mut config = GlobalConfig::default();
        config.magic_transform = "*".to_string();
        config.magic_transform_exclude = "edge, path".to_string();
        assert!(!config.should_magic_transform("edge"));
        assert!(config.should_magic_transform("reachable"));
    }

    #[test]
    fn disabled_transformers_are_parsed_from_comma_list() {
        let mut config = GlobalConfig::default();
        config.disable_transformers = "InlineRelations, MinimiseProgram".to_string();
        assert!(config.is_transformer_disabled("InlineRelations"));
        assert!(!config.is_transformer_disabled("ResolveAliases"));
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = GlobalConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("magic-transform"));
    }
}

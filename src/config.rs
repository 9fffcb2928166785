//! Configuration loading.
//!
//! Settings are read from a TOML file with the following resolution order:
//! 1. `--config <path>` (CLI flag; must exist)
//! 2. `~/.huginn/config.toml` (user)
//! 3. `/etc/huginn/config.toml` (system)
//! 4. built-in defaults
//!
//! Environment variables then override individual fields. Their names
//! follow the log-annotation function this tool replaces, so existing
//! function configurations keep working:
//!
//! | variable                 | field                    |
//! |--------------------------|--------------------------|
//! | `TAG_OUTPUT_FIELD`       | `enrich.output_field`    |
//! | `TAG_INSERTION_PATH`     | `enrich.insertion_path`  |
//! | `TAG_TYPES`              | `enrich.tag_types`       |
//! | `INCLUDE_EMPTY_TAGS`     | `enrich.include_empty`   |
//! | `OCID_KEY_FILTER`        | `enrich.key_filter`      |
//! | `CACHE_SIZE`             | `cache.size`             |
//! | `CACHE_TTL`              | `cache.ttl_secs`         |
//! | `HUGINN_SEARCH_ENDPOINT` | `search.endpoint`        |
//!
//! [`Settings::validate`] turns the raw settings into the typed
//! configuration objects; any error there is fatal at startup.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::aggregate::Aggregator;
use crate::cache::{CacheConfig, MAX_TTL};
use crate::enrich::{DEFAULT_OUTPUT_FIELD, EnrichConfig};
use crate::extract::{DEFAULT_MAX_DEPTH, Extractor};
use crate::fetcher::{RetryConfig, SearchConfig};
use crate::types::{InsertionPath, OcidGrammar, TagCategory};
use crate::{HuginnError, Result};

pub const ENV_OUTPUT_FIELD: &str = "TAG_OUTPUT_FIELD";
pub const ENV_INSERTION_PATH: &str = "TAG_INSERTION_PATH";
pub const ENV_TAG_TYPES: &str = "TAG_TYPES";
pub const ENV_INCLUDE_EMPTY: &str = "INCLUDE_EMPTY_TAGS";
pub const ENV_KEY_FILTER: &str = "OCID_KEY_FILTER";
pub const ENV_CACHE_SIZE: &str = "CACHE_SIZE";
pub const ENV_CACHE_TTL: &str = "CACHE_TTL";
pub const ENV_SEARCH_ENDPOINT: &str = "HUGINN_SEARCH_ENDPOINT";

/// Full process configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub enrich: EnrichSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Enrichment behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct EnrichSettings {
    /// Name of the injected field (default: "metadata").
    #[serde(default = "default_output_field")]
    pub output_field: String,
    /// Dot path of the container receiving the field (default: record root).
    #[serde(default)]
    pub insertion_path: String,
    /// Tag categories to keep (default: freeform, defined, system).
    #[serde(default = "default_tag_types")]
    pub tag_types: Vec<String>,
    /// Emit selected categories even when empty (default: false).
    #[serde(default)]
    pub include_empty: bool,
    /// Only consider OCIDs stored under these keys (default: any key).
    #[serde(default)]
    pub key_filter: Option<Vec<String>>,
    /// Traversal depth limit (default: 64).
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// OCID grammar (default: permissive).
    #[serde(default)]
    pub grammar: OcidGrammar,
}

impl Default for EnrichSettings {
    fn default() -> Self {
        Self {
            output_field: default_output_field(),
            insertion_path: String::new(),
            tag_types: default_tag_types(),
            include_empty: false,
            key_filter: None,
            max_depth: default_max_depth(),
            grammar: OcidGrammar::default(),
        }
    }
}

fn default_output_field() -> String {
    DEFAULT_OUTPUT_FIELD.to_string()
}

fn default_tag_types() -> Vec<String> {
    TagCategory::ALL.iter().map(|c| c.to_string()).collect()
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

/// Tag cache sizing.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// Maximum cached identifiers (default: 512).
    #[serde(default = "default_cache_size")]
    pub size: u64,
    /// Entry lifetime in seconds (default: 28800, i.e. 8 hours).
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            size: default_cache_size(),
            ttl_secs: default_cache_ttl(),
        }
    }
}

fn default_cache_size() -> u64 {
    512
}

fn default_cache_ttl() -> u64 {
    28_800
}

/// Resource Search connection.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    /// Search endpoint base URL. Required unless tags come from a file.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Request timeout in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Extra request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: default_timeout(),
            headers: BTreeMap::new(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

impl Settings {
    /// Load settings from the standard locations, falling back to defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Parse a TOML settings file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            HuginnError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            HuginnError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(HuginnError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".huginn").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/huginn/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    /// Apply environment overrides from the process environment.
    pub fn apply_process_env(&mut self) -> Result<()> {
        self.apply_env(|name| std::env::var(name).ok())
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_OUTPUT_FIELD) {
            self.enrich.output_field = v;
        }
        if let Some(v) = lookup(ENV_INSERTION_PATH) {
            self.enrich.insertion_path = v;
        }
        if let Some(v) = lookup(ENV_TAG_TYPES) {
            self.enrich.tag_types = split_list(&v);
        }
        if let Some(v) = lookup(ENV_INCLUDE_EMPTY) {
            self.enrich.include_empty =
                matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes");
        }
        if let Some(v) = lookup(ENV_KEY_FILTER) {
            let keys = split_list(&v);
            self.enrich.key_filter = (!keys.is_empty()).then_some(keys);
        }
        if let Some(v) = lookup(ENV_CACHE_SIZE) {
            self.cache.size = parse_number(ENV_CACHE_SIZE, &v)?;
        }
        if let Some(v) = lookup(ENV_CACHE_TTL) {
            self.cache.ttl_secs = parse_number(ENV_CACHE_TTL, &v)?;
        }
        if let Some(v) = lookup(ENV_SEARCH_ENDPOINT) {
            self.search.endpoint = Some(v);
        }
        Ok(())
    }

    /// Check every setting, reporting the first problem.
    pub fn validate(&self) -> Result<()> {
        self.enrich_config()?;
        self.cache_config()?;
        Ok(())
    }

    /// Typed enrichment configuration.
    pub fn enrich_config(&self) -> Result<EnrichConfig> {
        let e = &self.enrich;
        if e.output_field.trim().is_empty() {
            return Err(HuginnError::Configuration(
                "output field must not be empty".to_string(),
            ));
        }
        let categories = e
            .tag_types
            .iter()
            .map(|t| t.parse::<TagCategory>())
            .collect::<Result<Vec<_>>>()?;

        let mut extractor = Extractor::new().max_depth(e.max_depth).grammar(e.grammar);
        if let Some(keys) = &e.key_filter {
            extractor = extractor.key_filter(keys.iter().cloned());
        }

        Ok(EnrichConfig::new()
            .output_field(e.output_field.clone())
            .insertion_path(InsertionPath::parse(&e.insertion_path)?)
            .extractor(extractor)
            .aggregator(
                Aggregator::new()
                    .categories(categories)
                    .include_empty(e.include_empty),
            ))
    }

    /// Typed cache configuration.
    pub fn cache_config(&self) -> Result<CacheConfig> {
        if self.cache.size == 0 {
            return Err(HuginnError::Configuration(
                "cache size must be positive".to_string(),
            ));
        }
        if self.cache.ttl_secs > MAX_TTL.as_secs() {
            return Err(HuginnError::Configuration(format!(
                "cache TTL must not exceed {} seconds",
                MAX_TTL.as_secs()
            )));
        }
        Ok(CacheConfig::new()
            .max_entries(self.cache.size)
            .ttl(Duration::from_secs(self.cache.ttl_secs)))
    }

    /// Search client configuration, if an endpoint is set.
    pub fn search_config(&self) -> Option<SearchConfig> {
        let endpoint = self.search.endpoint.as_deref()?.trim();
        if endpoint.is_empty() {
            return None;
        }
        let mut config =
            SearchConfig::new(endpoint).timeout(Duration::from_secs(self.search.timeout_secs));
        for (name, value) in &self.search.headers {
            config = config.header(name.clone(), value.clone());
        }
        Some(config)
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_number(name: &str, value: &str) -> Result<u64> {
    value.trim().parse().map_err(|e| {
        HuginnError::Configuration(format!("{name} must be a non-negative integer: {e}"))
    })
}

//! Engine configuration, created once and passed into every run.

use crate::error::ReportError;
use log::debug;
use quire_data::CacheBackend;
use quire_layout::{CompatibilityMode, LayoutConfig};
use quire_model::ReportDefinition;
use std::collections::HashMap;
use std::str::FromStr;

pub const COMPATIBILITY_LEVEL: &str = "quire.compatibility-level";
pub const COMPLEX_TEXT: &str = "quire.layout.complex-text";
pub const QUERY_LIMIT: &str = "quire.query.limit";
pub const CACHE_BACKEND: &str = "quire.cache.backend";
pub const CACHE_CAPACITY: &str = "quire.cache.capacity";
pub const FAST_PATH: &str = "quire.fast-path";

/// Selects how exports are produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GenerationMode {
    /// Use the streaming fast path when the report structure allows it,
    /// otherwise the full paginating pipeline. (Default)
    #[default]
    Auto,
    /// Always run the full pipeline.
    ForceFull,
    /// Always stream. Fails for reports the structure validator rejects.
    ForceStreaming,
}

impl FromStr for GenerationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "true" | "on" => Ok(GenerationMode::Auto),
            "false" | "off" | "never" => Ok(GenerationMode::ForceFull),
            "force" | "always" => Ok(GenerationMode::ForceStreaming),
            other => Err(format!("Unknown fast-path mode: '{other}'")),
        }
    }
}

/// Immutable settings for report runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Overrides the compatibility level declared by each report.
    pub compatibility: Option<CompatibilityMode>,
    pub complex_text: bool,
    /// Upper bound on master query rows, on top of each report's own limit.
    pub query_limit: Option<usize>,
    pub cache_backend: CacheBackend,
    pub cache_capacity: usize,
    pub generation_mode: GenerationMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            compatibility: None,
            complex_text: false,
            query_limit: None,
            cache_backend: CacheBackend::InMemory,
            cache_capacity: 64,
            generation_mode: GenerationMode::Auto,
        }
    }
}

impl EngineConfig {
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Reads the recognized `quire.*` keys. Unknown keys are ignored; known
    /// keys with unparseable values are errors.
    pub fn from_properties(properties: &HashMap<String, String>) -> Result<Self, ReportError> {
        let mut config = EngineConfig::default();
        for (key, value) in properties {
            let value = value.trim();
            match key.as_str() {
                COMPATIBILITY_LEVEL => {
                    config.compatibility =
                        (!value.is_empty()).then(|| CompatibilityMode::from_level(Some(value)));
                }
                COMPLEX_TEXT => config.complex_text = parse(key, value)?,
                QUERY_LIMIT => {
                    config.query_limit = if value.is_empty() { None } else { Some(parse(key, value)?) }
                }
                CACHE_BACKEND => config.cache_backend = parse(key, value)?,
                CACHE_CAPACITY => config.cache_capacity = parse(key, value)?,
                FAST_PATH => config.generation_mode = parse(key, value)?,
                _ => debug!("Ignoring unrecognized configuration key '{key}'"),
            }
        }
        Ok(config)
    }

    /// The layout settings for one report under this configuration.
    pub fn layout_for(&self, report: &ReportDefinition, flow: bool) -> LayoutConfig {
        LayoutConfig {
            compatibility: self
                .compatibility
                .unwrap_or_else(|| CompatibilityMode::from_level(report.compatibility_level.as_deref())),
            complex_text: self.complex_text,
            flow,
        }
    }

    /// The effective master query row limit for `report`.
    pub fn query_limit_for(&self, report: &ReportDefinition) -> Option<usize> {
        match (report.query_limit, self.query_limit) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, ReportError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| ReportError::Config(format!("Invalid value '{value}' for '{key}': {e}")))
}

/// A builder for [`EngineConfig`].
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn compatibility(mut self, mode: CompatibilityMode) -> Self {
        self.config.compatibility = Some(mode);
        self
    }

    pub fn complex_text(mut self, enabled: bool) -> Self {
        self.config.complex_text = enabled;
        self
    }

    pub fn query_limit(mut self, limit: usize) -> Self {
        self.config.query_limit = Some(limit);
        self
    }

    pub fn cache(mut self, backend: CacheBackend, capacity: usize) -> Self {
        self.config.cache_backend = backend;
        self.config.cache_capacity = capacity;
        self
    }

    pub fn generation_mode(mut self, mode: GenerationMode) -> Self {
        self.config.generation_mode = mode;
        self
    }

    pub fn build(self) -> EngineConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_model::builder::ReportBuilder;

    fn properties(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_reads_known_keys_and_ignores_others() {
        let config = EngineConfig::from_properties(&properties(&[
            (COMPATIBILITY_LEVEL, "3.8"),
            (COMPLEX_TEXT, "true"),
            (QUERY_LIMIT, "500"),
            (CACHE_BACKEND, "lfu"),
            (CACHE_CAPACITY, "8"),
            (FAST_PATH, "false"),
            ("org.example.unrelated", "whatever"),
        ]))
        .unwrap();
        assert_eq!(config.compatibility, Some(CompatibilityMode::Legacy38));
        assert!(config.complex_text);
        assert_eq!(config.query_limit, Some(500));
        assert_eq!(config.cache_backend, CacheBackend::Lfu);
        assert_eq!(config.cache_capacity, 8);
        assert_eq!(config.generation_mode, GenerationMode::ForceFull);
    }

    #[test]
    fn test_bad_value_for_known_key_is_an_error() {
        let err = EngineConfig::from_properties(&properties(&[(QUERY_LIMIT, "lots")])).unwrap_err();
        assert!(matches!(err, ReportError::Config(msg) if msg.contains(QUERY_LIMIT)));
    }

    #[test]
    fn test_report_level_applies_without_override() {
        let report = ReportBuilder::new("legacy").compatibility_level("3.8").query_limit(100).build();
        let config = EngineConfig::default();
        assert_eq!(config.layout_for(&report, false).compatibility, CompatibilityMode::Legacy38);
        assert_eq!(config.query_limit_for(&report), Some(100));

        let config = EngineConfig::builder()
            .compatibility(CompatibilityMode::Current)
            .query_limit(10)
            .build();
        assert_eq!(config.layout_for(&report, true).compatibility, CompatibilityMode::Current);
        assert!(config.layout_for(&report, true).flow);
        assert_eq!(config.query_limit_for(&report), Some(10));
    }
}

//! Agent configuration
//!
//! Configuration is loaded once at agent startup, validated, and handed to
//! the lifecycle manager behind an `Arc`. It is never mutated afterwards;
//! operators who change it rebuild the manager, so changes only affect
//! subsequently finalized transactions.

use crate::Result;
use serde::Deserialize;
use std::collections::HashMap;
use vahti_core::{AgentError, Destination};

/// Top-level agent configuration
///
/// Every field has a default, so an empty JSON object is a valid config.
///
/// # Example
///
/// ```
/// use vahti_agent::AgentConfig;
///
/// let config = AgentConfig::from_json(r#"{
///     "attributes": {
///         "enabled": true,
///         "destination_rules": {
///             "transaction_tracer": {"exclude": ["request.headers.*"]}
///         }
///     },
///     "send_request_uri_attribute": true
/// }"#).unwrap();
/// assert!(config.attributes.enabled);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Attribute collection and filtering settings
    pub attributes: AttributesConfig,
    /// Record the raw request URI as `request.uri`
    pub send_request_uri_attribute: bool,
    /// Apdex threshold in seconds, read by the statistics subscriber
    ///
    /// The engine only carries this value and exposes transaction duration;
    /// apdex itself is computed downstream.
    pub apdex_t: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            attributes: AttributesConfig::default(),
            send_request_uri_attribute: false,
            apdex_t: 0.5,
        }
    }
}

/// Attribute engine settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AttributesConfig {
    /// Global gate; when false every finalized view is empty
    pub enabled: bool,
    /// Per-destination include/exclude rule lists
    pub destination_rules: HashMap<Destination, DestinationRules>,
}

impl Default for AttributesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            destination_rules: HashMap::new(),
        }
    }
}

/// Include/exclude patterns for one destination
///
/// Patterns are exact key names or prefix wildcards with a trailing `*`
/// (`request.headers.*`). No include patterns means admit-all by default;
/// exclude wins over include on conflict.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DestinationRules {
    /// Keys admitted to this destination
    pub include: Vec<String>,
    /// Keys barred from this destination; takes precedence over include
    pub exclude: Vec<String>,
}

impl AgentConfig {
    /// Parse and validate a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: AgentConfig =
            serde_json::from_str(json).map_err(|e| AgentError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every filter pattern for well-formedness
    ///
    /// Surfaced to the operator at startup; request handling never sees a
    /// malformed pattern.
    pub fn validate(&self) -> Result<()> {
        for (destination, rules) in &self.attributes.destination_rules {
            for pattern in rules.include.iter().chain(rules.exclude.iter()) {
                validate_pattern(pattern).map_err(|reason| {
                    AgentError::Config(format!(
                        "bad pattern '{}' for destination '{}': {}",
                        pattern, destination, reason
                    ))
                })?;
            }
        }
        Ok(())
    }
}

/// A pattern is a non-empty key name, optionally ending in a single `*`
pub(crate) fn validate_pattern(pattern: &str) -> std::result::Result<(), &'static str> {
    if pattern.is_empty() {
        return Err("pattern is empty");
    }
    if let Some(pos) = pattern.find('*') {
        if pos != pattern.len() - 1 {
            return Err("'*' is only allowed as the final character");
        }
    }
    Ok(())
}

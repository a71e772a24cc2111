//! The filter engine - destination-scoped attribute admission
//!
//! Built once from a validated [`AgentConfig`]; patterns are compiled up
//! front so the per-request path is allocation-free string matching.
//! Filtering is a pure function: the raw snapshot is never mutated, and the
//! same snapshot and config always yield the same view.
//!
//! # Matching scheme
//!
//! A pattern is either an exact key (`request.method`) or a prefix wildcard
//! ending in `*` (`request.headers.*` matches any key starting with
//! `request.headers.`). A key is admitted to a destination iff:
//!
//! - the engine is enabled, AND
//! - the key matches some include pattern for that destination, or the
//!   destination has no include patterns (admit-all default), AND
//! - the key matches no exclude pattern for that destination.
//!
//! Exclude wins over include on any conflict, regardless of which pattern is
//! more specific.

use crate::config::{validate_pattern, AgentConfig};
use crate::Result;
use std::collections::HashMap;
use vahti_core::{AgentError, AttributeValue, Destination};

/// A compiled filter pattern
#[derive(Debug, Clone)]
enum Pattern {
    /// Matches the key exactly
    Exact(String),
    /// Matches any key with this prefix (source pattern ended in `*`)
    Prefix(String),
}

impl Pattern {
    fn compile(raw: &str) -> Result<Self> {
        validate_pattern(raw)
            .map_err(|reason| AgentError::Config(format!("bad pattern '{}': {}", raw, reason)))?;
        match raw.strip_suffix('*') {
            Some(prefix) => Ok(Pattern::Prefix(prefix.to_string())),
            None => Ok(Pattern::Exact(raw.to_string())),
        }
    }

    fn matches(&self, key: &str) -> bool {
        match self {
            Pattern::Exact(exact) => key == exact,
            Pattern::Prefix(prefix) => key.starts_with(prefix),
        }
    }
}

/// Compiled include/exclude patterns for one destination
#[derive(Debug, Clone, Default)]
struct CompiledRules {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl CompiledRules {
    fn admits(&self, key: &str) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|p| p.matches(key));
        included && !self.exclude.iter().any(|p| p.matches(key))
    }
}

/// Evaluates which attribute keys each destination is permitted to see
///
/// # Example
///
/// ```
/// use vahti_agent::{AgentConfig, Destination, FilterEngine};
/// use std::collections::HashMap;
///
/// let engine = FilterEngine::new(&AgentConfig::default()).unwrap();
/// let mut raw = HashMap::new();
/// raw.insert("request.method".to_string(), "GET".into());
///
/// let view = engine.filter(&raw, Destination::TransactionTracer);
/// assert_eq!(view.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct FilterEngine {
    enabled: bool,
    rules: HashMap<Destination, CompiledRules>,
}

impl FilterEngine {
    /// Compile the filter rules out of a configuration
    ///
    /// Re-checks what [`AgentConfig::validate`] checks, so an engine can be
    /// built from a config that skipped validation.
    pub fn new(config: &AgentConfig) -> Result<Self> {
        let mut rules = HashMap::new();
        for (&destination, raw) in &config.attributes.destination_rules {
            let compiled = CompiledRules {
                include: raw
                    .include
                    .iter()
                    .map(|p| Pattern::compile(p))
                    .collect::<Result<_>>()?,
                exclude: raw
                    .exclude
                    .iter()
                    .map(|p| Pattern::compile(p))
                    .collect::<Result<_>>()?,
            };
            rules.insert(destination, compiled);
        }
        Ok(Self {
            enabled: config.attributes.enabled,
            rules,
        })
    }

    /// Whether the global attribute gate is open
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Produce the filtered view of a raw snapshot for one destination
    ///
    /// Disabled engine yields an empty map. A destination with no configured
    /// rules admits everything in the snapshot.
    pub fn filter(
        &self,
        raw: &HashMap<String, AttributeValue>,
        destination: Destination,
    ) -> HashMap<String, AttributeValue> {
        if !self.enabled {
            return HashMap::new();
        }
        match self.rules.get(&destination) {
            None => raw.clone(),
            Some(rules) => raw
                .iter()
                .filter(|(key, _)| rules.admits(key))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        }
    }
}

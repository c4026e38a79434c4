//! # Pipeline Configuration
//!
//! Loaded from an optional YAML file, then overridden by environment
//! variables:
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `DOCKET_MIN_KEY_FACTS` | `sufficiency.min_key_facts` | 5 |
//! | `DOCKET_MIN_OUTCOME_CHARS` | `sufficiency.min_outcome_chars` | 15 |
//! | `DOCKET_MIN_EVIDENCE_ITEMS` | `sufficiency.min_evidence_items` | 1 |
//! | `DOCKET_CONTENT_TIMEOUT_SECS` | `generation.content_timeout_secs` | 120 |
//! | `DOCKET_RENDER_TIMEOUT_SECS` | `generation.render_timeout_secs` | 60 |
//! | `DOCKET_QUEUE_CAPACITY` | `queue.capacity` | 64 |
//! | `DOCKET_QUEUE_MAX_DELIVERIES` | `queue.max_deliveries` | 3 |
//! | `DOCKET_DEFAULT_JURISDICTION` | `routing.default_jurisdiction` | `england-and-wales` |
//!
//! Extra document types are only configurable from the file.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use docket_core::JurisdictionId;
use docket_routing::forum::ENGLAND_AND_WALES;
use docket_routing::SufficiencyThresholds;

use crate::registry::{DocumentDefinition, DocumentRegistry};

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config YAML: {0}")]
    Yaml(String),

    #[error("invalid value for {var}: \"{value}\"")]
    InvalidValue { var: String, value: String },

    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub content_timeout_secs: u64,
    pub render_timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            content_timeout_secs: 120,
            render_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub capacity: usize,
    /// Deliveries of one task before the case is blocked.
    pub max_deliveries: u32,
    /// Delay before the first redelivery; doubles on each subsequent one.
    pub redelivery_base_delay_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: 64,
            max_deliveries: 3,
            redelivery_base_delay_ms: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub default_jurisdiction: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            default_jurisdiction: ENGLAND_AND_WALES.to_string(),
        }
    }
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub sufficiency: SufficiencyThresholds,
    pub generation: GenerationConfig,
    pub queue: QueueConfig,
    pub routing: RoutingConfig,
    /// Document types added to (or replacing) the built-in registry.
    pub documents: Vec<DocumentDefinition>,
}

impl PipelineConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| ConfigError::Yaml(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Load the optional file, then apply process environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_overrides(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Apply overrides from `lookup` (normally the process environment).
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        override_parsed(&lookup, "DOCKET_MIN_KEY_FACTS", &mut self.sufficiency.min_key_facts)?;
        override_parsed(
            &lookup,
            "DOCKET_MIN_OUTCOME_CHARS",
            &mut self.sufficiency.min_outcome_chars,
        )?;
        override_parsed(
            &lookup,
            "DOCKET_MIN_EVIDENCE_ITEMS",
            &mut self.sufficiency.min_evidence_items,
        )?;
        override_parsed(
            &lookup,
            "DOCKET_CONTENT_TIMEOUT_SECS",
            &mut self.generation.content_timeout_secs,
        )?;
        override_parsed(
            &lookup,
            "DOCKET_RENDER_TIMEOUT_SECS",
            &mut self.generation.render_timeout_secs,
        )?;
        override_parsed(&lookup, "DOCKET_QUEUE_CAPACITY", &mut self.queue.capacity)?;
        override_parsed(
            &lookup,
            "DOCKET_QUEUE_MAX_DELIVERIES",
            &mut self.queue.max_deliveries,
        )?;
        if let Some(j) = lookup("DOCKET_DEFAULT_JURISDICTION") {
            self.routing.default_jurisdiction = j;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generation.content_timeout_secs == 0 || self.generation.render_timeout_secs == 0 {
            return Err(ConfigError::Invalid("generation timeouts must be positive".into()));
        }
        if self.queue.capacity == 0 {
            return Err(ConfigError::Invalid("queue.capacity must be positive".into()));
        }
        if self.queue.max_deliveries == 0 {
            return Err(ConfigError::Invalid("queue.max_deliveries must be at least 1".into()));
        }
        self.default_jurisdiction()?;
        for d in &self.documents {
            d.check_template()
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        Ok(())
    }

    pub fn default_jurisdiction(&self) -> Result<JurisdictionId, ConfigError> {
        JurisdictionId::new(&self.routing.default_jurisdiction).map_err(|_| {
            ConfigError::InvalidValue {
                var: "routing.default_jurisdiction".into(),
                value: self.routing.default_jurisdiction.clone(),
            }
        })
    }

    pub fn content_timeout(&self) -> Duration {
        Duration::from_secs(self.generation.content_timeout_secs)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.generation.render_timeout_secs)
    }

    /// The built-in registry extended with configured documents.
    pub fn document_registry(&self) -> Result<DocumentRegistry, ConfigError> {
        let mut registry =
            DocumentRegistry::builtin().map_err(|e| ConfigError::Invalid(e.to_string()))?;
        registry.extend(self.documents.iter().cloned());
        Ok(registry)
    }
}

fn override_parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    slot: &mut T,
) -> Result<(), ConfigError> {
    if let Some(raw) = lookup(var) {
        *slot = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            var: var.to_string(),
            value: raw.clone(),
        })?;
    }
    Ok(())
}

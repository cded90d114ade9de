//! # Scenario Manifests
//!
//! A file format for declaring scenarios as data. Each step names the
//! builder shape it wants through its `kind` tag; [`ScenarioManifest::build`]
//! routes it through the matching [`StepBuilder`] constructor, so the engine
//! still only ever sees uniform [`Step`](crate::step::Step) values.
//!
//! ```toml
//! name = "Cache miss"
//!
//! [positions]
//! api = { x = 200.0, y = 100.0 }
//!
//! [[steps]]
//! kind = "cache_check"
//! service = "api"
//! cache = "redis"
//! key = "user:42"
//! explanation = "The API looks for the user in Redis first"
//! ```

use crate::dsl::{LogLevel, Position, StaticPositions, StepBuilder, create_scenario};
use crate::error::{ConfigError, DefinitionError};
use crate::scenario::Scenario;
use crate::step::{Metadata, Step};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioManifest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Suggested playback speed; callers may override.
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub positions: HashMap<String, Position>,
    pub steps: Vec<ManifestStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestStep {
    pub explanation: String,
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(flatten)]
    pub kind: StepKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepKind {
    Request { from: String, to: String, label: String },
    Response { from: String, to: String, label: String },
    CacheCheck { service: String, cache: String, key: String },
    CacheHit { cache: String, service: String, key: String },
    CacheMiss { cache: String, service: String, key: String },
    PublishEvent { publisher: String, broker: String, event: String },
    Cleanup,
    Note {
        #[serde(default)]
        message: Option<String>,
    },
}

/// Supported on-disk formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Json,
    Toml,
}

impl ManifestFormat {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            other => Err(ConfigError::UnsupportedFormat(other.unwrap_or("").to_string())),
        }
    }
}

impl ScenarioManifest {
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = read(path)?;
        match ManifestFormat::from_path(path)? {
            ManifestFormat::Json => Self::from_json_str(&content),
            ManifestFormat::Toml => Self::from_toml_str(&content),
        }
    }

    /// Read a manifest file as an untyped document, for
    /// [`validate_definition`](crate::validate::validate_definition).
    pub fn load_document(path: impl AsRef<Path>) -> Result<serde_json::Value, ConfigError> {
        let path = path.as_ref();
        let content = read(path)?;
        match ManifestFormat::from_path(path)? {
            ManifestFormat::Json => Ok(serde_json::from_str(&content)?),
            ManifestFormat::Toml => {
                let value: toml::Value = toml::from_str(&content)?;
                Ok(serde_json::to_value(value)?)
            }
        }
    }

    pub fn static_positions(&self) -> StaticPositions {
        StaticPositions::from(self.positions.clone())
    }

    /// Build every step through `builder` and wrap them in a scenario.
    pub fn build(&self, builder: &StepBuilder) -> Result<Scenario, DefinitionError> {
        let steps = self.steps.iter().map(|entry| entry.build(builder)).collect();
        create_scenario(&self.name, self.description.as_deref(), steps, None)
    }
}

impl ManifestStep {
    pub fn build(&self, builder: &StepBuilder) -> Step {
        let explanation = self.explanation.as_str();
        let mut step = match &self.kind {
            StepKind::Request { from, to, label } => builder.request_step(from, to, label, explanation),
            StepKind::Response { from, to, label } => builder.response_step(from, to, label, explanation),
            StepKind::CacheCheck { service, cache, key } => {
                builder.cache_check_step(service, cache, key, explanation)
            }
            StepKind::CacheHit { cache, service, key } => builder.cache_hit_step(cache, service, key, explanation),
            StepKind::CacheMiss { cache, service, key } => {
                builder.cache_miss_step(cache, service, key, explanation)
            }
            StepKind::PublishEvent { publisher, broker, event } => {
                builder.publish_event_step(publisher, broker, event, explanation)
            }
            StepKind::Cleanup => builder.cleanup_step(explanation),
            StepKind::Note { message } => {
                builder.note_step(explanation, LogLevel::Info, message.as_deref().unwrap_or(explanation))
            }
        };

        if let Some(duration) = self.duration {
            step.duration_ms = Some(duration);
        }
        step.metadata.extend(self.metadata.clone());
        step
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// A scenario definition that cannot produce a value.
///
/// Most definition problems are warnings (see `validate`); only these stop
/// construction.
#[derive(Error, Debug)]
pub enum DefinitionError {
    #[error("scenario name is required")]
    MissingName,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("speed multiplier must be a positive finite number, got {0}")]
    InvalidSpeed(f64),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("unsupported file format: {0} (expected .json or .toml)")]
    UnsupportedFormat(String),
}

/// What the engine reports after catching a failed step action.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum StepFailure {
    #[error("step action failed: {0}")]
    Failed(String),
    #[error("step action panicked: {0}")]
    Panicked(String),
}

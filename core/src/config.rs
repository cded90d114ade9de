//! Engine configuration.
//!
//! Loaded from TOML, with `WALKTHROUGH_SPEED` overriding the file. Invalid
//! environment values are logged and ignored; an invalid speed in code or in
//! a file is an error.

use crate::error::ConfigError;
use crate::step::DEFAULT_STEP_DURATION_MS;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const SPEED_ENV: &str = "WALKTHROUGH_SPEED";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Divides every auto-play wait. Must be positive.
    pub speed_multiplier: f64,
    /// Auto-play wait for steps that do not set their own duration.
    pub default_step_duration_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            speed_multiplier: 1.0,
            default_step_duration_ms: DEFAULT_STEP_DURATION_MS,
        }
    }
}

impl EngineConfig {
    pub fn with_speed(mut self, speed_multiplier: f64) -> Self {
        self.speed_multiplier = speed_multiplier;
        self
    }

    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply `WALKTHROUGH_SPEED` if it is set and valid.
    pub fn with_env_overrides(self) -> Self {
        match std::env::var(SPEED_ENV) {
            Ok(raw) => self.with_speed_override(&raw),
            Err(_) => self,
        }
    }

    fn with_speed_override(mut self, raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(speed) if validate_speed(speed).is_ok() => {
                tracing::debug!(speed, "Speed multiplier overridden from {}", SPEED_ENV);
                self.speed_multiplier = speed;
            }
            _ => tracing::warn!("Ignoring invalid {}={:?}", SPEED_ENV, raw),
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_speed(self.speed_multiplier)
    }
}

pub fn validate_speed(speed_multiplier: f64) -> Result<(), ConfigError> {
    if speed_multiplier.is_finite() && speed_multiplier > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidSpeed(speed_multiplier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.speed_multiplier, 1.0);
        assert_eq!(config.default_step_duration_ms, 1500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str("speed_multiplier = 2.5").unwrap();
        assert_eq!(config.speed_multiplier, 2.5);
        assert_eq!(config.default_step_duration_ms, 1500);
    }

    #[test]
    fn test_invalid_speed_rejected() {
        let err = EngineConfig::from_toml_str("speed_multiplier = 0.0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSpeed(s) if s == 0.0));
        assert!(validate_speed(f64::NAN).is_err());
        assert!(validate_speed(-2.0).is_err());
    }

    #[test]
    fn test_speed_override_ignores_garbage() {
        let config = EngineConfig::default().with_speed_override("fast");
        assert_eq!(config.speed_multiplier, 1.0);

        let config = EngineConfig::default().with_speed_override("-3");
        assert_eq!(config.speed_multiplier, 1.0);

        let config = EngineConfig::default().with_speed_override(" 4 ");
        assert_eq!(config.speed_multiplier, 4.0);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_step_duration_ms = 800").unwrap();

        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.default_step_duration_ms, 800);

        let missing = EngineConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}

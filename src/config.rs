//! Engine configuration parsed from host-supplied JSON.
//!
//! The host owns where settings live; this crate only reads what it is
//! handed. Missing fields take their defaults, then the whole config is
//! validated once so the rest of the crate can trust it.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::consts::{DEFAULT_GUIDE_MAX_POINTS, DEFAULT_SIMPLIFY_TOLERANCE, DEFAULT_SNAP_SENSITIVITY};
use crate::error::ErrorCode;

pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Parse(_) => "E_CONFIG_PARSE",
            Self::Invalid { .. } => "E_CONFIG_INVALID",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Fraction of a cell within which guides and snapping engage.
    pub snap_sensitivity: f64,
    /// Fog shapes with more vertices are ignored by the guide system. 0 disables the cap.
    pub guide_max_points: usize,
    /// Tolerance for brush stroke simplification, in normalized map units.
    pub simplify_tolerance: f64,
    /// Only visible fog takes part in the player view merge.
    pub merge_ignore_hidden: bool,
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            snap_sensitivity: DEFAULT_SNAP_SENSITIVITY,
            guide_max_points: DEFAULT_GUIDE_MAX_POINTS,
            simplify_tolerance: DEFAULT_SIMPLIFY_TOLERANCE,
            merge_ignore_hidden: true,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config object.
    ///
    /// # Errors
    ///
    /// `Parse` for malformed JSON or mistyped fields, `Invalid` for values
    /// out of range.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// `Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.snap_sensitivity.is_finite() || self.snap_sensitivity <= 0.0 || self.snap_sensitivity > 1.0 {
            return Err(ConfigError::Invalid {
                field: "snapSensitivity",
                reason: format!("{} is outside (0, 1]", self.snap_sensitivity),
            });
        }
        if !self.simplify_tolerance.is_finite() || self.simplify_tolerance < 0.0 {
            return Err(ConfigError::Invalid {
                field: "simplifyTolerance",
                reason: format!("{} must be finite and non-negative", self.simplify_tolerance),
            });
        }
        self.level().map(|_| ())
    }

    /// The configured log level.
    ///
    /// # Errors
    ///
    /// `Invalid` for anything other than `trace`, `debug`, `info`, `warn` or `error`.
    pub fn level(&self) -> Result<Level, ConfigError> {
        parse_log_level(&self.log_level)
    }
}

fn parse_log_level(raw: &str) -> Result<Level, ConfigError> {
    match raw {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(ConfigError::Invalid {
            field: "logLevel",
            reason: format!("unknown level '{other}' (expected trace, debug, info, warn or error)"),
        }),
    }
}

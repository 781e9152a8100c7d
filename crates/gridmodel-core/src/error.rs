//! Crate-wide error type.
//!
//! Record construction itself only ever fails with a [`ValidationError`];
//! [`ModelError`] exists for the surrounding plumbing (configuration files,
//! JSON text, tracing setup) and lets callers funnel everything through a
//! single `?`.
//!
//! # Example
//!
//! ```
//! use gridmodel_core::{Area, ModelResult, Record};
//!
//! fn area_from_text(text: &str) -> ModelResult<Area> {
//!     let value: serde_json::Value = serde_json::from_str(text)?;
//!     Ok(Area::from_value(value)?)
//! }
//!
//! assert!(area_from_text(r#"{"name": "North"}"#).is_ok());
//! assert!(area_from_text(r#"{"name": "North", "peak_active_power": -1}"#).is_err());
//! ```

use thiserror::Error;

use crate::units::UnitError;
use crate::validation::ValidationError;

/// Unified error type for gridmodel operations.
#[derive(Error, Debug)]
pub enum ModelError {
    /// A record failed field-level validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A quantity could not be parsed or converted
    #[error("Unit error: {0}")]
    Unit(#[from] UnitError),

    /// I/O errors (configuration files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using ModelError.
pub type ModelResult<T> = Result<T, ModelError>;

impl From<anyhow::Error> for ModelError {
    fn from(err: anyhow::Error) -> Self {
        ModelError::Other(err.to_string())
    }
}

impl From<String> for ModelError {
    fn from(s: String) -> Self {
        ModelError::Other(s)
    }
}

impl From<&str> for ModelError {
    fn from(s: &str) -> Self {
        ModelError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Parse(err.to_string())
    }
}

impl From<toml::de::Error> for ModelError {
    fn from(err: toml::de::Error) -> Self {
        ModelError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ModelError {
    fn from(err: toml::ser::Error) -> Self {
        ModelError::Config(err.to_string())
    }
}

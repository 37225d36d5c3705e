// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use thiserror::Error;

/// Errors that can occur while validating a loaded pipeline configuration
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A high-water mark is negative, NaN or infinite
    InvalidHighWaterMark {
        /// Which side of the pipeline the strategy belongs to
        side: &'static str,
        /// The rejected value
        value: f64,
    },
    /// Two transforms share the same ID
    DuplicateTransformId {
        /// The duplicate transform ID
        transform_id: String,
    },
    /// A transform names a transformer the factory does not know
    UnknownTransformer {
        /// The transform that references the transformer
        transform_id: String,
        /// The unknown transformer name
        transformer: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidHighWaterMark { side, value } => {
                write!(
                    f,
                    "Invalid high_water_mark for {} strategy: {} (must be finite and non-negative)",
                    side, value
                )
            }
            ValidationError::DuplicateTransformId { transform_id } => {
                write!(f, "Duplicate transform ID: '{}'", transform_id)
            }
            ValidationError::UnknownTransformer {
                transform_id,
                transformer,
            } => {
                write!(
                    f,
                    "Transform '{}' references unknown transformer '{}'",
                    transform_id, transformer
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors raised while loading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("configuration validation failed: {}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

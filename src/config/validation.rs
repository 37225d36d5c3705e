// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Configuration validation for pipeline correctness.
//!
//! The checks run independently and their errors are accumulated, so a user
//! sees every problem in a configuration at once rather than fixing them one
//! by one.
//!
//! 1. **Strategy Validation**: High-water marks are finite and non-negative
//! 2. **Uniqueness Validation**: Transform IDs are unique
//! 3. **Reference Validation**: Every transform names a known transformer
//!
//! # Example
//!
//! ```rust
//! use streamwood::config::{validate_config, Config, TransformConfig};
//! use std::collections::HashMap;
//!
//! let config = Config {
//!     transforms: vec![TransformConfig {
//!         id: "upper".to_string(),
//!         transformer: "change_text_case_upper".to_string(),
//!         options: HashMap::new(),
//!     }],
//!     ..Config::default()
//! };
//!
//! assert!(validate_config(&config).is_ok());
//! ```

use std::collections::HashSet;

use crate::config::{Config, StrategyConfig};
use crate::errors::ValidationError;
use crate::transformers::TransformerFactory;

/// Validates a configuration, returning every problem found.
pub fn validate_config(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_strategy("readable", &config.readable, &mut errors);
    validate_strategy("writable", &config.writable, &mut errors);
    validate_unique_transform_ids(config, &mut errors);
    validate_transformer_references(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_strategy(
    side: &'static str,
    strategy: &StrategyConfig,
    errors: &mut Vec<ValidationError>,
) {
    if let Some(value) = strategy.high_water_mark {
        if !value.is_finite() || value < 0.0 {
            errors.push(ValidationError::InvalidHighWaterMark { side, value });
        }
    }
}

fn validate_unique_transform_ids(config: &Config, errors: &mut Vec<ValidationError>) {
    let mut seen_ids = HashSet::new();
    for transform in &config.transforms {
        if !seen_ids.insert(&transform.id) {
            errors.push(ValidationError::DuplicateTransformId {
                transform_id: transform.id.clone(),
            });
        }
    }
}

fn validate_transformer_references(config: &Config, errors: &mut Vec<ValidationError>) {
    for transform in &config.transforms {
        if !TransformerFactory::is_transformer_available(&transform.transformer) {
            errors.push(ValidationError::UnknownTransformer {
                transform_id: transform.id.clone(),
                transformer: transform.transformer.clone(),
            });
        }
    }
}

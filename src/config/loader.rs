// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{DEFAULT_BYTE_LENGTH_HIGH_WATER_MARK, DEFAULT_COUNT_HIGH_WATER_MARK};
use crate::errors::ConfigError;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Main configuration structure for a text pipeline.
///
/// Describes the queuing strategy at each end of the pipeline, how the pipe
/// propagates shutdown, and the ordered list of transforms chunks flow
/// through. It is typically loaded from a YAML configuration file.
///
/// # Fields
/// * `readable` - Strategy for the source stream (optional, defaults to count)
/// * `writable` - Strategy for the destination stream (optional, defaults to count)
/// * `pipe` - Shutdown propagation flags (optional, all propagate by default)
/// * `transforms` - Transforms applied in order, first to last
///
/// # Example
/// ```yaml
/// readable:
///   kind: count
///   high_water_mark: 4
/// writable:
///   kind: byte_length
///   high_water_mark: 64
/// pipe:
///   prevent_close: false
/// transforms:
///   - id: upper
///     transformer: change_text_case_upper
///   - id: wrap
///     transformer: prefix_suffix_adder
///     options: { prefix: "<", suffix: ">" }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub readable: StrategyConfig,
    #[serde(default)]
    pub writable: StrategyConfig,
    #[serde(default)]
    pub pipe: PipeConfig,
    #[serde(default)]
    pub transforms: Vec<TransformConfig>,
}

/// How chunk sizes are measured against the high-water mark.
///
/// # Variants
/// * `Count` - Every chunk has size 1
/// * `ByteLength` - A chunk's size is its length in bytes
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    Count,
    ByteLength,
}

impl StrategyKind {
    /// High-water mark used when the configuration leaves it out.
    pub fn default_high_water_mark(&self) -> f64 {
        match self {
            StrategyKind::Count => DEFAULT_COUNT_HIGH_WATER_MARK,
            StrategyKind::ByteLength => DEFAULT_BYTE_LENGTH_HIGH_WATER_MARK,
        }
    }
}

/// Queuing strategy for one end of the pipeline.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct StrategyConfig {
    #[serde(default)]
    pub kind: StrategyKind,
    pub high_water_mark: Option<f64>,
}

impl StrategyConfig {
    /// The configured high-water mark, or the default for this kind.
    pub fn high_water_mark_or_default(&self) -> f64 {
        self.high_water_mark
            .unwrap_or_else(|| self.kind.default_high_water_mark())
    }
}

/// Shutdown propagation between the ends of a pipe.
///
/// Every flag defaults to `false`, meaning the event propagates.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct PipeConfig {
    #[serde(default)]
    pub prevent_close: bool,
    #[serde(default)]
    pub prevent_abort: bool,
    #[serde(default)]
    pub prevent_cancel: bool,
}

/// Configuration for a single transform in the pipeline.
///
/// # Fields
/// * `id` - Unique identifier for this transform
/// * `transformer` - Built-in transformer name (see `TransformerFactory`)
/// * `options` - Transformer-specific options
///
/// # Example
/// ```yaml
/// id: "wrap"
/// transformer: "prefix_suffix_adder"
/// options:
///   prefix: "["
///   suffix: "]"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct TransformConfig {
    pub id: String,
    pub transformer: String,
    #[serde(default)]
    pub options: HashMap<String, serde_yaml::Value>, // transformer-specific options
}

impl TransformConfig {
    /// A string option, if present and a string.
    pub fn string_option(&self, key: &str) -> Option<String> {
        self.options
            .get(key)
            .and_then(|value| value.as_str())
            .map(str::to_string)
    }
}

/// Load a config from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Load and validate a config from a YAML file
///
/// All validation failures are reported together.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let cfg = load_config(path)?;
    crate::config::validate_config(&cfg).map_err(ConfigError::Validation)?;
    Ok(cfg)
}

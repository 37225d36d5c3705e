// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::sync::Arc;

use crate::config::{StrategyConfig, StrategyKind};
use crate::errors::StreamError;

/// Computes the size of one chunk for backpressure accounting.
pub type SizeAlgorithm<T> = Arc<dyn Fn(&T) -> Result<f64, StreamError> + Send + Sync>;

/// Flow-control policy for a stream: a high-water mark plus a chunk-size function.
///
/// A negative or NaN high-water mark is treated as zero. Infinity is allowed
/// and disables backpressure entirely.
pub struct QueuingStrategy<T> {
    high_water_mark: f64,
    size: SizeAlgorithm<T>,
}

impl<T> Clone for QueuingStrategy<T> {
    fn clone(&self) -> Self {
        Self {
            high_water_mark: self.high_water_mark,
            size: Arc::clone(&self.size),
        }
    }
}

impl<T> fmt::Debug for QueuingStrategy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuingStrategy")
            .field("high_water_mark", &self.high_water_mark)
            .finish_non_exhaustive()
    }
}

fn sanitize(high_water_mark: f64) -> f64 {
    if high_water_mark.is_nan() || high_water_mark < 0.0 {
        0.0
    } else {
        high_water_mark
    }
}

impl<T: 'static> QueuingStrategy<T> {
    pub fn new<F>(high_water_mark: f64, size: F) -> Self
    where
        F: Fn(&T) -> f64 + Send + Sync + 'static,
    {
        Self {
            high_water_mark: sanitize(high_water_mark),
            size: Arc::new(move |chunk| Ok(size(chunk))),
        }
    }

    /// Strategy whose size function may fail; a failure errors the owning stream.
    pub fn with_fallible_size<F>(high_water_mark: f64, size: F) -> Self
    where
        F: Fn(&T) -> Result<f64, StreamError> + Send + Sync + 'static,
    {
        Self {
            high_water_mark: sanitize(high_water_mark),
            size: Arc::new(size),
        }
    }

    /// Every chunk counts as one.
    pub fn count(high_water_mark: f64) -> Self {
        Self::new(high_water_mark, |_| 1.0)
    }

    pub fn high_water_mark(&self) -> f64 {
        self.high_water_mark
    }

    /// Size of `chunk`. Failures are reported as [`StreamError::SizeFunction`].
    pub fn size_of(&self, chunk: &T) -> Result<f64, StreamError> {
        match (self.size)(chunk) {
            Ok(size) => Ok(size),
            Err(StreamError::SizeFunction(message)) => Err(StreamError::SizeFunction(message)),
            Err(other) => Err(StreamError::SizeFunction(other.to_string())),
        }
    }
}

impl<T: AsRef<[u8]> + 'static> QueuingStrategy<T> {
    /// Each chunk counts as its length in bytes.
    pub fn byte_length(high_water_mark: f64) -> Self {
        Self::new(high_water_mark, |chunk: &T| chunk.as_ref().len() as f64)
    }

    /// Build a strategy from its YAML description, falling back to `default_hwm`
    /// when no high-water mark is configured.
    pub fn from_config(config: &StrategyConfig, default_hwm: f64) -> Self {
        let high_water_mark = config.high_water_mark.unwrap_or(default_hwm);
        match config.kind {
            StrategyKind::Count => Self::count(high_water_mark),
            StrategyKind::ByteLength => Self::byte_length(high_water_mark),
        }
    }
}

impl<T: 'static> Default for QueuingStrategy<T> {
    fn default() -> Self {
        Self::count(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_strategy_sizes_every_chunk_as_one() {
        let strategy = QueuingStrategy::<String>::count(3.0);
        assert_eq!(strategy.high_water_mark(), 3.0);
        assert_eq!(strategy.size_of(&"anything".to_string()).unwrap(), 1.0);
    }

    #[test]
    fn test_byte_length_strategy_uses_byte_count() {
        let strategy = QueuingStrategy::<Vec<u8>>::byte_length(16.0);
        assert_eq!(strategy.size_of(&vec![0u8; 5]).unwrap(), 5.0);
    }

    #[test]
    fn test_invalid_high_water_marks_are_treated_as_zero() {
        assert_eq!(QueuingStrategy::<u8>::count(-4.0).high_water_mark(), 0.0);
        assert_eq!(QueuingStrategy::<u8>::count(f64::NAN).high_water_mark(), 0.0);
        assert!(QueuingStrategy::<u8>::count(f64::INFINITY)
            .high_water_mark()
            .is_infinite());
    }

    #[test]
    fn test_fallible_size_failures_become_size_function_errors() {
        let strategy =
            QueuingStrategy::<u32>::with_fallible_size(1.0, |_| Err(StreamError::source("boom")));
        assert_eq!(
            strategy.size_of(&7).unwrap_err(),
            StreamError::SizeFunction("boom".to_string())
        );
    }

    #[test]
    fn test_from_config_respects_kind_and_default() {
        let config = StrategyConfig {
            kind: StrategyKind::ByteLength,
            high_water_mark: None,
        };
        let strategy = QueuingStrategy::<String>::from_config(&config, 8.0);
        assert_eq!(strategy.high_water_mark(), 8.0);
        assert_eq!(strategy.size_of(&"abc".to_string()).unwrap(), 3.0);
    }

    #[test]
    fn test_default_is_count_of_one() {
        let strategy = QueuingStrategy::<()>::default();
        assert_eq!(strategy.high_water_mark(), 1.0);
        assert_eq!(strategy.size_of(&()).unwrap(), 1.0);
    }
}

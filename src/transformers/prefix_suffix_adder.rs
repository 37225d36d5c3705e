// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::engine::transform::TransformStreamDefaultController;
use crate::errors::StreamError;
use crate::traits::Transformer;

/// Configuration for the Prefix/Suffix Adder transformer
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct PrefixSuffixConfig {
    pub prefix: Option<String>,
    pub suffix: Option<String>,
}

/// Prefix/Suffix Adder transformer - wraps each chunk in a prefix and/or suffix
pub struct PrefixSuffixAdderTransformer {
    config: PrefixSuffixConfig,
}

impl PrefixSuffixAdderTransformer {
    pub fn new(config: PrefixSuffixConfig) -> Self {
        Self { config }
    }

    pub fn with_prefix(prefix: String) -> Self {
        Self::new(PrefixSuffixConfig {
            prefix: Some(prefix),
            suffix: None,
        })
    }

    pub fn with_suffix(suffix: String) -> Self {
        Self::new(PrefixSuffixConfig {
            prefix: None,
            suffix: Some(suffix),
        })
    }

    pub fn with_prefix_and_suffix(prefix: String, suffix: String) -> Self {
        Self::new(PrefixSuffixConfig {
            prefix: Some(prefix),
            suffix: Some(suffix),
        })
    }

    fn wrap(&self, input: &str) -> String {
        let mut result = String::new();
        if let Some(prefix) = &self.config.prefix {
            result.push_str(prefix);
        }
        result.push_str(input);
        if let Some(suffix) = &self.config.suffix {
            result.push_str(suffix);
        }
        result
    }
}

#[async_trait]
impl Transformer<String, String> for PrefixSuffixAdderTransformer {
    async fn transform(
        &self,
        chunk: String,
        controller: &TransformStreamDefaultController<String>,
    ) -> Result<(), StreamError> {
        controller.enqueue(self.wrap(&chunk))
    }

    fn name(&self) -> &'static str {
        "prefix_suffix_adder"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::stub::run_transformer;

    #[test]
    fn test_partial_configs() {
        assert_eq!(PrefixSuffixAdderTransformer::with_prefix(">> ".into()).wrap("x"), ">> x");
        assert_eq!(PrefixSuffixAdderTransformer::with_suffix("!".into()).wrap("x"), "x!");
        assert_eq!(PrefixSuffixAdderTransformer::new(PrefixSuffixConfig::default()).wrap("x"), "x");
    }

    #[tokio::test]
    async fn test_wraps_every_chunk() {
        let transformer =
            PrefixSuffixAdderTransformer::with_prefix_and_suffix("<".into(), ">".into());
        let output = run_transformer(transformer, &["a", "b"]).await.unwrap();
        assert_eq!(output, vec!["<a>", "<b>"]);
    }
}

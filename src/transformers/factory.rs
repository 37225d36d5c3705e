// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use super::*;
use crate::config::TransformConfig;
use crate::engine::strategy::QueuingStrategy;
use crate::engine::transform::TransformStream;
use crate::traits::Transformer;

/// Factory for creating built-in text transformers by name
pub struct TransformerFactory;

impl TransformerFactory {
    /// Create a transformer instance from configuration
    ///
    /// The `transformer` field in the config determines which transformer to create:
    /// - "change_text_case_upper" -> ChangeTextCaseTransformer (uppercase)
    /// - "change_text_case_lower" -> ChangeTextCaseTransformer (lowercase)
    /// - "change_text_case_proper" -> ChangeTextCaseTransformer (proper case)
    /// - "change_text_case_title" -> ChangeTextCaseTransformer (title case)
    /// - "reverse_text" -> ReverseTextTransformer
    /// - "prefix_suffix_adder" -> PrefixSuffixAdderTransformer (`prefix` / `suffix` options)
    /// - "split_words" -> SplitWordsTransformer
    /// - "token_counter" -> TokenCounterTransformer
    pub fn create_transformer(
        config: &TransformConfig,
    ) -> Result<Arc<dyn Transformer<String, String>>, String> {
        match config.transformer.as_str() {
            "change_text_case_upper" => Ok(Arc::new(ChangeTextCaseTransformer::upper())),
            "change_text_case_lower" => Ok(Arc::new(ChangeTextCaseTransformer::lower())),
            "change_text_case_proper" => Ok(Arc::new(ChangeTextCaseTransformer::proper())),
            "change_text_case_title" => Ok(Arc::new(ChangeTextCaseTransformer::title())),

            "reverse_text" => Ok(Arc::new(ReverseTextTransformer::new())),
            "split_words" => Ok(Arc::new(SplitWordsTransformer::new())),
            "token_counter" => Ok(Arc::new(TokenCounterTransformer::new())),

            "prefix_suffix_adder" => {
                let prefix = config.string_option("prefix");
                let suffix = config.string_option("suffix");
                // Brackets when neither is configured
                let transformer = if prefix.is_none() && suffix.is_none() {
                    PrefixSuffixAdderTransformer::with_prefix_and_suffix(
                        "[".to_string(),
                        "]".to_string(),
                    )
                } else {
                    PrefixSuffixAdderTransformer::new(PrefixSuffixConfig { prefix, suffix })
                };
                Ok(Arc::new(transformer))
            }

            other => Err(format!(
                "Unknown transformer '{}' for transform '{}'",
                other, config.id
            )),
        }
    }

    /// Create a transform stream around the configured transformer, with the
    /// default strategies (one chunk on the writable side, none on the readable side).
    pub fn create_transform_stream(
        config: &TransformConfig,
    ) -> Result<TransformStream<String, String>, String> {
        let transformer = Self::create_transformer(config)?;
        Ok(TransformStream::from_transformer(
            transformer,
            QueuingStrategy::count(1.0),
            QueuingStrategy::count(0.0),
        ))
    }

    /// List all available transformer names
    pub fn list_available_transformers() -> Vec<&'static str> {
        vec![
            "change_text_case_upper",
            "change_text_case_lower",
            "change_text_case_proper",
            "change_text_case_title",
            "reverse_text",
            "prefix_suffix_adder",
            "split_words",
            "token_counter",
        ]
    }

    /// Check if a transformer is available
    pub fn is_transformer_available(name: &str) -> bool {
        Self::list_available_transformers().contains(&name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::readable::ReadResult;
    use std::collections::HashMap;

    fn create_test_config(id: &str, transformer: &str) -> TransformConfig {
        TransformConfig {
            id: id.to_string(),
            transformer: transformer.to_string(),
            options: HashMap::new(),
        }
    }

    async fn run_one(transform: &TransformStream<String, String>, input: &str) -> String {
        let writer = transform.writable().get_writer().unwrap();
        let reader = transform.readable().get_reader().unwrap();
        let _ = writer.write(input.to_string());
        match reader.read().await.unwrap() {
            ReadResult::Chunk(chunk) => chunk,
            ReadResult::Done => panic!("Expected a chunk"),
        }
    }

    #[tokio::test]
    async fn test_create_change_text_case_transformers() {
        let test_cases = vec![
            ("change_text_case_upper", "hello", "HELLO"),
            ("change_text_case_lower", "HELLO", "hello"),
            ("change_text_case_proper", "hello world", "Hello World"),
            ("change_text_case_title", "the quick brown fox", "The Quick Brown Fox"),
        ];

        for (name, input, expected) in test_cases {
            let config = create_test_config("test", name);
            let transform = TransformerFactory::create_transform_stream(&config)
                .unwrap_or_else(|e| panic!("Failed to create transformer {}: {}", name, e));
            assert_eq!(
                run_one(&transform, input).await,
                expected,
                "Failed for transformer: {}",
                name
            );
        }
    }

    #[tokio::test]
    async fn test_prefix_suffix_options() {
        let mut config = create_test_config("wrap", "prefix_suffix_adder");
        config
            .options
            .insert("prefix".to_string(), serde_yaml::Value::String("<".to_string()));
        let transform = TransformerFactory::create_transform_stream(&config).unwrap();
        assert_eq!(run_one(&transform, "x").await, "<x");

        let default_config = create_test_config("wrap", "prefix_suffix_adder");
        let transform = TransformerFactory::create_transform_stream(&default_config).unwrap();
        assert_eq!(run_one(&transform, "x").await, "[x]");
    }

    #[test]
    fn test_create_transformer_unknown_name() {
        let config = create_test_config("loud", "shout");
        let error_msg = TransformerFactory::create_transformer(&config).err().unwrap();
        assert!(error_msg.contains("Unknown transformer 'shout'"));
    }

    #[test]
    fn test_every_listed_transformer_can_be_created() {
        for name in TransformerFactory::list_available_transformers() {
            let transformer =
                TransformerFactory::create_transformer(&create_test_config("t", name)).unwrap();
            assert_eq!(transformer.name(), name);
        }
    }

    #[test]
    fn test_is_transformer_available() {
        assert!(TransformerFactory::is_transformer_available("split_words"));
        assert!(TransformerFactory::is_transformer_available("reverse_text"));
        assert!(!TransformerFactory::is_transformer_available("nonexistent_transformer"));
    }
}

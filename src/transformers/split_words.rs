// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::engine::transform::TransformStreamDefaultController;
use crate::errors::StreamError;
use crate::traits::Transformer;

/// Split Words transformer - emits one chunk per whitespace-separated word.
///
/// A chunk with no words emits nothing.
pub struct SplitWordsTransformer;

impl SplitWordsTransformer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SplitWordsTransformer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transformer<String, String> for SplitWordsTransformer {
    async fn transform(
        &self,
        chunk: String,
        controller: &TransformStreamDefaultController<String>,
    ) -> Result<(), StreamError> {
        for word in chunk.split_whitespace() {
            controller.enqueue(word.to_string())?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "split_words"
    }
}

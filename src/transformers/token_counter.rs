// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;

use crate::engine::transform::TransformStreamDefaultController;
use crate::errors::StreamError;
use crate::traits::Transformer;

/// Token Counter transformer - counts characters, words and lines across every
/// chunk and emits a single JSON summary when the stream closes.
pub struct TokenCounterTransformer {
    counts: Mutex<TokenCountResult>,
}

impl TokenCounterTransformer {
    pub fn new() -> Self {
        Self {
            counts: Mutex::new(TokenCountResult::default()),
        }
    }
}

impl Default for TokenCounterTransformer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default, Clone, Serialize)]
struct TokenCountResult {
    char_count: usize,
    word_count: usize,
    line_count: usize,
    chunk_count: usize,
}

#[async_trait]
impl Transformer<String, String> for TokenCounterTransformer {
    async fn transform(
        &self,
        chunk: String,
        _controller: &TransformStreamDefaultController<String>,
    ) -> Result<(), StreamError> {
        let mut counts = self.counts.lock();
        counts.char_count += chunk.chars().count();
        counts.word_count += chunk.split_whitespace().count();
        counts.line_count += chunk.lines().count();
        counts.chunk_count += 1;
        Ok(())
    }

    async fn flush(
        &self,
        controller: &TransformStreamDefaultController<String>,
    ) -> Result<(), StreamError> {
        let counts = self.counts.lock().clone();
        let json = serde_json::to_string(&counts)
            .map_err(|e| StreamError::transform(format!("Failed to serialize result: {}", e)))?;
        controller.enqueue(json)
    }

    fn name(&self) -> &'static str {
        "token_counter"
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::engine::transform::TransformStreamDefaultController;
use crate::errors::StreamError;
use crate::traits::Transformer;

/// Reverse Text transformer - reverses each chunk by character
pub struct ReverseTextTransformer;

impl ReverseTextTransformer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ReverseTextTransformer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transformer<String, String> for ReverseTextTransformer {
    async fn transform(
        &self,
        chunk: String,
        controller: &TransformStreamDefaultController<String>,
    ) -> Result<(), StreamError> {
        controller.enqueue(chunk.chars().rev().collect())
    }

    fn name(&self) -> &'static str {
        "reverse_text"
    }
}

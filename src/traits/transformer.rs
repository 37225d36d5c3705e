// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::marker::PhantomData;

use async_trait::async_trait;

use crate::engine::transform::TransformStreamDefaultController;
use crate::errors::StreamError;

/// Chunk-by-chunk transformation run by a
/// [`TransformStream`](crate::engine::transform::TransformStream).
///
/// `transform` may enqueue any number of outputs per input, including none.
/// `flush` runs once when the writable side closes, before the readable side
/// closes, and may enqueue trailing output.
#[async_trait]
pub trait Transformer<I, O>: Send + Sync
where
    I: Send + 'static,
    O: Send + 'static,
{
    fn start(&self, _controller: &TransformStreamDefaultController<O>) -> Result<(), StreamError> {
        Ok(())
    }

    async fn transform(
        &self,
        chunk: I,
        controller: &TransformStreamDefaultController<O>,
    ) -> Result<(), StreamError>;

    async fn flush(
        &self,
        _controller: &TransformStreamDefaultController<O>,
    ) -> Result<(), StreamError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "transformer"
    }
}

/// Passes every chunk through unchanged.
pub struct IdentityTransformer<T>(PhantomData<fn(T) -> T>);

impl<T> IdentityTransformer<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for IdentityTransformer<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Send + 'static> Transformer<T, T> for IdentityTransformer<T> {
    async fn transform(
        &self,
        chunk: T,
        controller: &TransformStreamDefaultController<T>,
    ) -> Result<(), StreamError> {
        controller.enqueue(chunk)
    }

    fn name(&self) -> &'static str {
        "identity"
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::engine::readable::ReadableStreamDefaultController;
use crate::errors::StreamError;

/// Producer behind a [`ReadableStream`](crate::engine::readable::ReadableStream).
///
/// `start` runs synchronously while the stream is constructed. `pull` is
/// called whenever the stream wants more data and never overlaps another
/// `pull`. `cancel` is called at most once, with the consumer's reason
/// unmodified. Every method is optional.
#[async_trait]
pub trait UnderlyingSource<T: Send + 'static>: Send + Sync {
    fn start(&self, _controller: &ReadableStreamDefaultController<T>) -> Result<(), StreamError> {
        Ok(())
    }

    async fn pull(
        &self,
        _controller: &ReadableStreamDefaultController<T>,
    ) -> Result<(), StreamError> {
        Ok(())
    }

    async fn cancel(&self, _reason: StreamError) -> Result<(), StreamError> {
        Ok(())
    }
}

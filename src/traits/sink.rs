// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::engine::writable::WritableStreamDefaultController;
use crate::errors::StreamError;

/// Consumer behind a [`WritableStream`](crate::engine::writable::WritableStream).
///
/// Writes are delivered one at a time, in submission order; the next `write`
/// starts only after the previous one resolved. `close` runs after every
/// queued write succeeded. `abort` runs instead of `close` when the stream is
/// aborted, after any in-flight write finished.
#[async_trait]
pub trait UnderlyingSink<T: Send + 'static>: Send + Sync {
    fn start(&self, _controller: &WritableStreamDefaultController<T>) -> Result<(), StreamError> {
        Ok(())
    }

    async fn write(
        &self,
        _chunk: T,
        _controller: &WritableStreamDefaultController<T>,
    ) -> Result<(), StreamError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), StreamError> {
        Ok(())
    }

    async fn abort(&self, _reason: StreamError) -> Result<(), StreamError> {
        Ok(())
    }
}

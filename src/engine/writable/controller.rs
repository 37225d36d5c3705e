// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Weak;

use tokio_util::sync::CancellationToken;

use super::WritableInner;
use crate::errors::StreamError;

/// Handle given to an [`UnderlyingSink`](crate::traits::UnderlyingSink).
pub struct WritableStreamDefaultController<T: Send + 'static> {
    stream: Weak<WritableInner<T>>,
    abort_token: CancellationToken,
}

impl<T: Send + 'static> Clone for WritableStreamDefaultController<T> {
    fn clone(&self) -> Self {
        Self {
            stream: Weak::clone(&self.stream),
            abort_token: self.abort_token.clone(),
        }
    }
}

impl<T: Send + 'static> WritableStreamDefaultController<T> {
    pub(crate) fn new(stream: Weak<WritableInner<T>>, abort_token: CancellationToken) -> Self {
        Self {
            stream,
            abort_token,
        }
    }

    /// Error the stream. Queued writes are rejected with `reason` once any
    /// in-flight write settles. No effect unless the stream is writable.
    pub fn error(&self, reason: StreamError) {
        if let Some(stream) = self.stream.upgrade() {
            stream.controller_error(reason);
        }
    }

    /// Cancelled as soon as `abort()` is requested on the stream, so a
    /// long-running `write` can bail out early.
    pub fn abort_signal(&self) -> CancellationToken {
        self.abort_token.clone()
    }
}

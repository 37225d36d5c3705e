// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::{Arc, Weak};

use super::{ReadableInner, ReadableStatus};
use crate::errors::StreamError;

/// Handle given to an [`UnderlyingSource`](crate::traits::UnderlyingSource) for
/// feeding its stream.
///
/// The controller holds only a weak reference, so a source that stashes it
/// (for a timer, say) does not keep the stream alive. Once the stream is gone
/// every operation fails with [`StreamError::InvalidState`].
pub struct ReadableStreamDefaultController<T: Send + 'static> {
    stream: Weak<ReadableInner<T>>,
}

impl<T: Send + 'static> Clone for ReadableStreamDefaultController<T> {
    fn clone(&self) -> Self {
        Self {
            stream: Weak::clone(&self.stream),
        }
    }
}

impl<T: Send + 'static> ReadableStreamDefaultController<T> {
    pub(crate) fn new(stream: Weak<ReadableInner<T>>) -> Self {
        Self { stream }
    }

    fn stream(&self) -> Result<Arc<ReadableInner<T>>, StreamError> {
        self.stream
            .upgrade()
            .ok_or_else(|| StreamError::invalid_state("stream has been dropped"))
    }

    /// Deliver `chunk` to the oldest pending read, or buffer it.
    ///
    /// Fails when the stream is closed, errored or close-requested, and when
    /// the chunk's size is invalid (which also errors the stream).
    pub fn enqueue(&self, chunk: T) -> Result<(), StreamError> {
        self.stream()?.enqueue(chunk)
    }

    /// Request close. Buffered chunks stay readable; the stream closes once
    /// they are drained.
    pub fn close(&self) -> Result<(), StreamError> {
        self.stream()?.close()
    }

    /// Error the stream. Pending and future reads fail with `reason`.
    /// Has no effect on a stream that is no longer readable.
    pub fn error(&self, reason: StreamError) {
        if let Some(stream) = self.stream.upgrade() {
            stream.error(reason);
        }
    }

    /// `None` unless the stream is readable.
    pub fn desired_size(&self) -> Option<f64> {
        self.stream.upgrade()?.state.lock().desired_size()
    }

    /// Whether the stream would decline a `pull` right now.
    pub(crate) fn has_backpressure(&self) -> bool {
        self.stream
            .upgrade()
            .map_or(true, |stream| !stream.state.lock().should_call_pull())
    }

    pub(crate) fn stored_error(&self) -> Option<StreamError> {
        match self.stream.upgrade()?.status() {
            ReadableStatus::Errored(error) => Some(error),
            _ => None,
        }
    }

    pub(crate) fn can_close_or_enqueue(&self) -> bool {
        self.stream
            .upgrade()
            .map_or(false, |stream| stream.state.lock().can_close_or_enqueue())
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{WritableInner, WritableStatus, WriterSignals};
use crate::engine::completion::Completion;
use crate::errors::StreamError;

/// Exclusive write handle on a [`WritableStream`](super::WritableStream).
///
/// `write`, `close` and `abort` take effect as soon as they are called; the
/// returned futures only report the outcome, so dropping one does not undo
/// the operation. Dropping the writer releases its lock.
pub struct WritableStreamDefaultWriter<T: Send + 'static> {
    id: u64,
    stream: Arc<WritableInner<T>>,
    signals: Arc<WriterSignals>,
    released: AtomicBool,
}

impl<T: Send + 'static> WritableStreamDefaultWriter<T> {
    pub(crate) fn new(id: u64, stream: Arc<WritableInner<T>>, signals: Arc<WriterSignals>) -> Self {
        Self {
            id,
            stream,
            signals,
            released: AtomicBool::new(false),
        }
    }

    fn released_error() -> StreamError {
        StreamError::invalid_state("writer has released its lock")
    }

    /// `Err` when this writer no longer owns a live stream's lock.
    fn check_owner(&self) -> Result<(), StreamError> {
        if self.released.load(Ordering::SeqCst) {
            return Err(Self::released_error());
        }
        let state = self.stream.state.lock();
        match &state.writer {
            Some(slot) if slot.id != self.id => Err(Self::released_error()),
            _ => Ok(()),
        }
    }

    fn settle_with(
        completion: Completion,
    ) -> impl Future<Output = Result<(), StreamError>> + Send + 'static {
        async move { completion.wait().await }
    }

    /// Queue `chunk`. Resolves once the sink has written it.
    pub fn write(
        &self,
        chunk: T,
    ) -> impl Future<Output = Result<(), StreamError>> + Send + 'static {
        let completion = match self.check_owner() {
            Ok(()) => self.stream.write(chunk),
            Err(error) => Completion::rejected(error),
        };
        Self::settle_with(completion)
    }

    /// Close the stream after every queued write. Resolves once the sink's
    /// `close` has completed.
    pub fn close(&self) -> impl Future<Output = Result<(), StreamError>> + Send + 'static {
        let completion = match self.check_owner() {
            Ok(()) => self.stream.close(),
            Err(error) => Completion::rejected(error),
        };
        Self::settle_with(completion)
    }

    /// Abort the stream: queued writes are discarded, an in-flight write is
    /// allowed to finish, then the sink's `abort` runs with `reason`.
    pub fn abort(
        &self,
        reason: StreamError,
    ) -> impl Future<Output = Result<(), StreamError>> + Send + 'static {
        let completion = match self.check_owner() {
            Ok(()) => self.stream.abort(reason),
            Err(error) => Completion::rejected(error),
        };
        Self::settle_with(completion)
    }

    /// Resolves when the stream is ready to accept more data without
    /// exceeding its high-water mark.
    pub async fn ready(&self) -> Result<(), StreamError> {
        self.ready_completion().wait().await
    }

    pub(crate) fn ready_completion(&self) -> Completion {
        self.signals.ready()
    }

    /// Resolves once the stream has closed; rejects when it errors or the
    /// lock is released.
    pub async fn closed(&self) -> Result<(), StreamError> {
        self.signals.closed.wait().await
    }

    /// `None` while erroring, errored or released; zero once closed.
    pub fn desired_size(&self) -> Option<f64> {
        if self.released.load(Ordering::SeqCst) {
            return None;
        }
        let state = self.stream.state.lock();
        match state.status {
            WritableStatus::Erroring(_) | WritableStatus::Errored(_) => None,
            WritableStatus::Closed => Some(0.0),
            WritableStatus::Writable => Some(state.desired_size()),
        }
    }

    /// Give up the lock. `ready` and `closed` reject afterwards; writes
    /// already queued still reach the sink.
    pub fn release_lock(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        {
            let mut state = self.stream.state.lock();
            if state.writer.as_ref().map(|slot| slot.id) == Some(self.id) {
                state.writer = None;
            }
        }
        self.signals.reject_ready(Self::released_error());
        self.signals.closed.reject(Self::released_error());
    }
}

impl<T: Send + 'static> Drop for WritableStreamDefaultWriter<T> {
    fn drop(&mut self) {
        self.release_lock();
    }
}

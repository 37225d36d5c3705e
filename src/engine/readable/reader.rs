// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::stream::{self, Stream};
use tokio::sync::oneshot;

use super::{ReadResult, ReadableInner, ReadableStatus};
use crate::engine::completion::Completion;
use crate::errors::StreamError;

enum ReadStep<T> {
    Ready(Result<ReadResult<T>, StreamError>),
    Dequeued(T),
    Waiting(oneshot::Receiver<Result<ReadResult<T>, StreamError>>),
}

/// Exclusive read handle on a [`ReadableStream`](super::ReadableStream).
///
/// Dropping the reader releases its lock.
pub struct ReadableStreamDefaultReader<T: Send + 'static> {
    id: u64,
    stream: Arc<ReadableInner<T>>,
    released: AtomicBool,
    closed: Completion,
}

impl<T: Send + 'static> ReadableStreamDefaultReader<T> {
    pub(crate) fn new(id: u64, stream: Arc<ReadableInner<T>>, closed: Completion) -> Self {
        Self {
            id,
            stream,
            released: AtomicBool::new(false),
            closed,
        }
    }

    fn released_error() -> StreamError {
        StreamError::invalid_state("reader has released its lock")
    }

    /// Next chunk, `Done` once the stream has closed, or the stored error.
    ///
    /// Reads are fulfilled in the order they were issued.
    pub async fn read(&self) -> Result<ReadResult<T>, StreamError> {
        let step = self.begin_read();
        match step {
            ReadStep::Ready(result) => result,
            ReadStep::Dequeued(chunk) => {
                self.stream.call_pull_if_needed();
                Ok(ReadResult::Chunk(chunk))
            }
            ReadStep::Waiting(receiver) => {
                self.stream.call_pull_if_needed();
                receiver.await.unwrap_or_else(|_| Err(Self::released_error()))
            }
        }
    }

    fn begin_read(&self) -> ReadStep<T> {
        if self.released.load(Ordering::SeqCst) {
            return ReadStep::Ready(Err(Self::released_error()));
        }
        let mut state = self.stream.state.lock();
        state.disturbed = true;
        match &state.status {
            ReadableStatus::Closed => return ReadStep::Ready(Ok(ReadResult::Done)),
            ReadableStatus::Errored(error) => return ReadStep::Ready(Err(error.clone())),
            ReadableStatus::Readable => {}
        }
        if state.reader.as_ref().map(|slot| slot.id) != Some(self.id) {
            return ReadStep::Ready(Err(Self::released_error()));
        }

        if let Some(chunk) = state.queue.dequeue() {
            if state.close_requested && state.queue.is_empty() {
                self.stream.close_locked(&mut state);
            }
            return ReadStep::Dequeued(chunk);
        }

        let (sender, receiver) = oneshot::channel();
        state.read_requests.push_back(sender);
        ReadStep::Waiting(receiver)
    }

    /// Cancel the stream through this reader; the source's `cancel` receives
    /// `reason` unchanged.
    pub async fn cancel(&self, reason: StreamError) -> Result<(), StreamError> {
        if self.released.load(Ordering::SeqCst) {
            return Err(Self::released_error());
        }
        self.stream.cancel(reason).await
    }

    /// Resolves when the stream closes, rejects when it errors or when the
    /// lock is released first.
    pub async fn closed(&self) -> Result<(), StreamError> {
        self.closed.wait().await
    }

    pub(crate) fn closed_signal(&self) -> Completion {
        self.closed.clone()
    }

    /// Give up the lock. Pending reads fail with [`StreamError::InvalidState`].
    pub fn release_lock(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        {
            let mut state = self.stream.state.lock();
            if state.reader.as_ref().map(|slot| slot.id) == Some(self.id) {
                state.reader = None;
                for request in state.read_requests.drain(..) {
                    let _ = request.send(Err(Self::released_error()));
                }
            }
        }
        self.closed.reject(Self::released_error());
    }

    /// Adapt the reader into a `futures::Stream` of chunks. The stream ends
    /// after `Done` or after yielding the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<T, StreamError>> + Send + 'static {
        stream::unfold(Some(self), |reader| async move {
            let reader = reader?;
            match reader.read().await {
                Ok(ReadResult::Chunk(chunk)) => Some((Ok(chunk), Some(reader))),
                Ok(ReadResult::Done) => None,
                Err(error) => Some((Err(error), None)),
            }
        })
    }
}

impl<T: Send + 'static> Drop for ReadableStreamDefaultReader<T> {
    fn drop(&mut self) {
        self.release_lock();
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Readable streams: the producer-facing half of the engine.
//!
//! A [`ReadableStream`] wraps an [`UnderlyingSource`] and buffers what it
//! produces in a size-accounted [`Queue`]. Consumers take an exclusive
//! [`ReadableStreamDefaultReader`] and pull chunks out one `read()` at a time.
//!
//! # Pull scheduling
//!
//! The source's `pull` is invoked only when
//! * the source's `start` has completed,
//! * the stream is readable and no close has been requested, and
//! * either the desired size is positive, or the stream is locked and a read
//!   is waiting on an empty queue.
//!
//! At most one `pull` runs at a time. A request that arrives while one is in
//! flight is remembered and replayed once the current pull resolves.
//!
//! # Terminal states
//!
//! `closed` and `errored` are terminal. Reaching either settles every pending
//! read, settles the reader's `closed` signal, drops the source and frees the
//! reader lock.

mod controller;
mod reader;
mod tee;

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::engine::completion::Completion;
use crate::engine::next_id;
use crate::engine::queue::Queue;
use crate::engine::strategy::QueuingStrategy;
use crate::errors::StreamError;
use crate::observability::messages::stream::{
    LockConflict, StreamCancelled, StreamClosed, StreamCreated, StreamErrored,
};
use crate::observability::messages::StructuredLog;
use crate::traits::UnderlyingSource;

pub use controller::ReadableStreamDefaultController;
pub use reader::ReadableStreamDefaultReader;

const STREAM_KIND: &str = "readable";

/// Outcome of a successful `read()`.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadResult<T> {
    Chunk(T),
    Done,
}

impl<T> ReadResult<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, ReadResult::Done)
    }

    pub fn into_chunk(self) -> Option<T> {
        match self {
            ReadResult::Chunk(chunk) => Some(chunk),
            ReadResult::Done => None,
        }
    }
}

/// Publicly observable lifecycle state of a readable stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadableStreamState {
    Readable,
    Closed,
    Errored,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ReadableStatus {
    Readable,
    Closed,
    Errored(StreamError),
}

type ReadRequest<T> = oneshot::Sender<Result<ReadResult<T>, StreamError>>;

pub(crate) struct ReaderSlot {
    pub(crate) id: u64,
    pub(crate) closed: Completion,
}

pub(crate) struct ReadableState<T: Send + 'static> {
    pub(crate) status: ReadableStatus,
    pub(crate) queue: Queue<T>,
    strategy: QueuingStrategy<T>,
    source: Option<Arc<dyn UnderlyingSource<T>>>,
    pub(crate) close_requested: bool,
    started: bool,
    pulling: bool,
    pull_again: bool,
    pub(crate) disturbed: bool,
    pub(crate) reader: Option<ReaderSlot>,
    pub(crate) read_requests: VecDeque<ReadRequest<T>>,
    cancel_outcome: Option<Completion>,
}

impl<T: Send + 'static> ReadableState<T> {
    pub(crate) fn can_close_or_enqueue(&self) -> bool {
        !self.close_requested && self.status == ReadableStatus::Readable
    }

    pub(crate) fn desired_size(&self) -> Option<f64> {
        match self.status {
            ReadableStatus::Readable => {
                Some(self.strategy.high_water_mark() - self.queue.total_size())
            }
            _ => None,
        }
    }

    pub(crate) fn should_call_pull(&self) -> bool {
        if !self.started || !self.can_close_or_enqueue() {
            return false;
        }
        if self.reader.is_some() && !self.read_requests.is_empty() {
            return true;
        }
        self.desired_size().map_or(false, |desired| desired > 0.0)
    }
}

pub(crate) struct ReadableInner<T: Send + 'static> {
    pub(crate) id: u64,
    pub(crate) state: Mutex<ReadableState<T>>,
}

impl<T: Send + 'static> ReadableInner<T> {
    /// Schedule a `pull` if one is needed, or remember to pull again once the
    /// in-flight one resolves.
    pub(crate) fn call_pull_if_needed(self: &Arc<Self>) {
        let source = {
            let mut state = self.state.lock();
            if !state.should_call_pull() {
                return;
            }
            if state.pulling {
                state.pull_again = true;
                return;
            }
            let Some(source) = state.source.clone() else {
                return;
            };
            state.pulling = true;
            source
        };

        let stream = Arc::clone(self);
        tokio::spawn(async move {
            let controller = ReadableStreamDefaultController::new(Arc::downgrade(&stream));
            let result = source.pull(&controller).await;
            stream.pull_finished(result);
        });
    }

    fn pull_finished(self: &Arc<Self>, result: Result<(), StreamError>) {
        let pull_again = {
            let mut state = self.state.lock();
            state.pulling = false;
            std::mem::take(&mut state.pull_again)
        };
        match result {
            Ok(()) if pull_again => self.call_pull_if_needed(),
            Ok(()) => {}
            Err(error) => self.error(error),
        }
    }

    pub(crate) fn enqueue(self: &Arc<Self>, chunk: T) -> Result<(), StreamError> {
        {
            let mut state = self.state.lock();
            if !state.can_close_or_enqueue() {
                return Err(StreamError::invalid_state(
                    "cannot enqueue: stream is closed or closing",
                ));
            }

            // Hand the chunk straight to the oldest live read request.
            let mut pending = Some(chunk);
            while let Some(value) = pending.take() {
                let Some(request) = state.read_requests.pop_front() else {
                    pending = Some(value);
                    break;
                };
                let sent = request.send(Ok(ReadResult::Chunk(value)));
                if let Err(Ok(ReadResult::Chunk(value))) = sent {
                    pending = Some(value);
                }
            }

            if let Some(value) = pending {
                let queued = state
                    .strategy
                    .size_of(&value)
                    .and_then(|size| state.queue.enqueue(value, size));
                if let Err(error) = queued {
                    self.error_locked(&mut state, error.clone());
                    return Err(error);
                }
            }
        }
        self.call_pull_if_needed();
        Ok(())
    }

    pub(crate) fn close(&self) -> Result<(), StreamError> {
        let mut state = self.state.lock();
        if !state.can_close_or_enqueue() {
            return Err(StreamError::invalid_state(
                "cannot close: stream is already closed or closing",
            ));
        }
        state.close_requested = true;
        if state.queue.is_empty() {
            self.close_locked(&mut state);
        }
        Ok(())
    }

    /// Error the stream if it is still readable.
    pub(crate) fn error(&self, error: StreamError) {
        let mut state = self.state.lock();
        if state.status == ReadableStatus::Readable {
            self.error_locked(&mut state, error);
        }
    }

    pub(crate) fn close_locked(&self, state: &mut ReadableState<T>) {
        state.status = ReadableStatus::Closed;
        state.source = None;
        for request in state.read_requests.drain(..) {
            let _ = request.send(Ok(ReadResult::Done));
        }
        if let Some(reader) = state.reader.take() {
            reader.closed.resolve();
        }
        StreamClosed {
            kind: STREAM_KIND,
            stream_id: self.id,
        }
        .log();
    }

    pub(crate) fn error_locked(&self, state: &mut ReadableState<T>, error: StreamError) {
        StreamErrored {
            kind: STREAM_KIND,
            stream_id: self.id,
            error: &error,
        }
        .log();
        state.status = ReadableStatus::Errored(error.clone());
        state.queue.reset();
        state.source = None;
        for request in state.read_requests.drain(..) {
            let _ = request.send(Err(error.clone()));
        }
        if let Some(reader) = state.reader.take() {
            reader.closed.reject(error);
        }
    }

    /// Close the stream, discard anything buffered, and run the source's
    /// `cancel` with `reason`. Repeated calls share the first call's outcome.
    pub(crate) async fn cancel(self: &Arc<Self>, reason: StreamError) -> Result<(), StreamError> {
        let (outcome, source) = {
            let mut state = self.state.lock();
            state.disturbed = true;
            if let Some(outcome) = &state.cancel_outcome {
                (outcome.clone(), None)
            } else {
                match &state.status {
                    ReadableStatus::Closed => return Ok(()),
                    ReadableStatus::Errored(error) => return Err(error.clone()),
                    ReadableStatus::Readable => {}
                }
                StreamCancelled {
                    kind: STREAM_KIND,
                    stream_id: self.id,
                    reason: &reason,
                }
                .log();
                let outcome = Completion::pending();
                state.cancel_outcome = Some(outcome.clone());
                state.queue.reset();
                let source = state.source.take();
                if source.is_none() {
                    outcome.resolve();
                }
                self.close_locked(&mut state);
                (outcome, source)
            }
        };

        if let Some(source) = source {
            outcome.settle(source.cancel(reason).await);
        }
        outcome.wait().await
    }

    pub(crate) fn status(&self) -> ReadableStatus {
        self.state.lock().status.clone()
    }
}

/// Producer-facing stream of chunks of type `T`.
///
/// Cloning a `ReadableStream` yields another handle to the same stream.
pub struct ReadableStream<T: Send + 'static> {
    pub(crate) inner: Arc<ReadableInner<T>>,
}

impl<T: Send + 'static> Clone for ReadableStream<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + 'static> ReadableStream<T> {
    /// Create a stream over `source`.
    ///
    /// The source's `start` runs before this returns. A failing `start` leaves
    /// the stream errored with that failure. Must be called from within a Tokio
    /// runtime, since pulls are scheduled as tasks.
    pub fn new<S>(source: S, strategy: QueuingStrategy<T>) -> Self
    where
        S: UnderlyingSource<T> + 'static,
    {
        Self::from_source(Arc::new(source), strategy)
    }

    pub(crate) fn from_source(
        source: Arc<dyn UnderlyingSource<T>>,
        strategy: QueuingStrategy<T>,
    ) -> Self {
        let id = next_id();
        let created = StreamCreated {
            kind: STREAM_KIND,
            stream_id: id,
            high_water_mark: strategy.high_water_mark(),
        };
        // The source's `start` runs inside the new stream's span.
        let span = created.span("source_start");
        let _guard = span.enter();
        created.log();

        let inner = Arc::new(ReadableInner {
            id,
            state: Mutex::new(ReadableState {
                status: ReadableStatus::Readable,
                queue: Queue::new(),
                strategy,
                source: Some(Arc::clone(&source)),
                close_requested: false,
                started: false,
                pulling: false,
                pull_again: false,
                disturbed: false,
                reader: None,
                read_requests: VecDeque::new(),
                cancel_outcome: None,
            }),
        });

        let controller = ReadableStreamDefaultController::new(Arc::downgrade(&inner));
        match source.start(&controller) {
            Ok(()) => {
                inner.state.lock().started = true;
                inner.call_pull_if_needed();
            }
            Err(error) => inner.error(error),
        }

        Self { inner }
    }

    /// Stream that yields every item of `iter`, then closes.
    pub fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self::from_iter_with_strategy(iter, QueuingStrategy::default())
    }

    /// Like [`from_iter`](Self::from_iter), buffering ahead according to `strategy`.
    pub fn from_iter_with_strategy<I>(iter: I, strategy: QueuingStrategy<T>) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self::new(
            IterSource {
                iter: Mutex::new(iter.into_iter()),
            },
            strategy,
        )
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Acquire the exclusive reader lock.
    pub fn get_reader(&self) -> Result<ReadableStreamDefaultReader<T>, StreamError> {
        let id = next_id();
        let closed = {
            let mut state = self.inner.state.lock();
            if state.reader.is_some() {
                LockConflict {
                    kind: STREAM_KIND,
                    stream_id: self.inner.id,
                }
                .log();
                return Err(StreamError::LockConflict {
                    stream: STREAM_KIND,
                });
            }
            match &state.status {
                ReadableStatus::Readable => {
                    let closed = Completion::pending();
                    state.reader = Some(ReaderSlot {
                        id,
                        closed: closed.clone(),
                    });
                    closed
                }
                ReadableStatus::Closed => Completion::resolved(),
                ReadableStatus::Errored(error) => Completion::rejected(error.clone()),
            }
        };
        Ok(ReadableStreamDefaultReader::new(
            id,
            Arc::clone(&self.inner),
            closed,
        ))
    }

    pub fn locked(&self) -> bool {
        self.inner.state.lock().reader.is_some()
    }

    pub fn state(&self) -> ReadableStreamState {
        match self.inner.status() {
            ReadableStatus::Readable => ReadableStreamState::Readable,
            ReadableStatus::Closed => ReadableStreamState::Closed,
            ReadableStatus::Errored(_) => ReadableStreamState::Errored,
        }
    }

    /// The stored error of an errored stream.
    pub fn stored_error(&self) -> Option<StreamError> {
        match self.inner.status() {
            ReadableStatus::Errored(error) => Some(error),
            _ => None,
        }
    }

    /// Whether the stream has ever been read from or cancelled.
    pub fn is_disturbed(&self) -> bool {
        self.inner.state.lock().disturbed
    }

    /// Cancel an unlocked stream. Use the reader's `cancel` while locked.
    pub async fn cancel(&self, reason: StreamError) -> Result<(), StreamError> {
        if self.locked() {
            return Err(StreamError::LockConflict {
                stream: STREAM_KIND,
            });
        }
        self.inner.cancel(reason).await
    }
}

struct IterSource<I> {
    iter: Mutex<I>,
}

#[async_trait]
impl<T, I> UnderlyingSource<T> for IterSource<I>
where
    T: Send + 'static,
    I: Iterator<Item = T> + Send,
{
    async fn pull(
        &self,
        controller: &ReadableStreamDefaultController<T>,
    ) -> Result<(), StreamError> {
        let next = self.iter.lock().next();
        match next {
            Some(chunk) => controller.enqueue(chunk),
            None => controller.close(),
        }
    }
}

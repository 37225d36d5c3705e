// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Writable streams: the consumer-facing half of the engine.
//!
//! A [`WritableStream`] queues chunks written through its exclusive
//! [`WritableStreamDefaultWriter`] and feeds them to an [`UnderlyingSink`]
//! strictly one at a time. The chunk handed to the sink stays counted against
//! the high-water mark until its `write` resolves.
//!
//! # Lifecycle
//!
//! ```text
//! writable --close()--> closing --sink close ok--> closed
//!     |                    |
//!     +--abort()/error-----+--> erroring --in-flight op done--> errored
//! ```
//!
//! While erroring, the stream waits for any in-flight `write` or `close` to
//! settle, then rejects everything still queued and, when the transition was
//! caused by `abort`, runs the sink's `abort` with the caller's reason.

mod controller;
mod writer;

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::engine::completion::Completion;
use crate::engine::next_id;
use crate::engine::queue::Queue;
use crate::engine::strategy::QueuingStrategy;
use crate::errors::StreamError;
use crate::observability::messages::stream::{
    LockConflict, StreamAborted, StreamClosed, StreamCreated, StreamErrored,
};
use crate::observability::messages::StructuredLog;
use crate::traits::UnderlyingSink;

pub use controller::WritableStreamDefaultController;
pub use writer::WritableStreamDefaultWriter;

const STREAM_KIND: &str = "writable";

/// Publicly observable lifecycle state of a writable stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritableStreamState {
    Writable,
    Closing,
    Closed,
    Erroring,
    Errored,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum WritableStatus {
    Writable,
    Erroring(StreamError),
    Errored(StreamError),
    Closed,
}

enum PendingWrite<T> {
    Chunk(T),
    Close,
}

struct PendingAbort {
    outcome: Completion,
    reason: StreamError,
    was_already_erroring: bool,
}

pub(crate) struct WriterSignals {
    ready: Mutex<Completion>,
    closed: Completion,
}

impl WriterSignals {
    fn new(ready: Completion, closed: Completion) -> Self {
        Self {
            ready: Mutex::new(ready),
            closed,
        }
    }

    pub(crate) fn ready(&self) -> Completion {
        self.ready.lock().clone()
    }

    fn resolve_ready(&self) {
        self.ready.lock().resolve();
    }

    fn reset_ready(&self) {
        let mut ready = self.ready.lock();
        if ready.is_settled() {
            *ready = Completion::pending();
        }
    }

    pub(crate) fn reject_ready(&self, reason: StreamError) {
        let mut ready = self.ready.lock();
        if !ready.reject(reason.clone()) {
            *ready = Completion::rejected(reason);
        }
    }
}

pub(crate) struct WriterSlot {
    pub(crate) id: u64,
    pub(crate) signals: Arc<WriterSignals>,
}

pub(crate) struct WritableState<T: Send + 'static> {
    pub(crate) status: WritableStatus,
    queue: Queue<PendingWrite<T>>,
    strategy: QueuingStrategy<T>,
    sink: Option<Arc<dyn UnderlyingSink<T>>>,
    started: bool,
    backpressure: bool,
    write_requests: VecDeque<Completion>,
    in_flight_write: Option<Completion>,
    in_flight_size: f64,
    close_request: Option<Completion>,
    in_flight_close: Option<Completion>,
    close_outcome: Option<Completion>,
    pending_abort: Option<PendingAbort>,
    abort_outcome: Option<Completion>,
    pub(crate) writer: Option<WriterSlot>,
}

impl<T: Send + 'static> WritableState<T> {
    pub(crate) fn desired_size(&self) -> f64 {
        self.strategy.high_water_mark() - self.queue.total_size() - self.in_flight_size
    }

    fn current_backpressure(&self) -> bool {
        self.desired_size() <= 0.0
    }

    pub(crate) fn close_queued_or_in_flight(&self) -> bool {
        self.close_request.is_some() || self.in_flight_close.is_some()
    }

    fn has_operation_in_flight(&self) -> bool {
        self.in_flight_write.is_some() || self.in_flight_close.is_some()
    }

    fn stored_error(&self) -> Option<StreamError> {
        match &self.status {
            WritableStatus::Erroring(error) | WritableStatus::Errored(error) => Some(error.clone()),
            _ => None,
        }
    }

    fn update_backpressure(&mut self, backpressure: bool) {
        if backpressure == self.backpressure {
            return;
        }
        if let Some(writer) = &self.writer {
            if backpressure {
                writer.signals.reset_ready();
            } else {
                writer.signals.resolve_ready();
            }
        }
        self.backpressure = backpressure;
    }

    /// Reject the pending close request and the writer's `closed` signal with
    /// the stored error, then free the lock.
    fn reject_close_and_closed(&mut self) {
        let Some(error) = self.stored_error() else {
            return;
        };
        if let Some(close) = self.close_request.take() {
            close.reject(error.clone());
        }
        if let Some(writer) = self.writer.take() {
            writer.signals.closed.reject(error);
        }
    }

    pub(crate) fn public_state(&self) -> WritableStreamState {
        match &self.status {
            WritableStatus::Writable if self.close_queued_or_in_flight() => {
                WritableStreamState::Closing
            }
            WritableStatus::Writable => WritableStreamState::Writable,
            WritableStatus::Erroring(_) => WritableStreamState::Erroring,
            WritableStatus::Errored(_) => WritableStreamState::Errored,
            WritableStatus::Closed => WritableStreamState::Closed,
        }
    }
}

pub(crate) struct WritableInner<T: Send + 'static> {
    pub(crate) id: u64,
    pub(crate) state: Mutex<WritableState<T>>,
    abort_token: CancellationToken,
}

impl<T: Send + 'static> WritableInner<T> {
    fn controller(self: &Arc<Self>) -> WritableStreamDefaultController<T> {
        WritableStreamDefaultController::new(Arc::downgrade(self), self.abort_token.clone())
    }

    fn start_erroring(self: &Arc<Self>, state: &mut WritableState<T>, reason: StreamError) {
        StreamErrored {
            kind: STREAM_KIND,
            stream_id: self.id,
            error: &reason,
        }
        .log();
        state.status = WritableStatus::Erroring(reason.clone());
        if let Some(writer) = &state.writer {
            writer.signals.reject_ready(reason);
        }
        if !state.has_operation_in_flight() && state.started {
            self.finish_erroring(state);
        }
    }

    fn finish_erroring(self: &Arc<Self>, state: &mut WritableState<T>) {
        let WritableStatus::Erroring(stored) = &state.status else {
            return;
        };
        let stored = stored.clone();
        state.status = WritableStatus::Errored(stored.clone());
        state.queue.reset();
        for request in state.write_requests.drain(..) {
            request.reject(stored.clone());
        }

        let Some(abort) = state.pending_abort.take() else {
            state.reject_close_and_closed();
            return;
        };
        if abort.was_already_erroring {
            abort.outcome.reject(stored);
            state.reject_close_and_closed();
            return;
        }

        let sink = state.sink.take();
        let stream = Arc::clone(self);
        tokio::spawn(async move {
            let result = match sink {
                Some(sink) => sink.abort(abort.reason).await,
                None => Ok(()),
            };
            abort.outcome.settle(result);
            stream.state.lock().reject_close_and_closed();
        });
    }

    fn deal_with_rejection(self: &Arc<Self>, state: &mut WritableState<T>, error: StreamError) {
        if state.status == WritableStatus::Writable {
            self.start_erroring(state, error);
        } else {
            self.finish_erroring(state);
        }
    }

    /// Error the stream from the controller side, if it is still writable.
    pub(crate) fn error_if_needed(
        self: &Arc<Self>,
        state: &mut WritableState<T>,
        error: StreamError,
    ) {
        if state.status == WritableStatus::Writable {
            state.sink = None;
            self.start_erroring(state, error);
        }
    }

    fn advance_queue_if_needed(self: &Arc<Self>, state: &mut WritableState<T>) {
        if !state.started || state.in_flight_write.is_some() {
            return;
        }
        if matches!(state.status, WritableStatus::Erroring(_)) {
            self.finish_erroring(state);
            return;
        }
        match state.queue.peek() {
            None => {}
            Some(PendingWrite::Close) => self.process_close(state),
            Some(PendingWrite::Chunk(_)) => self.process_write(state),
        }
    }

    fn process_close(self: &Arc<Self>, state: &mut WritableState<T>) {
        state.in_flight_close = state.close_request.take();
        state.queue.dequeue();
        let sink = state.sink.take();
        let stream = Arc::clone(self);
        tokio::spawn(async move {
            let result = match sink {
                Some(sink) => sink.close().await,
                None => Ok(()),
            };
            let mut state = stream.state.lock();
            match result {
                Ok(()) => stream.finish_in_flight_close(&mut state),
                Err(error) => stream.finish_in_flight_close_with_error(&mut state, error),
            }
        });
    }

    fn process_write(self: &Arc<Self>, state: &mut WritableState<T>) {
        let Some((PendingWrite::Chunk(chunk), size)) = state.queue.dequeue_with_size() else {
            return;
        };
        state.in_flight_write = Some(state.write_requests.pop_front().unwrap_or_default());
        state.in_flight_size = size;
        let sink = state.sink.clone();
        let stream = Arc::clone(self);
        tokio::spawn(async move {
            let result = match sink {
                Some(sink) => sink.write(chunk, &stream.controller()).await,
                None => Ok(()),
            };
            let mut state = stream.state.lock();
            match result {
                Ok(()) => stream.finish_in_flight_write(&mut state),
                Err(error) => stream.finish_in_flight_write_with_error(&mut state, error),
            }
        });
    }

    fn finish_in_flight_write(self: &Arc<Self>, state: &mut WritableState<T>) {
        if let Some(write) = state.in_flight_write.take() {
            write.resolve();
        }
        state.in_flight_size = 0.0;
        if !state.close_queued_or_in_flight() && state.status == WritableStatus::Writable {
            let backpressure = state.current_backpressure();
            state.update_backpressure(backpressure);
        }
        self.advance_queue_if_needed(state);
    }

    fn finish_in_flight_write_with_error(
        self: &Arc<Self>,
        state: &mut WritableState<T>,
        error: StreamError,
    ) {
        if state.status == WritableStatus::Writable {
            state.sink = None;
        }
        if let Some(write) = state.in_flight_write.take() {
            write.reject(error.clone());
        }
        state.in_flight_size = 0.0;
        self.deal_with_rejection(state, error);
    }

    fn finish_in_flight_close(self: &Arc<Self>, state: &mut WritableState<T>) {
        if let Some(close) = state.in_flight_close.take() {
            close.resolve();
        }
        if let Some(abort) = state.pending_abort.take() {
            abort.outcome.resolve();
        }
        state.status = WritableStatus::Closed;
        if let Some(writer) = state.writer.take() {
            writer.signals.closed.resolve();
        }
        StreamClosed {
            kind: STREAM_KIND,
            stream_id: self.id,
        }
        .log();
    }

    fn finish_in_flight_close_with_error(
        self: &Arc<Self>,
        state: &mut WritableState<T>,
        error: StreamError,
    ) {
        if let Some(close) = state.in_flight_close.take() {
            close.reject(error.clone());
        }
        if let Some(abort) = state.pending_abort.take() {
            abort.outcome.reject(error.clone());
        }
        self.deal_with_rejection(state, error);
    }

    /// Queue `chunk` and return the completion that settles once the sink has
    /// written it.
    pub(crate) fn write(self: &Arc<Self>, chunk: T) -> Completion {
        let mut state = self.state.lock();
        let size = match state.strategy.size_of(&chunk) {
            Ok(size) => size,
            Err(error) => {
                self.error_if_needed(&mut state, error);
                1.0
            }
        };

        match &state.status {
            WritableStatus::Errored(error) => return Completion::rejected(error.clone()),
            WritableStatus::Closed => {
                return Completion::rejected(StreamError::invalid_state(
                    "cannot write to a closed stream",
                ))
            }
            _ if state.close_queued_or_in_flight() => {
                return Completion::rejected(StreamError::invalid_state(
                    "cannot write to a closing stream",
                ))
            }
            WritableStatus::Erroring(error) => return Completion::rejected(error.clone()),
            WritableStatus::Writable => {}
        }

        let completion = Completion::pending();
        state.write_requests.push_back(completion.clone());
        match state.queue.enqueue(PendingWrite::Chunk(chunk), size) {
            Ok(()) => {
                let backpressure = state.current_backpressure();
                state.update_backpressure(backpressure);
            }
            Err(error) => self.error_if_needed(&mut state, error),
        }
        self.advance_queue_if_needed(&mut state);
        completion
    }

    /// Queue a close after every pending write. Repeated calls share the first
    /// call's outcome.
    pub(crate) fn close(self: &Arc<Self>) -> Completion {
        let mut state = self.state.lock();
        if let Some(outcome) = &state.close_outcome {
            return outcome.clone();
        }
        match &state.status {
            WritableStatus::Errored(error) | WritableStatus::Erroring(error) => {
                return Completion::rejected(error.clone())
            }
            WritableStatus::Closed => {
                return Completion::rejected(StreamError::invalid_state(
                    "stream is already closed",
                ))
            }
            WritableStatus::Writable => {}
        }

        let outcome = Completion::pending();
        state.close_request = Some(outcome.clone());
        state.close_outcome = Some(outcome.clone());
        if state.backpressure {
            if let Some(writer) = &state.writer {
                writer.signals.resolve_ready();
            }
        }
        // A zero-sized marker keeps the close ordered behind pending writes.
        if state.queue.enqueue(PendingWrite::Close, 0.0).is_ok() {
            self.advance_queue_if_needed(&mut state);
        }
        outcome
    }

    /// Abort the stream with `reason`. Repeated calls share the first call's
    /// outcome; aborting a closed stream succeeds without touching the sink.
    pub(crate) fn abort(self: &Arc<Self>, reason: StreamError) -> Completion {
        let mut state = self.state.lock();
        if let Some(outcome) = &state.abort_outcome {
            return outcome.clone();
        }
        match &state.status {
            WritableStatus::Closed => return Completion::resolved(),
            WritableStatus::Errored(error) => return Completion::rejected(error.clone()),
            _ => {}
        }

        StreamAborted {
            kind: STREAM_KIND,
            stream_id: self.id,
            reason: &reason,
        }
        .log();
        self.abort_token.cancel();

        let was_already_erroring = matches!(state.status, WritableStatus::Erroring(_));
        let reason = match &state.status {
            WritableStatus::Erroring(stored) => stored.clone(),
            _ => reason,
        };
        let outcome = Completion::pending();
        state.abort_outcome = Some(outcome.clone());
        state.pending_abort = Some(PendingAbort {
            outcome: outcome.clone(),
            reason: reason.clone(),
            was_already_erroring,
        });
        if !was_already_erroring {
            self.start_erroring(&mut state, reason);
        }
        outcome
    }

    pub(crate) fn controller_error(self: &Arc<Self>, error: StreamError) {
        let mut state = self.state.lock();
        self.error_if_needed(&mut state, error);
    }
}

/// Consumer-facing stream accepting chunks of type `T`.
///
/// Cloning a `WritableStream` yields another handle to the same stream.
pub struct WritableStream<T: Send + 'static> {
    pub(crate) inner: Arc<WritableInner<T>>,
}

impl<T: Send + 'static> Clone for WritableStream<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + 'static> WritableStream<T> {
    /// Create a stream over `sink`.
    ///
    /// The sink's `start` runs before this returns; a failing `start` errors
    /// the stream. Must be called from within a Tokio runtime.
    pub fn new<S>(sink: S, strategy: QueuingStrategy<T>) -> Self
    where
        S: UnderlyingSink<T> + 'static,
    {
        Self::from_sink(Arc::new(sink), strategy)
    }

    pub(crate) fn from_sink(
        sink: Arc<dyn UnderlyingSink<T>>,
        strategy: QueuingStrategy<T>,
    ) -> Self {
        let id = next_id();
        let created = StreamCreated {
            kind: STREAM_KIND,
            stream_id: id,
            high_water_mark: strategy.high_water_mark(),
        };
        // The sink's `start` runs inside the new stream's span.
        let span = created.span("sink_start");
        let _guard = span.enter();
        created.log();

        let backpressure = strategy.high_water_mark() <= 0.0;
        let inner = Arc::new(WritableInner {
            id,
            state: Mutex::new(WritableState {
                status: WritableStatus::Writable,
                queue: Queue::new(),
                strategy,
                sink: Some(Arc::clone(&sink)),
                started: false,
                backpressure,
                write_requests: VecDeque::new(),
                in_flight_write: None,
                in_flight_size: 0.0,
                close_request: None,
                in_flight_close: None,
                close_outcome: None,
                pending_abort: None,
                abort_outcome: None,
                writer: None,
            }),
            abort_token: CancellationToken::new(),
        });

        let started = sink.start(&inner.controller());
        {
            let mut state = inner.state.lock();
            state.started = true;
            match started {
                Ok(()) => inner.advance_queue_if_needed(&mut state),
                Err(error) => inner.deal_with_rejection(&mut state, error),
            }
        }

        Self { inner }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Acquire the exclusive writer lock.
    pub fn get_writer(&self) -> Result<WritableStreamDefaultWriter<T>, StreamError> {
        let id = next_id();
        let signals = {
            let mut state = self.inner.state.lock();
            if state.writer.is_some() {
                LockConflict {
                    kind: STREAM_KIND,
                    stream_id: self.inner.id,
                }
                .log();
                return Err(StreamError::LockConflict {
                    stream: STREAM_KIND,
                });
            }
            let (ready, closed) = match &state.status {
                WritableStatus::Writable
                    if !state.close_queued_or_in_flight() && state.backpressure =>
                {
                    (Completion::pending(), Completion::pending())
                }
                WritableStatus::Writable => (Completion::resolved(), Completion::pending()),
                WritableStatus::Erroring(error) => {
                    (Completion::rejected(error.clone()), Completion::pending())
                }
                WritableStatus::Closed => (Completion::resolved(), Completion::resolved()),
                WritableStatus::Errored(error) => (
                    Completion::rejected(error.clone()),
                    Completion::rejected(error.clone()),
                ),
            };
            let signals = Arc::new(WriterSignals::new(ready, closed));
            if matches!(
                state.status,
                WritableStatus::Writable | WritableStatus::Erroring(_)
            ) {
                state.writer = Some(WriterSlot {
                    id,
                    signals: Arc::clone(&signals),
                });
            }
            signals
        };
        Ok(WritableStreamDefaultWriter::new(
            id,
            Arc::clone(&self.inner),
            signals,
        ))
    }

    pub fn locked(&self) -> bool {
        self.inner.state.lock().writer.is_some()
    }

    pub fn state(&self) -> WritableStreamState {
        self.inner.state.lock().public_state()
    }

    pub fn stored_error(&self) -> Option<StreamError> {
        self.inner.state.lock().stored_error()
    }

    /// Abort an unlocked stream. Use the writer's `abort` while locked.
    pub async fn abort(&self, reason: StreamError) -> Result<(), StreamError> {
        if self.locked() {
            return Err(StreamError::LockConflict {
                stream: STREAM_KIND,
            });
        }
        self.inner.abort(reason).wait().await
    }

    /// Close an unlocked stream. Use the writer's `close` while locked.
    pub async fn close(&self) -> Result<(), StreamError> {
        if self.locked() {
            return Err(StreamError::LockConflict {
                stream: STREAM_KIND,
            });
        }
        self.inner.close().wait().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::stub::{FailingStartSink, GatedSink, RecordingSink};

    #[tokio::test]
    async fn test_writes_reach_sink_in_order_before_close() {
        let sink = RecordingSink::<String>::new();
        let log = sink.log();
        let stream = WritableStream::new(sink, QueuingStrategy::count(1.0));
        let writer = stream.get_writer().unwrap();

        let first = writer.write("Hello,".to_string());
        let second = writer.write(" ".to_string());
        let third = writer.write("Wasmer".to_string());
        writer.close().await.unwrap();

        assert_eq!(first.await, Ok(()));
        assert_eq!(second.await, Ok(()));
        assert_eq!(third.await, Ok(()));
        assert_eq!(
            log.events(),
            vec!["write:Hello,", "write: ", "write:Wasmer", "close"]
        );
        assert_eq!(stream.state(), WritableStreamState::Closed);
    }

    #[tokio::test]
    async fn test_desired_size_counts_queued_and_in_flight_chunks() {
        let sink = GatedSink::<u32>::new();
        let gate = sink.gate();
        let stream = WritableStream::new(sink, QueuingStrategy::count(3.0));
        let writer = stream.get_writer().unwrap();

        assert_eq!(writer.desired_size(), Some(3.0));
        let _first = writer.write(1);
        let _second = writer.write(2);
        assert_eq!(writer.desired_size(), Some(1.0));

        // The first write is in flight; it still counts.
        tokio::task::yield_now().await;
        assert_eq!(writer.desired_size(), Some(1.0));

        gate.open_one();
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        assert_eq!(writer.desired_size(), Some(2.0));
    }

    #[tokio::test]
    async fn test_ready_waits_for_backpressure_to_clear() {
        let sink = GatedSink::<u32>::new();
        let gate = sink.gate();
        let stream = WritableStream::new(sink, QueuingStrategy::count(1.0));
        let writer = stream.get_writer().unwrap();

        assert_eq!(writer.ready().await, Ok(()));
        let write = writer.write(1);
        assert_eq!(writer.desired_size(), Some(0.0));
        assert!(!writer.ready_completion().is_settled());

        gate.open_one();
        assert_eq!(write.await, Ok(()));
        assert_eq!(writer.ready().await, Ok(()));
    }

    #[tokio::test]
    async fn test_write_after_close_is_invalid_state() {
        let stream = WritableStream::new(RecordingSink::<u8>::new(), QueuingStrategy::default());
        let writer = stream.get_writer().unwrap();
        let closing = writer.close();
        assert_eq!(stream.state(), WritableStreamState::Closing);
        assert!(matches!(
            writer.write(1).await,
            Err(StreamError::InvalidState(_))
        ));
        assert_eq!(closing.await, Ok(()));
    }

    #[tokio::test]
    async fn test_failing_write_errors_stream_and_rejects_later_writes() {
        let sink = RecordingSink::<u32>::failing_on(2);
        let stream = WritableStream::new(sink, QueuingStrategy::count(8.0));
        let writer = stream.get_writer().unwrap();

        let first = writer.write(1);
        let second = writer.write(2);
        let third = writer.write(3);

        assert_eq!(first.await, Ok(()));
        assert_eq!(second.await, Err(StreamError::sink("write 2 failed")));
        assert_eq!(third.await, Err(StreamError::sink("write 2 failed")));
        assert_eq!(stream.state(), WritableStreamState::Errored);
        assert_eq!(
            writer.close().await,
            Err(StreamError::sink("write 2 failed"))
        );
    }

    #[tokio::test]
    async fn test_abort_discards_queue_and_waits_for_in_flight_write() {
        let sink = GatedSink::<u32>::new();
        let gate = sink.gate();
        let log = sink.log();
        let stream = WritableStream::new(sink, QueuingStrategy::count(4.0));
        let writer = stream.get_writer().unwrap();

        let first = writer.write(1);
        let second = writer.write(2);
        tokio::task::yield_now().await;

        let abort = writer.abort("stop".into());
        assert_eq!(stream.state(), WritableStreamState::Erroring);
        assert!(!log.events().contains(&"abort:stop".to_string()));

        gate.open_one();
        assert_eq!(abort.await, Ok(()));
        assert_eq!(first.await, Ok(()));
        assert_eq!(second.await, Err(StreamError::Cancelled("stop".to_string())));
        assert_eq!(log.events(), vec!["write:1", "abort:stop"]);
        assert_eq!(stream.state(), WritableStreamState::Errored);
    }

    #[tokio::test]
    async fn test_abort_and_close_are_idempotent() {
        let stream = WritableStream::new(RecordingSink::<u8>::new(), QueuingStrategy::default());
        let writer = stream.get_writer().unwrap();
        assert_eq!(writer.close().await, Ok(()));
        assert_eq!(writer.close().await, Ok(()));

        let other = WritableStream::new(RecordingSink::<u8>::new(), QueuingStrategy::default());
        let first = other.abort("one".into()).await;
        let second = other.abort("two".into()).await;
        assert_eq!(first, Ok(()));
        assert_eq!(second, Ok(()));
        assert_eq!(
            other.stored_error(),
            Some(StreamError::Cancelled("one".to_string()))
        );
    }

    #[tokio::test]
    async fn test_abort_on_closed_stream_resolves() {
        let stream = WritableStream::new(RecordingSink::<u8>::new(), QueuingStrategy::default());
        stream.close().await.unwrap();
        assert_eq!(stream.abort("late".into()).await, Ok(()));
        assert_eq!(stream.state(), WritableStreamState::Closed);
    }

    #[tokio::test]
    async fn test_failing_start_errors_the_stream() {
        let stream = WritableStream::<u8>::new(FailingStartSink, QueuingStrategy::default());
        assert_eq!(stream.state(), WritableStreamState::Errored);
        let writer = stream.get_writer().unwrap();
        assert_eq!(
            writer.write(1).await,
            Err(StreamError::sink("start failed"))
        );
    }

    #[tokio::test]
    async fn test_second_writer_is_a_lock_conflict() {
        let stream = WritableStream::new(RecordingSink::<u8>::new(), QueuingStrategy::default());
        let writer = stream.get_writer().unwrap();
        assert!(matches!(
            stream.get_writer(),
            Err(StreamError::LockConflict { stream: "writable" })
        ));
        writer.release_lock();
        assert!(stream.get_writer().is_ok());
    }
}

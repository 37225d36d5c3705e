// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Pipe orchestration: moving every chunk from a readable stream into a
//! writable stream while honouring backpressure and propagating shutdown.
//!
//! # Loop
//!
//! 1. Read one chunk from the source.
//! 2. Write it and wait for the sink to accept it before reading again.
//!
//! Awaiting each write is the pipe's backpressure. It does not wait on the
//! writer's `ready`, which never resolves for a destination whose high-water
//! mark is zero.
//!
//! # Shutdown
//!
//! | Event                     | Action (unless prevented)                    |
//! |---------------------------|----------------------------------------------|
//! | source closes             | close the destination (`prevent_close`)      |
//! | source errors             | abort the destination (`prevent_abort`)      |
//! | destination errors        | cancel the source (`prevent_cancel`)         |
//! | destination closes first  | cancel the source (`prevent_cancel`)         |
//! | abort signal fires        | both of the above, with the signal's reason  |
//!
//! The abort signal is observed at the next suspension point; a write already
//! handed to the sink is never interrupted by the pipe itself.

use std::future::Future;

use crate::config::PipeConfig;
use crate::engine::abort::{AbortSignal, DEFAULT_ABORT_REASON};
use crate::engine::readable::{
    ReadResult, ReadableStream, ReadableStreamDefaultReader, ReadableStreamState,
};
use crate::engine::transform::TransformStream;
use crate::engine::writable::{WritableStream, WritableStreamDefaultWriter, WritableStreamState};
use crate::errors::StreamError;
use crate::observability::messages::pipe::{PipeFailed, PipeFinished, PipeStarted};
use crate::observability::messages::StructuredLog;
use tracing::Instrument;

/// Controls how a pipe propagates shutdown between its two ends.
#[derive(Clone, Default)]
pub struct PipeOptions {
    pub prevent_close: bool,
    pub prevent_abort: bool,
    pub prevent_cancel: bool,
    pub signal: Option<AbortSignal>,
}

impl PipeOptions {
    pub fn with_signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }
}

impl From<&PipeConfig> for PipeOptions {
    fn from(config: &PipeConfig) -> Self {
        Self {
            prevent_close: config.prevent_close,
            prevent_abort: config.prevent_abort,
            prevent_cancel: config.prevent_cancel,
            signal: None,
        }
    }
}

/// Lock both ends up front so a conflict is reported before anything moves.
fn lock_pair<T: Send + 'static>(
    source: &ReadableStream<T>,
    destination: &WritableStream<T>,
) -> Result<(ReadableStreamDefaultReader<T>, WritableStreamDefaultWriter<T>), StreamError> {
    let reader = source.get_reader()?;
    // The reader is dropped (and unlocked) if the destination is taken.
    let writer = destination.get_writer()?;
    Ok((reader, writer))
}

struct Pipe<T: Send + 'static> {
    reader: ReadableStreamDefaultReader<T>,
    writer: WritableStreamDefaultWriter<T>,
    source: ReadableStream<T>,
    destination: WritableStream<T>,
    options: PipeOptions,
    chunks: u64,
}

async fn signalled(signal: &Option<AbortSignal>) -> StreamError {
    match signal {
        Some(signal) => signal.wait().await,
        None => std::future::pending().await,
    }
}

impl<T: Send + 'static> Pipe<T> {
    async fn run(mut self) -> Result<(), StreamError> {
        let started = PipeStarted {
            source_id: self.source.id(),
            destination_id: self.destination.id(),
            prevent_close: self.options.prevent_close,
            prevent_abort: self.options.prevent_abort,
            prevent_cancel: self.options.prevent_cancel,
        };
        let span = started.span("pipe_to");
        span.in_scope(|| started.log());

        let result = self.pump().instrument(span.clone()).await;

        span.in_scope(|| match &result {
            Ok(()) => PipeFinished {
                source_id: self.source.id(),
                destination_id: self.destination.id(),
                chunks: self.chunks,
            }
            .log(),
            Err(error) => PipeFailed {
                source_id: self.source.id(),
                destination_id: self.destination.id(),
                chunks: self.chunks,
                error,
            }
            .log(),
        });
        result
    }

    async fn pump(&mut self) -> Result<(), StreamError> {
        loop {
            if let Some(signal) = self.options.signal.as_ref().filter(|s| s.aborted()) {
                let reason = signal
                    .reason()
                    .unwrap_or_else(|| DEFAULT_ABORT_REASON.into());
                return Err(self.abort_both(reason).await);
            }
            if let Some(error) = self.check_destination().await {
                return Err(error);
            }

            let next = tokio::select! {
                biased;
                reason = signalled(&self.options.signal) => {
                    return Err(self.abort_both(reason).await);
                }
                _ = self.writer.closed() => continue,
                next = self.reader.read() => next,
            };

            match next {
                Ok(ReadResult::Chunk(chunk)) => {
                    self.chunks += 1;
                    if self.writer.write(chunk).await.is_err() {
                        continue;
                    }
                }
                Ok(ReadResult::Done) => {
                    if !self.options.prevent_close {
                        self.writer.close().await?;
                    }
                    return Ok(());
                }
                Err(error) => {
                    if !self.options.prevent_abort {
                        let _ = self.writer.abort(error.clone()).await;
                    }
                    return Err(error);
                }
            }
        }
    }

    /// Shut down because the destination errored or closed underneath us.
    async fn check_destination(&self) -> Option<StreamError> {
        let error = match self.destination.state() {
            WritableStreamState::Writable => return None,
            WritableStreamState::Erroring | WritableStreamState::Errored => self
                .destination
                .stored_error()
                .unwrap_or_else(|| StreamError::invalid_state("destination errored")),
            WritableStreamState::Closing | WritableStreamState::Closed => {
                StreamError::invalid_state("destination closed before the pipe finished")
            }
        };
        if !self.options.prevent_cancel {
            let _ = self.reader.cancel(error.clone()).await;
        }
        Some(error)
    }

    async fn abort_both(&self, reason: StreamError) -> StreamError {
        let destination_open = matches!(
            self.destination.state(),
            WritableStreamState::Writable | WritableStreamState::Closing
        );
        if !self.options.prevent_abort && destination_open {
            let _ = self.writer.abort(reason.clone()).await;
        }
        if !self.options.prevent_cancel && self.source.state() == ReadableStreamState::Readable {
            let _ = self.reader.cancel(reason.clone()).await;
        }
        reason
    }
}

impl<T: Send + 'static> ReadableStream<T> {
    /// Pipe every chunk of this stream into `destination`.
    ///
    /// Both streams are locked before this returns; a lock conflict surfaces
    /// when the returned future is awaited. Resolves once the pipe has shut
    /// down, with the error that caused the shutdown if there was one.
    pub fn pipe_to(
        &self,
        destination: &WritableStream<T>,
        options: PipeOptions,
    ) -> impl Future<Output = Result<(), StreamError>> + Send + 'static {
        let locked = lock_pair(self, destination);
        let source = self.clone();
        let destination = destination.clone();
        async move {
            let (reader, writer) = locked?;
            Pipe {
                reader,
                writer,
                source,
                destination,
                options,
                chunks: 0,
            }
            .run()
            .await
        }
    }

    /// Pipe this stream into `transform`'s writable side and hand back its
    /// readable side. The pipe runs as a background task; its failures show
    /// up on the returned stream.
    pub fn pipe_through<O: Send + 'static>(
        &self,
        transform: &TransformStream<T, O>,
        options: PipeOptions,
    ) -> Result<ReadableStream<O>, StreamError> {
        let destination = transform.writable();
        let (reader, writer) = lock_pair(self, &destination)?;
        let pipe = Pipe {
            reader,
            writer,
            source: self.clone(),
            destination,
            options,
            chunks: 0,
        };
        tokio::spawn(async move {
            let _ = pipe.run().await;
        });
        Ok(transform.readable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use parking_lot::Mutex;
    use tracing::{span, Event, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::registry::LookupSpan;
    use tracing_subscriber::Layer;

    use crate::engine::abort::AbortController;
    use crate::engine::strategy::QueuingStrategy;
    use crate::engine::stub::{
        CollectingSink, ControllerCapture, Doubler, FailingPullSource, RecordingSink,
        ScriptedSource,
    };

    #[tokio::test]
    async fn test_pipe_to_moves_every_chunk_and_closes() {
        let source = ReadableStream::from_iter(vec![1, 2, 3]);
        let sink = RecordingSink::<i32>::new();
        let log = sink.log();
        let destination = WritableStream::new(sink, QueuingStrategy::count(1.0));

        source.pipe_to(&destination, PipeOptions::default()).await.unwrap();

        assert_eq!(log.events(), vec!["write:1", "write:2", "write:3", "close"]);
        assert_eq!(destination.state(), WritableStreamState::Closed);
        assert!(!source.locked());
    }

    #[tokio::test]
    async fn test_pipe_to_zero_high_water_mark_destination() {
        let source = ReadableStream::from_iter(vec![1, 2, 3]);
        let sink = RecordingSink::<i32>::new();
        let log = sink.log();
        let destination = WritableStream::new(sink, QueuingStrategy::count(0.0));

        let piped = tokio::time::timeout(
            Duration::from_secs(2),
            source.pipe_to(&destination, PipeOptions::default()),
        )
        .await;

        assert_eq!(piped, Ok(Ok(())));
        assert_eq!(log.events(), vec!["write:1", "write:2", "write:3", "close"]);
        assert_eq!(destination.state(), WritableStreamState::Closed);
    }

    #[tokio::test]
    async fn test_prevent_close_leaves_destination_open() {
        let source = ReadableStream::from_iter(vec!["a"]);
        let (sink, chunks) = CollectingSink::new();
        let destination = WritableStream::new(sink, QueuingStrategy::default());

        let options = PipeOptions {
            prevent_close: true,
            ..PipeOptions::default()
        };
        source.pipe_to(&destination, options).await.unwrap();

        assert_eq!(*chunks.lock(), vec!["a"]);
        assert_eq!(destination.state(), WritableStreamState::Writable);
        assert!(!destination.locked());
    }

    #[tokio::test]
    async fn test_source_error_aborts_destination() {
        let source = ReadableStream::new(
            FailingPullSource::new("source broke"),
            QueuingStrategy::default(),
        );
        let sink = RecordingSink::<String>::new();
        let log = sink.log();
        let destination = WritableStream::new(sink, QueuingStrategy::default());

        let result = source.pipe_to(&destination, PipeOptions::default()).await;

        assert_eq!(result, Err(StreamError::source("source broke")));
        assert_eq!(log.events(), vec!["abort:source broke"]);
        assert_eq!(destination.state(), WritableStreamState::Errored);
    }

    #[tokio::test]
    async fn test_prevent_abort_keeps_destination_writable() {
        let source = ReadableStream::new(
            FailingPullSource::new("source broke"),
            QueuingStrategy::default(),
        );
        let destination =
            WritableStream::new(RecordingSink::<String>::new(), QueuingStrategy::default());

        let options = PipeOptions {
            prevent_abort: true,
            ..PipeOptions::default()
        };
        let result = source.pipe_to(&destination, options).await;

        assert!(result.is_err());
        assert_eq!(destination.state(), WritableStreamState::Writable);
    }

    #[tokio::test]
    async fn test_destination_error_cancels_source() {
        let scripted = ScriptedSource::new(vec![1, 2, 3], false);
        let cancel_reason = scripted.cancel_reason();
        let source = ReadableStream::new(scripted, QueuingStrategy::count(4.0));
        let destination =
            WritableStream::new(RecordingSink::<i32>::failing_on(1), QueuingStrategy::default());

        let result = source.pipe_to(&destination, PipeOptions::default()).await;

        let expected = StreamError::sink("write 1 failed");
        assert_eq!(result, Err(expected.clone()));
        assert_eq!(*cancel_reason.lock(), Some(expected));
        assert_eq!(source.state(), ReadableStreamState::Closed);
    }

    #[tokio::test]
    async fn test_prevent_cancel_leaves_source_readable() {
        let source = ReadableStream::new(
            ScriptedSource::new(vec![1, 2], false),
            QueuingStrategy::count(4.0),
        );
        let destination =
            WritableStream::new(RecordingSink::<i32>::failing_on(1), QueuingStrategy::default());

        let options = PipeOptions {
            prevent_cancel: true,
            ..PipeOptions::default()
        };
        assert!(source.pipe_to(&destination, options).await.is_err());
        assert_eq!(source.state(), ReadableStreamState::Readable);
        assert!(!source.locked());
    }

    #[tokio::test]
    async fn test_abort_signal_cancels_source_and_aborts_destination() {
        let (capture, _controller) = ControllerCapture::<String>::new();
        let source = ReadableStream::new(capture, QueuingStrategy::default());
        let sink = RecordingSink::<String>::new();
        let log = sink.log();
        let destination = WritableStream::new(sink, QueuingStrategy::default());

        let abort = AbortController::new();
        let options = PipeOptions::default().with_signal(abort.signal());
        let pipe = tokio::spawn(source.pipe_to(&destination, options));
        tokio::task::yield_now().await;

        abort.abort(Some("user stop".into()));
        let reason = StreamError::Cancelled("user stop".to_string());
        assert_eq!(pipe.await.unwrap(), Err(reason.clone()));
        assert_eq!(log.events(), vec!["abort:user stop"]);
        assert_eq!(source.state(), ReadableStreamState::Closed);
        assert_eq!(destination.stored_error(), Some(reason));
    }

    #[tokio::test]
    async fn test_already_aborted_signal_stops_before_reading() {
        let source = ReadableStream::from_iter(vec![1, 2]);
        let (sink, chunks) = CollectingSink::new();
        let destination = WritableStream::new(sink, QueuingStrategy::default());

        let abort = AbortController::new();
        abort.abort(None);
        let result = source
            .pipe_to(&destination, PipeOptions::default().with_signal(abort.signal()))
            .await;

        assert_eq!(result, Err(StreamError::Cancelled(DEFAULT_ABORT_REASON.to_string())));
        assert!(chunks.lock().is_empty());
    }

    #[tokio::test]
    async fn test_locked_ends_are_rejected_without_leaking_locks() {
        let source = ReadableStream::from_iter(vec![1]);
        let destination =
            WritableStream::new(RecordingSink::<i32>::new(), QueuingStrategy::default());
        let _writer = destination.get_writer().unwrap();

        let result = source.pipe_to(&destination, PipeOptions::default()).await;
        assert_eq!(result, Err(StreamError::LockConflict { stream: "writable" }));
        assert!(!source.locked());

        let _reader = source.get_reader().unwrap();
        let other = WritableStream::new(RecordingSink::<i32>::new(), QueuingStrategy::default());
        let result = source.pipe_to(&other, PipeOptions::default()).await;
        assert_eq!(result, Err(StreamError::LockConflict { stream: "readable" }));
        assert!(!other.locked());
    }

    #[tokio::test]
    async fn test_pipe_through_chains_transforms() {
        let source = ReadableStream::from_iter(vec![1u32, 2, 3]);
        let doubled = source
            .pipe_through(&TransformStream::new(Doubler), PipeOptions::default())
            .unwrap();
        let reader = doubled.get_reader().unwrap();

        let mut values = Vec::new();
        while let ReadResult::Chunk(value) = reader.read().await.unwrap() {
            values.push(value);
        }
        assert_eq!(values, vec![2, 4, 6]);
        assert_eq!(source.state(), ReadableStreamState::Closed);
    }

    /// Records the name of every span opened and of the span each event
    /// is emitted in.
    struct SpanRecorder {
        opened: Arc<Mutex<Vec<&'static str>>>,
        events_in: Arc<Mutex<Vec<Option<&'static str>>>>,
    }

    impl<S> Layer<S> for SpanRecorder
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        fn on_new_span(&self, attrs: &span::Attributes<'_>, _id: &span::Id, _ctx: Context<'_, S>) {
            self.opened.lock().push(attrs.metadata().name());
        }

        fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
            self.events_in.lock().push(ctx.event_span(event).map(|span| span.name()));
        }
    }

    #[tokio::test]
    async fn test_pipe_logs_inside_its_span() {
        let opened = Arc::new(Mutex::new(Vec::new()));
        let events_in = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(SpanRecorder {
            opened: Arc::clone(&opened),
            events_in: Arc::clone(&events_in),
        });
        let _default = tracing::subscriber::set_default(subscriber);

        let source = ReadableStream::from_iter(vec![1, 2]);
        let (sink, _chunks) = CollectingSink::new();
        let destination = WritableStream::new(sink, QueuingStrategy::default());
        source.pipe_to(&destination, PipeOptions::default()).await.unwrap();

        let opened = opened.lock().clone();
        assert_eq!(opened.iter().filter(|name| **name == "stream").count(), 2);
        assert!(opened.contains(&"pipe"));
        // PipeStarted and PipeFinished at least.
        assert!(events_in.lock().iter().filter(|name| **name == Some("pipe")).count() >= 2);
    }
}

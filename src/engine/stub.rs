// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Stub sources and sinks shared by the engine's tests.

use std::fmt::Display;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use crate::engine::pipe::PipeOptions;
use crate::engine::readable::{ReadResult, ReadableStream, ReadableStreamDefaultController};
use crate::engine::transform::{TransformStream, TransformStreamDefaultController};
use crate::engine::writable::WritableStreamDefaultController;
use crate::errors::StreamError;
use crate::traits::{Transformer, UnderlyingSink, UnderlyingSource};

/// Shared, ordered record of what a stub observed.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.events.lock().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

/// Enqueues a fixed list of chunks from `start`, optionally closing afterwards.
pub struct ScriptedSource<T> {
    chunks: Vec<T>,
    close: bool,
    cancel_reason: Arc<Mutex<Option<StreamError>>>,
}

impl<T> ScriptedSource<T> {
    pub fn new(chunks: Vec<T>, close: bool) -> Self {
        Self {
            chunks,
            close,
            cancel_reason: Arc::new(Mutex::new(None)),
        }
    }

    pub fn cancel_reason(&self) -> Arc<Mutex<Option<StreamError>>> {
        Arc::clone(&self.cancel_reason)
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> UnderlyingSource<T> for ScriptedSource<T> {
    fn start(&self, controller: &ReadableStreamDefaultController<T>) -> Result<(), StreamError> {
        for chunk in &self.chunks {
            controller.enqueue(chunk.clone())?;
        }
        if self.close {
            controller.close()?;
        }
        Ok(())
    }

    async fn cancel(&self, reason: StreamError) -> Result<(), StreamError> {
        *self.cancel_reason.lock() = Some(reason);
        Ok(())
    }
}

/// Does nothing on its own; hands its controller to the test.
pub struct ControllerCapture<T: Send + 'static> {
    slot: CapturedController<T>,
}

pub struct CapturedController<T: Send + 'static> {
    slot: Arc<Mutex<Option<ReadableStreamDefaultController<T>>>>,
}

impl<T: Send + 'static> Clone for CapturedController<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T: Send + 'static> CapturedController<T> {
    pub fn get(&self) -> Option<ReadableStreamDefaultController<T>> {
        self.slot.lock().clone()
    }
}

impl<T: Send + 'static> ControllerCapture<T> {
    pub fn new() -> (Self, CapturedController<T>) {
        let slot = CapturedController {
            slot: Arc::new(Mutex::new(None)),
        };
        (Self { slot: slot.clone() }, slot)
    }
}

#[async_trait]
impl<T: Send + 'static> UnderlyingSource<T> for ControllerCapture<T> {
    fn start(&self, controller: &ReadableStreamDefaultController<T>) -> Result<(), StreamError> {
        *self.slot.slot.lock() = Some(controller.clone());
        Ok(())
    }
}

/// Enqueues 1, 2, 3, ... one chunk per pull, closing after `max` chunks.
pub struct CountingSource {
    max: usize,
    pulls: Arc<AtomicUsize>,
}

impl CountingSource {
    pub fn new(max: usize) -> Self {
        Self {
            max,
            pulls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn pulls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.pulls)
    }
}

#[async_trait]
impl UnderlyingSource<usize> for CountingSource {
    async fn pull(
        &self,
        controller: &ReadableStreamDefaultController<usize>,
    ) -> Result<(), StreamError> {
        let n = self.pulls.fetch_add(1, Ordering::SeqCst) + 1;
        if n > self.max {
            controller.close()
        } else {
            controller.enqueue(n)
        }
    }
}

pub struct FailingStartSource;

#[async_trait]
impl UnderlyingSource<String> for FailingStartSource {
    fn start(
        &self,
        _controller: &ReadableStreamDefaultController<String>,
    ) -> Result<(), StreamError> {
        Err(StreamError::source("start failed"))
    }
}

/// Fails every pull with the given message.
pub struct FailingPullSource {
    message: &'static str,
}

impl FailingPullSource {
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}

#[async_trait]
impl UnderlyingSource<String> for FailingPullSource {
    async fn pull(
        &self,
        _controller: &ReadableStreamDefaultController<String>,
    ) -> Result<(), StreamError> {
        Err(StreamError::source(self.message))
    }
}

pub struct WritableControllerSlot<T: Send + 'static> {
    slot: Arc<Mutex<Option<WritableStreamDefaultController<T>>>>,
}

impl<T: Send + 'static> Clone for WritableControllerSlot<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T: Send + 'static> WritableControllerSlot<T> {
    pub fn get(&self) -> Option<WritableStreamDefaultController<T>> {
        self.slot.lock().clone()
    }
}

/// Logs every write, close and abort. Optionally fails the nth write.
pub struct RecordingSink<T: Send + 'static> {
    log: EventLog,
    fail_on: Option<usize>,
    writes: AtomicUsize,
    controller: WritableControllerSlot<T>,
}

impl<T: Send + 'static> RecordingSink<T> {
    pub fn new() -> Self {
        Self {
            log: EventLog::default(),
            fail_on: None,
            writes: AtomicUsize::new(0),
            controller: WritableControllerSlot {
                slot: Arc::new(Mutex::new(None)),
            },
        }
    }

    pub fn failing_on(write_number: usize) -> Self {
        Self {
            fail_on: Some(write_number),
            ..Self::new()
        }
    }

    pub fn log(&self) -> EventLog {
        self.log.clone()
    }

    pub fn controller_slot(&self) -> WritableControllerSlot<T> {
        self.controller.clone()
    }
}

#[async_trait]
impl<T: Display + Send + 'static> UnderlyingSink<T> for RecordingSink<T> {
    fn start(&self, controller: &WritableStreamDefaultController<T>) -> Result<(), StreamError> {
        *self.controller.slot.lock() = Some(controller.clone());
        Ok(())
    }

    async fn write(
        &self,
        chunk: T,
        _controller: &WritableStreamDefaultController<T>,
    ) -> Result<(), StreamError> {
        let n = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on == Some(n) {
            return Err(StreamError::sink(format!("write {} failed", n)));
        }
        self.log.push(format!("write:{}", chunk));
        Ok(())
    }

    async fn close(&self) -> Result<(), StreamError> {
        self.log.push("close");
        Ok(())
    }

    async fn abort(&self, reason: StreamError) -> Result<(), StreamError> {
        self.log.push(format!("abort:{}", reason));
        Ok(())
    }
}

/// Lets writes through one at a time, as the test opens the gate.
pub struct GatedSink<T> {
    gate: Gate,
    log: EventLog,
    _chunk: std::marker::PhantomData<fn(T)>,
}

#[derive(Clone)]
pub struct Gate {
    permits: Arc<Semaphore>,
}

impl Gate {
    pub fn open_one(&self) {
        self.permits.add_permits(1);
    }
}

impl<T> GatedSink<T> {
    pub fn new() -> Self {
        Self {
            gate: Gate {
                permits: Arc::new(Semaphore::new(0)),
            },
            log: EventLog::default(),
            _chunk: std::marker::PhantomData,
        }
    }

    pub fn gate(&self) -> Gate {
        self.gate.clone()
    }

    pub fn log(&self) -> EventLog {
        self.log.clone()
    }
}

#[async_trait]
impl<T: Display + Send + 'static> UnderlyingSink<T> for GatedSink<T> {
    async fn write(
        &self,
        chunk: T,
        _controller: &WritableStreamDefaultController<T>,
    ) -> Result<(), StreamError> {
        let permit = self
            .gate
            .permits
            .acquire()
            .await
            .map_err(|e| StreamError::sink(e.to_string()))?;
        permit.forget();
        self.log.push(format!("write:{}", chunk));
        Ok(())
    }

    async fn close(&self) -> Result<(), StreamError> {
        self.log.push("close");
        Ok(())
    }

    async fn abort(&self, reason: StreamError) -> Result<(), StreamError> {
        self.log.push(format!("abort:{}", reason));
        Ok(())
    }
}

pub struct FailingStartSink;

#[async_trait]
impl UnderlyingSink<u8> for FailingStartSink {
    fn start(&self, _controller: &WritableStreamDefaultController<u8>) -> Result<(), StreamError> {
        Err(StreamError::sink("start failed"))
    }
}

/// Writes take forever unless the stream is aborted.
pub struct AbortAwareSink;

impl AbortAwareSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl UnderlyingSink<String> for AbortAwareSink {
    async fn write(
        &self,
        _chunk: String,
        controller: &WritableStreamDefaultController<String>,
    ) -> Result<(), StreamError> {
        let signal = controller.abort_signal();
        tokio::select! {
            _ = signal.cancelled() => Err(StreamError::sink("write interrupted")),
            _ = tokio::time::sleep(Duration::from_secs(30)) => Ok(()),
        }
    }
}

/// Collects every chunk it is given.
pub struct CollectingSink<T> {
    chunks: Arc<Mutex<Vec<T>>>,
}

impl<T> CollectingSink<T> {
    pub fn new() -> (Self, Arc<Mutex<Vec<T>>>) {
        let chunks = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                chunks: Arc::clone(&chunks),
            },
            chunks,
        )
    }
}

#[async_trait]
impl<T: Send + 'static> UnderlyingSink<T> for CollectingSink<T> {
    async fn write(
        &self,
        chunk: T,
        _controller: &WritableStreamDefaultController<T>,
    ) -> Result<(), StreamError> {
        self.chunks.lock().push(chunk);
        Ok(())
    }
}

/// Emits twice every number it is given.
pub struct Doubler;

#[async_trait]
impl Transformer<u32, u32> for Doubler {
    async fn transform(
        &self,
        chunk: u32,
        controller: &TransformStreamDefaultController<u32>,
    ) -> Result<(), StreamError> {
        controller.enqueue(chunk * 2)
    }

    fn name(&self) -> &'static str {
        "doubler"
    }
}

/// Pipe `inputs` through `transformer` and collect everything it emits.
pub async fn run_transformer<X>(transformer: X, inputs: &[&str]) -> Result<Vec<String>, StreamError>
where
    X: Transformer<String, String> + 'static,
{
    let chunks: Vec<String> = inputs.iter().map(|s| s.to_string()).collect();
    let source = ReadableStream::from_iter(chunks);
    let output = source.pipe_through(&TransformStream::new(transformer), PipeOptions::default())?;
    let reader = output.get_reader()?;
    let mut chunks = Vec::new();
    while let ReadResult::Chunk(chunk) = reader.read().await? {
        chunks.push(chunk);
    }
    Ok(chunks)
}

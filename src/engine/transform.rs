// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Transform streams: a writable side feeding a [`Transformer`] whose output
//! appears on a readable side.
//!
//! The two sides are coupled through a backpressure flag. While it is set,
//! writes wait before reaching the transformer; the readable side clears it
//! whenever its consumer wants more data, and the controller sets it again as
//! soon as an `enqueue` leaves the readable side full.
//!
//! Errors cross over exactly once: a failure on either side errors the other,
//! and a blocked write is released so it can observe the error.

use std::sync::{Arc, OnceLock, Weak};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::engine::completion::Completion;
use crate::engine::readable::{ReadableStream, ReadableStreamDefaultController};
use crate::engine::strategy::QueuingStrategy;
use crate::engine::writable::{
    WritableInner, WritableStatus, WritableStream, WritableStreamDefaultController,
};
use crate::errors::StreamError;
use crate::observability::messages::transform::{
    TransformFailed, TransformFlushed, TransformTerminated,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{IdentityTransformer, Transformer, UnderlyingSink, UnderlyingSource};

struct Backpressure {
    active: bool,
    change: Completion,
}

/// State shared by both sides of one transform stream and its controller.
struct TransformShared<O: Send + 'static> {
    name: &'static str,
    readable: OnceLock<ReadableStreamDefaultController<O>>,
    backpressure: Mutex<Backpressure>,
    error_writable: Box<dyn Fn(StreamError) + Send + Sync>,
}

impl<O: Send + 'static> TransformShared<O> {
    /// Flip the flag and return the completion that settles on the next flip.
    fn set_backpressure(&self, active: bool) -> Completion {
        let mut backpressure = self.backpressure.lock();
        backpressure.change.resolve();
        backpressure.change = Completion::pending();
        backpressure.active = active;
        backpressure.change.clone()
    }

    fn pending_change(&self) -> Option<Completion> {
        let backpressure = self.backpressure.lock();
        backpressure.active.then(|| backpressure.change.clone())
    }

    fn unblock_write(&self) {
        if self.backpressure.lock().active {
            self.set_backpressure(false);
        }
    }

    /// Settle the current change so a pull parked on it can finish.
    fn release_pull(&self) {
        self.backpressure.lock().change.resolve();
    }

    fn error_writable_and_unblock_write(&self, error: StreamError) {
        (self.error_writable)(error);
        self.unblock_write();
    }

    /// Error both sides.
    fn error(&self, error: StreamError) {
        if let Some(readable) = self.readable.get() {
            readable.error(error.clone());
        }
        self.error_writable_and_unblock_write(error);
        self.release_pull();
    }

    fn readable(&self) -> Result<&ReadableStreamDefaultController<O>, StreamError> {
        self.readable
            .get()
            .ok_or_else(|| StreamError::invalid_state("transform stream is not started"))
    }
}

/// Handle given to a [`Transformer`] for producing output.
pub struct TransformStreamDefaultController<O: Send + 'static> {
    shared: Arc<TransformShared<O>>,
}

impl<O: Send + 'static> Clone for TransformStreamDefaultController<O> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<O: Send + 'static> TransformStreamDefaultController<O> {
    /// Emit `chunk` on the readable side.
    pub fn enqueue(&self, chunk: O) -> Result<(), StreamError> {
        let readable = self.shared.readable()?;
        if !readable.can_close_or_enqueue() {
            return Err(StreamError::invalid_state(
                "readable side is not accepting chunks",
            ));
        }
        if let Err(error) = readable.enqueue(chunk) {
            self.shared.error_writable_and_unblock_write(error.clone());
            return Err(readable.stored_error().unwrap_or(error));
        }
        if readable.has_backpressure() && !self.shared.backpressure.lock().active {
            self.shared.set_backpressure(true);
        }
        Ok(())
    }

    /// Error both sides with `reason`.
    pub fn error(&self, reason: StreamError) {
        self.shared.error(reason);
    }

    /// Close the readable side and error the writable side; nothing more
    /// will be transformed.
    pub fn terminate(&self) {
        TransformTerminated {
            transformer: self.shared.name,
        }
        .log();
        if let Some(readable) = self.shared.readable.get() {
            let _ = readable.close();
        }
        let terminated = StreamError::invalid_state("transform stream terminated");
        self.shared.error_writable_and_unblock_write(terminated);
        self.shared.release_pull();
    }

    /// Desired size of the readable side.
    pub fn desired_size(&self) -> Option<f64> {
        self.shared.readable.get()?.desired_size()
    }
}

struct TransformSink<I: Send + 'static, O: Send + 'static> {
    transformer: Arc<dyn Transformer<I, O>>,
    shared: Arc<TransformShared<O>>,
    writable: Arc<OnceLock<Weak<WritableInner<I>>>>,
}

impl<I: Send + 'static, O: Send + 'static> TransformSink<I, O> {
    fn controller(&self) -> TransformStreamDefaultController<O> {
        TransformStreamDefaultController {
            shared: Arc::clone(&self.shared),
        }
    }

    fn writable_erroring(&self) -> Option<StreamError> {
        let writable = self.writable.get()?.upgrade()?;
        let state = writable.state.lock();
        match &state.status {
            WritableStatus::Erroring(error) => Some(error.clone()),
            _ => None,
        }
    }

    async fn perform_transform(&self, chunk: I) -> Result<(), StreamError> {
        let result = self.transformer.transform(chunk, &self.controller()).await;
        if let Err(error) = &result {
            TransformFailed {
                transformer: self.shared.name,
                error,
            }
            .log();
            self.shared.error(error.clone());
        }
        result
    }
}

#[async_trait]
impl<I: Send + 'static, O: Send + 'static> UnderlyingSink<I> for TransformSink<I, O> {
    async fn write(
        &self,
        chunk: I,
        _controller: &WritableStreamDefaultController<I>,
    ) -> Result<(), StreamError> {
        if let Some(change) = self.shared.pending_change() {
            let _ = change.wait().await;
        }
        // The readable side may have been cancelled before this write ran.
        if let Some(error) = self.writable_erroring() {
            return Err(error);
        }
        self.perform_transform(chunk).await
    }

    async fn close(&self) -> Result<(), StreamError> {
        let controller = self.controller();
        if let Err(error) = self.transformer.flush(&controller).await {
            TransformFailed {
                transformer: self.shared.name,
                error: &error,
            }
            .log();
            self.shared.error(error.clone());
            return Err(error);
        }
        TransformFlushed {
            transformer: self.shared.name,
        }
        .log();

        let readable = self.shared.readable()?;
        if let Some(error) = readable.stored_error() {
            return Err(error);
        }
        if readable.can_close_or_enqueue() {
            readable.close()?;
        }
        self.shared.release_pull();
        Ok(())
    }

    async fn abort(&self, reason: StreamError) -> Result<(), StreamError> {
        self.shared.error(reason);
        Ok(())
    }
}

struct TransformSource<O: Send + 'static> {
    shared: Arc<TransformShared<O>>,
}

#[async_trait]
impl<O: Send + 'static> UnderlyingSource<O> for TransformSource<O> {
    fn start(&self, controller: &ReadableStreamDefaultController<O>) -> Result<(), StreamError> {
        let _ = self.shared.readable.set(controller.clone());
        Ok(())
    }

    /// Release blocked writes, then stay pending until an `enqueue` fills the
    /// readable side again so no second pull is scheduled meanwhile.
    async fn pull(
        &self,
        _controller: &ReadableStreamDefaultController<O>,
    ) -> Result<(), StreamError> {
        let change = self.shared.set_backpressure(false);
        let _ = change.wait().await;
        Ok(())
    }

    async fn cancel(&self, reason: StreamError) -> Result<(), StreamError> {
        self.shared.error_writable_and_unblock_write(reason);
        self.shared.release_pull();
        Ok(())
    }
}

/// A writable side of `I` chunks and a readable side of `O` chunks joined by
/// a [`Transformer`].
pub struct TransformStream<I: Send + 'static, O: Send + 'static> {
    writable: WritableStream<I>,
    readable: ReadableStream<O>,
}

impl<I: Send + 'static, O: Send + 'static> Clone for TransformStream<I, O> {
    fn clone(&self) -> Self {
        Self {
            writable: self.writable.clone(),
            readable: self.readable.clone(),
        }
    }
}

impl<I: Send + 'static, O: Send + 'static> TransformStream<I, O> {
    /// Writable side buffers one chunk; readable side buffers none.
    pub fn new<X>(transformer: X) -> Self
    where
        X: Transformer<I, O> + 'static,
    {
        Self::with_strategies(transformer, QueuingStrategy::count(1.0), QueuingStrategy::count(0.0))
    }

    pub fn with_strategies<X>(
        transformer: X,
        writable_strategy: QueuingStrategy<I>,
        readable_strategy: QueuingStrategy<O>,
    ) -> Self
    where
        X: Transformer<I, O> + 'static,
    {
        Self::from_transformer(Arc::new(transformer), writable_strategy, readable_strategy)
    }

    pub fn from_transformer(
        transformer: Arc<dyn Transformer<I, O>>,
        writable_strategy: QueuingStrategy<I>,
        readable_strategy: QueuingStrategy<O>,
    ) -> Self {
        let writable_slot: Arc<OnceLock<Weak<WritableInner<I>>>> = Arc::new(OnceLock::new());
        let error_writable = {
            let writable_slot = Arc::clone(&writable_slot);
            move |error: StreamError| {
                if let Some(writable) = writable_slot.get().and_then(Weak::upgrade) {
                    writable.controller_error(error);
                }
            }
        };

        let shared = Arc::new(TransformShared {
            name: transformer.name(),
            readable: OnceLock::new(),
            backpressure: Mutex::new(Backpressure {
                active: false,
                change: Completion::pending(),
            }),
            error_writable: Box::new(error_writable),
        });
        shared.set_backpressure(true);

        let readable = ReadableStream::new(
            TransformSource {
                shared: Arc::clone(&shared),
            },
            readable_strategy,
        );
        let writable = WritableStream::new(
            TransformSink {
                transformer: Arc::clone(&transformer),
                shared: Arc::clone(&shared),
                writable: Arc::clone(&writable_slot),
            },
            writable_strategy,
        );
        let _ = writable_slot.set(Arc::downgrade(&writable.inner));

        let controller = TransformStreamDefaultController {
            shared: Arc::clone(&shared),
        };
        if let Err(error) = transformer.start(&controller) {
            TransformFailed {
                transformer: shared.name,
                error: &error,
            }
            .log();
            shared.error(error);
        }

        Self { writable, readable }
    }

    pub fn readable(&self) -> ReadableStream<O> {
        self.readable.clone()
    }

    pub fn writable(&self) -> WritableStream<I> {
        self.writable.clone()
    }
}

impl<T: Send + 'static> TransformStream<T, T> {
    /// Transform stream that passes chunks through unchanged.
    pub fn identity() -> Self {
        Self::new(IdentityTransformer::new())
    }
}

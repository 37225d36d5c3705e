// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The stream engine.
//!
//! * [`readable`] - pull-based producers with a size-accounted queue
//! * [`writable`] - sinks fed one chunk at a time, with backpressure
//! * [`transform`] - a writable side coupled to a readable side
//! * [`pipe`] - moving data between streams and propagating shutdown
//!
//! All streams must be created inside a Tokio runtime: source, sink and
//! transformer algorithms run as spawned tasks.

pub mod abort;
pub mod completion;
pub mod pipe;
pub mod queue;
pub mod readable;
pub mod strategy;
pub mod transform;
pub mod writable;

#[cfg(test)]
pub mod stub;

use std::sync::atomic::{AtomicU64, Ordering};

pub use abort::{AbortController, AbortSignal};
pub use completion::Completion;
pub use pipe::PipeOptions;
pub use queue::Queue;
pub use readable::{
    ReadResult, ReadableStream, ReadableStreamDefaultController, ReadableStreamDefaultReader,
    ReadableStreamState,
};
pub use strategy::QueuingStrategy;
pub use transform::{TransformStream, TransformStreamDefaultController};
pub use writable::{
    WritableStream, WritableStreamDefaultController, WritableStreamDefaultWriter,
    WritableStreamState,
};

static NEXT_STREAM_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique id used to correlate log lines and lock owners.
pub(crate) fn next_id() -> u64 {
    NEXT_STREAM_ID.fetch_add(1, Ordering::Relaxed)
}

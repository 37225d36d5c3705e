// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements the `Display` trait to provide consistent,
//! human-readable output, and [`StructuredLog`] to emit it as a `tracing`
//! event (with every field attached) or to open a span around the work it
//! describes.
//!
//! # Organization
//!
//! * `stream` - Stream creation, close, error, cancel and abort
//! * `transform` - Transformer lifecycle events
//! * `pipe` - Pipe lifecycle events
//!
//! # Usage Pattern
//!
//! ```rust
//! use streamwood::observability::messages::pipe::PipeStarted;
//! use streamwood::observability::messages::StructuredLog;
//!
//! let msg = PipeStarted {
//!     source_id: 1,
//!     destination_id: 2,
//!     prevent_close: false,
//!     prevent_abort: false,
//!     prevent_cancel: false,
//! };
//!
//! msg.log();
//! ```

use tracing::Span;

pub mod pipe;
pub mod stream;
pub mod transform;

/// A message that knows its own log level and structured fields.
pub trait StructuredLog {
    /// Emit the message as a `tracing` event at its documented level.
    fn log(&self);

    /// Open a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}

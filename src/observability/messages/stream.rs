// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for readable and writable stream lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Stream construction and queuing strategy
//! * Terminal transitions (closed, errored)
//! * Consumer-initiated shutdown (cancel, abort)
//! * Lock contention

use crate::errors::StreamError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A stream was constructed.
///
/// # Log Level
/// `debug!` - Lifecycle detail
///
/// # Example
/// ```
/// use streamwood::observability::messages::stream::StreamCreated;
///
/// let msg = StreamCreated {
///     kind: "readable",
///     stream_id: 1,
///     high_water_mark: 4.0,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct StreamCreated<'a> {
    pub kind: &'a str,
    pub stream_id: u64,
    pub high_water_mark: f64,
}

impl Display for StreamCreated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Created {} stream {} with high_water_mark={}",
            self.kind, self.stream_id, self.high_water_mark
        )
    }
}

impl StructuredLog for StreamCreated<'_> {
    fn log(&self) {
        tracing::debug!(
            kind = self.kind,
            stream_id = self.stream_id,
            high_water_mark = self.high_water_mark,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "stream",
            span_name = name,
            kind = self.kind,
            stream_id = self.stream_id,
            high_water_mark = self.high_water_mark,
        )
    }
}

/// A stream reached the closed state.
///
/// # Log Level
/// `debug!` - Lifecycle detail
pub struct StreamClosed<'a> {
    pub kind: &'a str,
    pub stream_id: u64,
}

impl Display for StreamClosed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} stream {} closed", self.kind, self.stream_id)
    }
}

impl StructuredLog for StreamClosed<'_> {
    fn log(&self) {
        tracing::debug!(kind = self.kind, stream_id = self.stream_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "stream_closed",
            span_name = name,
            kind = self.kind,
            stream_id = self.stream_id,
        )
    }
}

/// A stream errored. For writable streams this is logged when erroring starts.
///
/// # Log Level
/// `warn!` - Algorithm or consumer failure
///
/// # Example
/// ```
/// use streamwood::errors::StreamError;
/// use streamwood::observability::messages::stream::StreamErrored;
///
/// let error = StreamError::sink("disk full");
/// let msg = StreamErrored {
///     kind: "writable",
///     stream_id: 3,
///     error: &error,
/// };
///
/// assert_eq!(msg.to_string(), "writable stream 3 errored: disk full");
/// ```
pub struct StreamErrored<'a> {
    pub kind: &'a str,
    pub stream_id: u64,
    pub error: &'a StreamError,
}

impl Display for StreamErrored<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} stream {} errored: {}", self.kind, self.stream_id, self.error)
    }
}

impl StructuredLog for StreamErrored<'_> {
    fn log(&self) {
        tracing::warn!(
            kind = self.kind,
            stream_id = self.stream_id,
            error_kind = self.error.kind(),
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "stream_errored",
            span_name = name,
            kind = self.kind,
            stream_id = self.stream_id,
            error = %self.error,
        )
    }
}

/// A readable stream was cancelled by its consumer.
///
/// # Log Level
/// `debug!` - Consumer-initiated shutdown
pub struct StreamCancelled<'a> {
    pub kind: &'a str,
    pub stream_id: u64,
    pub reason: &'a StreamError,
}

impl Display for StreamCancelled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} stream {} cancelled: {}", self.kind, self.stream_id, self.reason)
    }
}

impl StructuredLog for StreamCancelled<'_> {
    fn log(&self) {
        tracing::debug!(
            kind = self.kind,
            stream_id = self.stream_id,
            reason = %self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "stream_cancelled",
            span_name = name,
            kind = self.kind,
            stream_id = self.stream_id,
            reason = %self.reason,
        )
    }
}

/// A writable stream was aborted by its producer.
///
/// # Log Level
/// `debug!` - Producer-initiated shutdown
pub struct StreamAborted<'a> {
    pub kind: &'a str,
    pub stream_id: u64,
    pub reason: &'a StreamError,
}

impl Display for StreamAborted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} stream {} aborted: {}", self.kind, self.stream_id, self.reason)
    }
}

impl StructuredLog for StreamAborted<'_> {
    fn log(&self) {
        tracing::debug!(
            kind = self.kind,
            stream_id = self.stream_id,
            reason = %self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "stream_aborted",
            span_name = name,
            kind = self.kind,
            stream_id = self.stream_id,
            reason = %self.reason,
        )
    }
}

/// A second reader or writer was requested on a locked stream.
///
/// # Log Level
/// `debug!` - The caller receives the error; this only aids tracing
pub struct LockConflict<'a> {
    pub kind: &'a str,
    pub stream_id: u64,
}

impl Display for LockConflict<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} stream {} is already locked", self.kind, self.stream_id)
    }
}

impl StructuredLog for LockConflict<'_> {
    fn log(&self) {
        tracing::debug!(kind = self.kind, stream_id = self.stream_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "lock_conflict",
            span_name = name,
            kind = self.kind,
            stream_id = self.stream_id,
        )
    }
}

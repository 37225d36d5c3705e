// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for transformer lifecycle events.

use crate::errors::StreamError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A transformer's `start`, `transform` or `flush` failed. Both sides of the
/// transform stream are errored with `error`.
///
/// # Log Level
/// `warn!` - Algorithm failure
///
/// # Example
/// ```
/// use streamwood::errors::StreamError;
/// use streamwood::observability::messages::transform::TransformFailed;
///
/// let error = StreamError::transform("not a number");
/// let msg = TransformFailed {
///     transformer: "parse_int",
///     error: &error,
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct TransformFailed<'a> {
    pub transformer: &'a str,
    pub error: &'a StreamError,
}

impl Display for TransformFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Transformer '{}' failed: {}", self.transformer, self.error)
    }
}

impl StructuredLog for TransformFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            transformer = self.transformer,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "transform_failed",
            span_name = name,
            transformer = self.transformer,
            error = %self.error,
        )
    }
}

/// A transformer's `flush` completed and its readable side is closing.
///
/// # Log Level
/// `debug!` - Lifecycle detail
pub struct TransformFlushed<'a> {
    pub transformer: &'a str,
}

impl Display for TransformFlushed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Transformer '{}' flushed", self.transformer)
    }
}

impl StructuredLog for TransformFlushed<'_> {
    fn log(&self) {
        tracing::debug!(transformer = self.transformer, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("transform_flushed", span_name = name, transformer = self.transformer)
    }
}

/// The transformer called `terminate()` on its controller.
///
/// # Log Level
/// `debug!` - Lifecycle detail
pub struct TransformTerminated<'a> {
    pub transformer: &'a str,
}

impl Display for TransformTerminated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Transformer '{}' terminated its stream", self.transformer)
    }
}

impl StructuredLog for TransformTerminated<'_> {
    fn log(&self) {
        tracing::debug!(transformer = self.transformer, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "transform_terminated",
            span_name = name,
            transformer = self.transformer
        )
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for pipe lifecycle events.

use crate::errors::StreamError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A pipe locked both ends and started moving chunks.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use streamwood::observability::messages::pipe::PipeStarted;
///
/// let msg = PipeStarted {
///     source_id: 1,
///     destination_id: 2,
///     prevent_close: true,
///     prevent_abort: false,
///     prevent_cancel: false,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct PipeStarted {
    pub source_id: u64,
    pub destination_id: u64,
    pub prevent_close: bool,
    pub prevent_abort: bool,
    pub prevent_cancel: bool,
}

impl Display for PipeStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Piping stream {} into stream {} (prevent_close={}, prevent_abort={}, prevent_cancel={})",
            self.source_id,
            self.destination_id,
            self.prevent_close,
            self.prevent_abort,
            self.prevent_cancel
        )
    }
}

impl StructuredLog for PipeStarted {
    fn log(&self) {
        tracing::info!(
            source_id = self.source_id,
            destination_id = self.destination_id,
            prevent_close = self.prevent_close,
            prevent_abort = self.prevent_abort,
            prevent_cancel = self.prevent_cancel,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "pipe",
            span_name = name,
            source_id = self.source_id,
            destination_id = self.destination_id,
        )
    }
}

/// The source closed and the pipe shut down cleanly.
///
/// # Log Level
/// `debug!` - Lifecycle detail
pub struct PipeFinished {
    pub source_id: u64,
    pub destination_id: u64,
    pub chunks: u64,
}

impl Display for PipeFinished {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipe from stream {} into stream {} finished after {} chunks",
            self.source_id, self.destination_id, self.chunks
        )
    }
}

impl StructuredLog for PipeFinished {
    fn log(&self) {
        tracing::debug!(
            source_id = self.source_id,
            destination_id = self.destination_id,
            chunks = self.chunks,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "pipe_finished",
            span_name = name,
            source_id = self.source_id,
            destination_id = self.destination_id,
            chunks = self.chunks,
        )
    }
}

/// The pipe shut down because of an error, a cancel or an abort signal.
///
/// # Log Level
/// `warn!` - Failure requiring attention
pub struct PipeFailed<'a> {
    pub source_id: u64,
    pub destination_id: u64,
    pub chunks: u64,
    pub error: &'a StreamError,
}

impl Display for PipeFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipe from stream {} into stream {} failed after {} chunks: {}",
            self.source_id, self.destination_id, self.chunks, self.error
        )
    }
}

impl StructuredLog for PipeFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            source_id = self.source_id,
            destination_id = self.destination_id,
            chunks = self.chunks,
            error_kind = self.error.kind(),
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "pipe_failed",
            span_name = name,
            source_id = self.source_id,
            destination_id = self.destination_id,
            error = %self.error,
        )
    }
}

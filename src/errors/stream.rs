// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors surfaced by readable, writable and transform streams.
///
/// A `StreamError` is also the *reason* type for cancellation and abort, so a
/// caller-supplied reason travels through the engine unchanged and is handed
/// back verbatim to every reader, writer or underlying algorithm that observes
/// it. Algorithm variants and `Cancelled` display only their message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StreamError {
    /// The underlying source's `start`, `pull` or `cancel` failed.
    #[error("{0}")]
    SourceAlgorithm(String),

    /// The underlying sink's `start`, `write`, `close` or `abort` failed.
    #[error("{0}")]
    SinkAlgorithm(String),

    /// A transformer's `start`, `transform` or `flush` failed.
    #[error("{0}")]
    TransformAlgorithm(String),

    /// The queuing strategy's size function failed or returned a negative or
    /// non-finite size.
    #[error("invalid chunk size: {0}")]
    SizeFunction(String),

    /// A reader or writer was requested on a stream that is already locked.
    #[error("{stream} stream is already locked to a reader or writer")]
    LockConflict { stream: &'static str },

    /// The operation is not valid for the stream's current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A caller-supplied cancellation or abort reason.
    #[error("{0}")]
    Cancelled(String),
}

impl StreamError {
    pub fn source(message: impl Into<String>) -> Self {
        StreamError::SourceAlgorithm(message.into())
    }

    pub fn sink(message: impl Into<String>) -> Self {
        StreamError::SinkAlgorithm(message.into())
    }

    pub fn transform(message: impl Into<String>) -> Self {
        StreamError::TransformAlgorithm(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        StreamError::InvalidState(message.into())
    }

    /// Short machine-friendly name used in structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            StreamError::SourceAlgorithm(_) => "source_algorithm",
            StreamError::SinkAlgorithm(_) => "sink_algorithm",
            StreamError::TransformAlgorithm(_) => "transform_algorithm",
            StreamError::SizeFunction(_) => "size_function",
            StreamError::LockConflict { .. } => "lock_conflict",
            StreamError::InvalidState(_) => "invalid_state",
            StreamError::Cancelled(_) => "cancelled",
        }
    }
}

impl From<&str> for StreamError {
    fn from(reason: &str) -> Self {
        StreamError::Cancelled(reason.to_string())
    }
}

impl From<String> for StreamError {
    fn from(reason: String) -> Self {
        StreamError::Cancelled(reason)
    }
}

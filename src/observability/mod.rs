// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! This module provides centralized message types for all diagnostic and operational
//! logging throughout Streamwood. Message types follow a struct-based pattern
//! with `Display` trait implementation to:
//!
//! * Eliminate magic strings scattered throughout the codebase
//! * Keep field names consistent between the human-readable line and the structured fields
//! * Provide consistent, structured logging output
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::stream` - Readable and writable stream lifecycle events
//! * `messages::transform` - Transformer failures, flushes and termination
//! * `messages::pipe` - Pipe start, completion and failure
//!
//! # Usage
//!
//! ```rust
//! use streamwood::errors::StreamError;
//! use streamwood::observability::messages::stream::StreamErrored;
//!
//! let error = StreamError::source("disk went away");
//! let msg = StreamErrored {
//!     kind: "readable",
//!     stream_id: 7,
//!     error: &error,
//! };
//!
//! tracing::warn!("{}", msg);
//! ```

pub mod messages;

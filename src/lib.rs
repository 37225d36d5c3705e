// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod config;       // YAML pipeline configuration
pub mod engine;       // streams, controllers and pipes
pub mod errors;       // error handling
pub mod observability;
pub mod traits;       // source, sink and transformer abstractions
pub mod transformers; // built-in text transformers

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::errors::StreamError;

pub const DEFAULT_ABORT_REASON: &str = "signal is aborted without reason";

/// Owner side of an external cancellation request.
///
/// Hand [`AbortController::signal`] to a pipe through `PipeOptions`, then call
/// [`AbortController::abort`] to stop it at its next suspension point.
#[derive(Clone, Default)]
pub struct AbortController {
    signal: AbortSignal,
}

impl AbortController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal(&self) -> AbortSignal {
        self.signal.clone()
    }

    /// Abort with `reason`, or with a default reason when `None`. Only the first
    /// call has any effect.
    pub fn abort(&self, reason: Option<StreamError>) {
        {
            let mut slot = self.signal.reason.lock();
            if slot.is_some() {
                return;
            }
            *slot = Some(reason.unwrap_or_else(|| DEFAULT_ABORT_REASON.into()));
        }
        self.signal.token.cancel();
    }
}

/// Observer side of an [`AbortController`].
#[derive(Clone, Default)]
pub struct AbortSignal {
    token: CancellationToken,
    reason: Arc<Mutex<Option<StreamError>>>,
}

impl AbortSignal {
    pub fn aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn reason(&self) -> Option<StreamError> {
        self.reason.lock().clone()
    }

    /// Resolves with the abort reason once the signal fires.
    pub async fn wait(&self) -> StreamError {
        self.token.cancelled().await;
        self.reason()
            .unwrap_or_else(|| DEFAULT_ABORT_REASON.into())
    }
}

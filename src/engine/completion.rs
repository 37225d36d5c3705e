// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Single-resolution result handle.
//!
//! A [`Completion`] starts pending and settles at most once, either resolved or
//! rejected with a [`StreamError`]. Any number of tasks can await it, before or
//! after it settles, and every one of them observes the same outcome. Later
//! attempts to settle are ignored.
//!
//! Streams use it for the `closed` and `ready` signals of readers and writers
//! and to remember the outcome of `close`, `abort` and `cancel` so repeated
//! calls see the first call's result.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::errors::StreamError;

#[derive(Clone, Default)]
pub struct Completion {
    inner: Arc<CompletionInner>,
}

#[derive(Default)]
struct CompletionInner {
    outcome: Mutex<Option<Result<(), StreamError>>>,
    notify: Notify,
}

impl Completion {
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn resolved() -> Self {
        let completion = Self::default();
        completion.resolve();
        completion
    }

    pub fn rejected(error: StreamError) -> Self {
        let completion = Self::default();
        completion.reject(error);
        completion
    }

    /// Returns `false` if the completion had already settled.
    pub fn resolve(&self) -> bool {
        self.settle(Ok(()))
    }

    /// Returns `false` if the completion had already settled.
    pub fn reject(&self, error: StreamError) -> bool {
        self.settle(Err(error))
    }

    pub fn settle(&self, outcome: Result<(), StreamError>) -> bool {
        {
            let mut slot = self.inner.outcome.lock();
            if slot.is_some() {
                return false;
            }
            *slot = Some(outcome);
        }
        self.inner.notify.notify_waiters();
        true
    }

    pub fn outcome(&self) -> Option<Result<(), StreamError>> {
        self.inner.outcome.lock().clone()
    }

    pub fn is_settled(&self) -> bool {
        self.inner.outcome.lock().is_some()
    }

    /// Wait until the completion settles and return its outcome.
    pub async fn wait(&self) -> Result<(), StreamError> {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a settle in between is not missed.
            notified.as_mut().enable();
            if let Some(outcome) = self.outcome() {
                return outcome;
            }
            notified.await;
        }
    }
}

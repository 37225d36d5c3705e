// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{
    ReadResult, ReadableStream, ReadableStreamDefaultController, ReadableStreamDefaultReader,
};
use crate::engine::strategy::QueuingStrategy;
use crate::errors::StreamError;
use crate::traits::UnderlyingSource;

struct TeeState<T: Send + 'static> {
    reading: bool,
    read_again: bool,
    canceled: [bool; 2],
    reasons: [Option<StreamError>; 2],
    branches: [Option<ReadableStreamDefaultController<T>>; 2],
}

/// Shared between both branches: one reader on the original stream.
struct TeeCore<T: Send + 'static> {
    reader: ReadableStreamDefaultReader<T>,
    state: Mutex<TeeState<T>>,
}

impl<T: Clone + Send + 'static> TeeCore<T> {
    fn live_branches(&self) -> Vec<ReadableStreamDefaultController<T>> {
        let state = self.state.lock();
        (0..2)
            .filter(|&i| !state.canceled[i])
            .filter_map(|i| state.branches[i].clone())
            .collect()
    }

    fn error_branches(&self, error: StreamError) {
        let branches: Vec<_> = {
            let state = self.state.lock();
            state.branches.iter().flatten().cloned().collect()
        };
        for branch in branches {
            branch.error(error.clone());
        }
    }

    /// Read one chunk from the original stream and fan it out. A pull that
    /// arrives while a read is outstanding is folded into that read.
    async fn pull(&self) -> Result<(), StreamError> {
        {
            let mut state = self.state.lock();
            if state.reading {
                state.read_again = true;
                return Ok(());
            }
            state.reading = true;
        }

        loop {
            match self.reader.read().await {
                Ok(ReadResult::Chunk(chunk)) => {
                    let branches = self.live_branches();
                    if let Some((last, rest)) = branches.split_last() {
                        for branch in rest {
                            let _ = branch.enqueue(chunk.clone());
                        }
                        let _ = last.enqueue(chunk);
                    }
                }
                Ok(ReadResult::Done) => {
                    for branch in self.live_branches() {
                        let _ = branch.close();
                    }
                    self.state.lock().reading = false;
                    return Ok(());
                }
                Err(error) => {
                    self.error_branches(error);
                    self.state.lock().reading = false;
                    return Ok(());
                }
            }

            let mut state = self.state.lock();
            if !std::mem::take(&mut state.read_again) {
                state.reading = false;
                return Ok(());
            }
        }
    }

    /// Mark a branch cancelled. The original stream is cancelled once both
    /// branches are, with both reasons combined.
    async fn cancel(&self, index: usize, reason: StreamError) -> Result<(), StreamError> {
        let composite = {
            let mut state = self.state.lock();
            state.canceled[index] = true;
            state.reasons[index] = Some(reason);
            if !state.canceled.iter().all(|&c| c) {
                return Ok(());
            }
            let reasons: Vec<String> = state
                .reasons
                .iter()
                .flatten()
                .map(|r| r.to_string())
                .collect();
            StreamError::Cancelled(reasons.join("; "))
        };
        self.reader.cancel(composite).await
    }
}

struct TeeBranch<T: Send + 'static> {
    core: Arc<TeeCore<T>>,
    index: usize,
}

#[async_trait]
impl<T: Clone + Send + 'static> UnderlyingSource<T> for TeeBranch<T> {
    fn start(&self, controller: &ReadableStreamDefaultController<T>) -> Result<(), StreamError> {
        self.core.state.lock().branches[self.index] = Some(controller.clone());
        Ok(())
    }

    async fn pull(
        &self,
        _controller: &ReadableStreamDefaultController<T>,
    ) -> Result<(), StreamError> {
        self.core.pull().await
    }

    async fn cancel(&self, reason: StreamError) -> Result<(), StreamError> {
        self.core.cancel(self.index, reason).await
    }
}

impl<T: Clone + Send + 'static> ReadableStream<T> {
    /// Split the stream into two branches that each see every chunk.
    ///
    /// Locks this stream. The original is cancelled only after both branches
    /// are cancelled; an error on the original errors both branches.
    pub fn tee(&self) -> Result<(ReadableStream<T>, ReadableStream<T>), StreamError> {
        let reader = self.get_reader()?;
        let core = Arc::new(TeeCore {
            reader,
            state: Mutex::new(TeeState {
                reading: false,
                read_again: false,
                canceled: [false, false],
                reasons: [None, None],
                branches: [None, None],
            }),
        });

        let first = ReadableStream::new(
            TeeBranch {
                core: Arc::clone(&core),
                index: 0,
            },
            QueuingStrategy::default(),
        );
        let second = ReadableStream::new(
            TeeBranch {
                core: Arc::clone(&core),
                index: 1,
            },
            QueuingStrategy::default(),
        );

        // Propagate an error on the original even when no branch is pulling.
        let watcher = Arc::downgrade(&core);
        let closed = core.reader.closed_signal();
        tokio::spawn(async move {
            if let Err(error) = closed.wait().await {
                if let Some(core) = watcher.upgrade() {
                    core.error_branches(error);
                }
            }
        });

        Ok((first, second))
    }
}

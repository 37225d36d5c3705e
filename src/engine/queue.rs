// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Size-accounted FIFO buffer shared by readable and writable streams.
//!
//! Every buffered value carries the size its stream's queuing strategy assigned
//! to it, and the queue keeps a running total of those sizes. The total drives
//! backpressure: `desired size = high-water mark - total size`.
//!
//! The queue itself never refuses a valid value. Backpressure is advisory and
//! is enforced by the owning stream, not here.

use std::collections::VecDeque;

use crate::errors::StreamError;

#[derive(Debug)]
pub struct Queue<T> {
    entries: VecDeque<(T, f64)>,
    total_size: f64,
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Queue<T> {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            total_size: 0.0,
        }
    }

    /// Append `value` with the given size.
    ///
    /// Fails with [`StreamError::SizeFunction`] when `size` is negative, NaN or
    /// infinite; the queue is left untouched in that case.
    pub fn enqueue(&mut self, value: T, size: f64) -> Result<(), StreamError> {
        if !size.is_finite() || size < 0.0 {
            return Err(StreamError::SizeFunction(format!(
                "size must be a finite, non-negative number (got {})",
                size
            )));
        }
        self.entries.push_back((value, size));
        self.total_size += size;
        Ok(())
    }

    pub fn dequeue(&mut self) -> Option<T> {
        self.dequeue_with_size().map(|(value, _)| value)
    }

    /// Remove the front value, returning it together with its recorded size.
    pub fn dequeue_with_size(&mut self) -> Option<(T, f64)> {
        let (value, size) = self.entries.pop_front()?;
        self.total_size -= size;
        // Floating-point drift can leave a tiny negative remainder.
        if self.entries.is_empty() || self.total_size < 0.0 {
            self.total_size = 0.0;
        }
        Some((value, size))
    }

    pub fn peek(&self) -> Option<&T> {
        self.entries.front().map(|(value, _)| value)
    }

    pub fn total_size(&self) -> f64 {
        self.total_size
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn reset(&mut self) {
        self.entries.clear();
        self.total_size = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order_and_total_size() {
        let mut queue = Queue::new();
        queue.enqueue("a", 1.0).unwrap();
        queue.enqueue("bb", 2.0).unwrap();
        queue.enqueue("ccc", 3.0).unwrap();

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.total_size(), 6.0);
        assert_eq!(queue.peek(), Some(&"a"));

        assert_eq!(queue.dequeue(), Some("a"));
        assert_eq!(queue.total_size(), 5.0);
        assert_eq!(queue.dequeue_with_size(), Some(("bb", 2.0)));
        assert_eq!(queue.dequeue(), Some("ccc"));
        assert_eq!(queue.dequeue(), None);
        assert_eq!(queue.total_size(), 0.0);
    }

    #[test]
    fn test_rejects_invalid_sizes() {
        let mut queue = Queue::new();
        for size in [-1.0, f64::NAN, f64::INFINITY] {
            let err = queue.enqueue(1, size).unwrap_err();
            assert!(matches!(err, StreamError::SizeFunction(_)));
        }
        assert!(queue.is_empty());
        assert_eq!(queue.total_size(), 0.0);
    }

    #[test]
    fn test_total_never_goes_negative_with_fractional_sizes() {
        let mut queue = Queue::new();
        queue.enqueue(1, 0.1).unwrap();
        queue.enqueue(2, 0.2).unwrap();
        queue.enqueue(3, 0.3).unwrap();
        while queue.dequeue().is_some() {
            assert!(queue.total_size() >= 0.0);
        }
        assert_eq!(queue.total_size(), 0.0);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut queue = Queue::new();
        queue.enqueue('x', 4.0).unwrap();
        queue.reset();
        assert!(queue.is_empty());
        assert_eq!(queue.total_size(), 0.0);
        assert_eq!(queue.peek(), None);
    }
}

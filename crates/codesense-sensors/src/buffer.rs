//! Bounded history of monitoring results

use std::collections::VecDeque;

use crate::types::SensorResult;

/// Fixed-capacity ring buffer; the oldest result is evicted first
#[derive(Debug, Clone)]
pub struct ResultBuffer {
    results: VecDeque<SensorResult>,
    capacity: usize,
}

impl ResultBuffer {
    /// Create a buffer holding at most `capacity` results (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            results: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, result: SensorResult) {
        while self.results.len() >= self.capacity {
            self.results.pop_front();
        }
        self.results.push_back(result);
    }

    /// Up to `n` most recent results, oldest first
    pub fn recent(&self, n: usize) -> Vec<SensorResult> {
        let skip = self.results.len().saturating_sub(n);
        self.results.iter().skip(skip).cloned().collect()
    }

    /// Change the capacity, dropping the oldest entries that no longer fit
    pub fn resize(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.results.len() > self.capacity {
            self.results.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.results.clear();
    }
}

//! Bounded rolling history backing the dashboard chart.

use std::collections::VecDeque;

use serde::Serialize;

use crate::domain::foundation::Timestamp;

/// Number of points the dashboard chart keeps.
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// One plotted point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartSample {
    pub temperature: f64,
    pub humidity: f64,
    pub timestamp: Timestamp,
}

impl ChartSample {
    pub fn new(temperature: f64, humidity: f64, timestamp: Timestamp) -> Self {
        Self {
            temperature,
            humidity,
            timestamp,
        }
    }
}

/// FIFO ring of the most recent samples; the oldest is evicted first.
#[derive(Debug, Clone)]
pub struct TelemetryHistory {
    samples: VecDeque<ChartSample>,
    capacity: usize,
}

impl TelemetryHistory {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, returning the evicted one when the ring was full.
    pub fn push(&mut self, sample: ChartSample) -> Option<ChartSample> {
        let evicted = if self.samples.len() == self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(sample);
        evicted
    }

    pub fn latest(&self) -> Option<&ChartSample> {
        self.samples.back()
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &ChartSample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl Default for TelemetryHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

//! Moving-average smoothing for one sensor stream.

use std::collections::VecDeque;

/// Fixed-capacity FIFO window over the most recent present samples.
///
/// Absent samples are ignored entirely: they are not inserted and they do not
/// evict. While the window is still filling, [`MovingAverage::average`] reports
/// the most recent sample rather than a partial mean.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    window: VecDeque<f32>,
    capacity: usize,
}

impl MovingAverage {
    /// A capacity of 0 is treated as 1 (pass-through).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn add(&mut self, value: Option<f32>) {
        let Some(v) = value else {
            return;
        };
        self.window.push_back(v);
        if self.window.len() > self.capacity {
            self.window.pop_front();
        }
    }

    pub fn average(&self) -> Option<f32> {
        if self.is_full() {
            let sum: f64 = self.window.iter().map(|&v| f64::from(v)).sum();
            return Some((sum / self.window.len() as f64) as f32);
        }
        self.window.back().copied()
    }

    /// Add a sample and return the updated average.
    pub fn update(&mut self, value: Option<f32>) -> Option<f32> {
        self.add(value);
        self.average()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.window.len() == self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.window.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }
}

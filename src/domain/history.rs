//! Bounded rolling histories and quantile computation.
//!
//! Score and volatility histories are capacity-bounded FIFOs: appending at
//! capacity evicts the oldest sample. Quantiles use the linear-interpolation
//! percentile definition (rank = q * (n - 1)), matching standard statistical
//! percentiles rather than nearest-rank.

use std::collections::VecDeque;

/// Default capacity for score and volatility histories.
pub const DEFAULT_CAPACITY: usize = 50;

#[derive(Debug, Clone)]
pub struct BoundedHistory {
    values: VecDeque<f64>,
    capacity: usize,
}

impl BoundedHistory {
    pub fn new(capacity: usize) -> Self {
        BoundedHistory {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest when at capacity.
    pub fn push(&mut self, value: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.values.iter()
    }

    /// Linear-interpolation percentile over the current contents.
    /// `None` when the history is empty.
    pub fn percentile(&self, q: f64) -> Option<f64> {
        let snapshot: Vec<f64> = self.values.iter().copied().collect();
        percentile(&snapshot, q)
    }
}

/// Linear-interpolation percentile of a sample: with the values sorted,
/// rank = q * (n - 1), interpolating between the surrounding samples.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = q * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;

    Some(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}

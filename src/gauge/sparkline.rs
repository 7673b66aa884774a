use std::collections::{HashMap, VecDeque};

/// Points kept per gauge.
pub const SPARKLINE_LENGTH: usize = 40;

/// Bounded per-gauge history of smoothed values, owned by one render session.
///
/// Keyed by gauge id only, so two gauges on the same metric keep separate series.
#[derive(Clone, Debug, Default)]
pub struct SparklineHistory {
    series: HashMap<String, VecDeque<f64>>,
}

impl SparklineHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value` for `gauge_id`, dropping the oldest point past [`SPARKLINE_LENGTH`].
    pub fn push(&mut self, gauge_id: &str, value: f64) {
        let ring = self
            .series
            .entry(gauge_id.to_string())
            .or_insert_with(|| VecDeque::with_capacity(SPARKLINE_LENGTH + 1));
        ring.push_back(value);
        while ring.len() > SPARKLINE_LENGTH {
            ring.pop_front();
        }
    }

    /// Oldest-first values for `gauge_id`.
    pub fn series(&self, gauge_id: &str) -> Option<&VecDeque<f64>> {
        self.series.get(gauge_id)
    }

    pub fn remove(&mut self, gauge_id: &str) {
        self.series.remove(gauge_id);
    }

    pub fn clear(&mut self) {
        self.series.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/gauge/sparkline.rs"]
mod tests;

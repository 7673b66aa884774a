use std::collections::HashMap;

use crate::activity::metric::MetricKey;

/// Factor used for keys that are neither configured nor a metric name.
pub const FALLBACK_DAMPING: f64 = 0.3;

/// Per-key exponential smoothing: `state += (target - state) * factor`.
///
/// One engine belongs to exactly one render session; keys are gauge ids (or metric names when a
/// caller has no id).
#[derive(Clone, Debug, Default)]
pub struct DampingEngine {
    state: HashMap<String, f64>,
}

impl DampingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Smooth `target` for `key`. The first value for a key is returned unchanged.
    ///
    /// `factor` is clamped to `[0, 1]`, so the result always lies between the previous state and
    /// `target`. Without a factor the metric default for `key` applies.
    pub fn smooth(&mut self, key: &str, target: f64, factor: Option<f64>) -> f64 {
        let factor = factor
            .unwrap_or_else(|| default_factor(key))
            .clamp(0.0, 1.0);
        match self.state.get_mut(key) {
            Some(current) => {
                *current += (target - *current) * factor;
                *current
            }
            None => {
                self.state.insert(key.to_string(), target);
                target
            }
        }
    }

    /// Last smoothed value for `key`.
    pub fn current(&self, key: &str) -> Option<f64> {
        self.state.get(key).copied()
    }

    /// Forget every key.
    pub fn reset(&mut self) {
        self.state.clear();
    }

    /// Forget one key; its next value seeds fresh state.
    pub fn reset_metric(&mut self, key: &str) {
        self.state.remove(key);
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }
}

fn default_factor(key: &str) -> f64 {
    key.parse::<MetricKey>()
        .map(MetricKey::default_damping)
        .unwrap_or(FALLBACK_DAMPING)
}

#[cfg(test)]
#[path = "../../tests/unit/gauge/damping.rs"]
mod tests;

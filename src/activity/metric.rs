use crate::activity::sample::Sample;

/// Metric selector shared by gauges, damping defaults and value extraction.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum MetricKey {
    HeartRate,
    Pace,
    Cadence,
    Power,
}

impl MetricKey {
    pub const ALL: [MetricKey; 4] = [
        MetricKey::HeartRate,
        MetricKey::Pace,
        MetricKey::Cadence,
        MetricKey::Power,
    ];

    /// Wire name (`heartRate`, `pace`, ...), also used as the damping fallback key.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKey::HeartRate => "heartRate",
            MetricKey::Pace => "pace",
            MetricKey::Cadence => "cadence",
            MetricKey::Power => "power",
        }
    }

    /// Smoothing factor used when a gauge does not carry its own.
    pub fn default_damping(self) -> f64 {
        match self {
            MetricKey::HeartRate => 0.3,
            MetricKey::Pace => 0.15,
            MetricKey::Cadence => 0.5,
            MetricKey::Power => 0.2,
        }
    }

    pub fn display(self) -> MetricDisplay {
        match self {
            MetricKey::HeartRate => MetricDisplay {
                label: "HR",
                unit: "bpm",
                min_value: 60.0,
                max_value: 220.0,
            },
            MetricKey::Pace => MetricDisplay {
                label: "Pace",
                unit: "min/km",
                min_value: 2.0,
                max_value: 10.0,
            },
            MetricKey::Cadence => MetricDisplay {
                label: "Cadence",
                unit: "spm",
                min_value: 120.0,
                max_value: 240.0,
            },
            MetricKey::Power => MetricDisplay {
                label: "Power",
                unit: "W",
                min_value: 0.0,
                max_value: 600.0,
            },
        }
    }
}

impl std::fmt::Display for MetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MetricKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricKey::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown metric '{s}'"))
    }
}

/// Default label, unit and value range for a metric.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetricDisplay {
    pub label: &'static str,
    pub unit: &'static str,
    pub min_value: f64,
    pub max_value: f64,
}

/// Scalar value of `metric` in `sample`, converted to display units.
///
/// Pace is derived from speed (m/s) as minutes per kilometer; a missing or non-positive speed has
/// no pace.
pub fn metric_value(sample: &Sample, metric: MetricKey) -> Option<f64> {
    match metric {
        MetricKey::HeartRate => sample.heart_rate,
        MetricKey::Cadence => sample.cadence,
        MetricKey::Power => sample.power,
        MetricKey::Pace => sample
            .speed
            .filter(|&s| s > 0.0)
            .map(|s| 1000.0 / (s * 60.0)),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/activity/metric.rs"]
mod tests;

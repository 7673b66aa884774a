use crate::foundation::error::{StridashError, StridashResult};

/// One timestamped activity observation.
///
/// `timestamp` is absolute seconds (the epoch is whatever the activity parser produced); every
/// other field is optional because recorders drop sensors in and out.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub timestamp: f64,
    /// Beats per minute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<f64>,
    /// Meters per second.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    /// Steps (or revolutions) per minute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cadence: Option<f64>,
    /// Watts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// Cumulative meters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl Sample {
    pub fn at(timestamp: f64) -> Self {
        Self {
            timestamp,
            ..Self::default()
        }
    }

    pub fn with_heart_rate(mut self, v: f64) -> Self {
        self.heart_rate = Some(v);
        self
    }

    pub fn with_speed(mut self, v: f64) -> Self {
        self.speed = Some(v);
        self
    }

    pub fn with_cadence(mut self, v: f64) -> Self {
        self.cadence = Some(v);
        self
    }

    pub fn with_power(mut self, v: f64) -> Self {
        self.power = Some(v);
        self
    }

    pub fn with_distance(mut self, v: f64) -> Self {
        self.distance = Some(v);
        self
    }

    fn optional_fields(&self) -> [(&'static str, Option<f64>); 8] {
        [
            ("heartRate", self.heart_rate),
            ("speed", self.speed),
            ("cadence", self.cadence),
            ("power", self.power),
            ("altitude", self.altitude),
            ("latitude", self.latitude),
            ("longitude", self.longitude),
            ("distance", self.distance),
        ]
    }
}

/// Serialized timeline document as produced by the activity parser.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineDef {
    #[serde(alias = "records")]
    pub samples: Vec<Sample>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_heart_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_cadence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_power: Option<f64>,
}

/// Aggregates over a whole timeline.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TimelineStats {
    pub total_distance: f64,
    pub avg_heart_rate: Option<f64>,
    pub avg_speed: Option<f64>,
    pub avg_cadence: Option<f64>,
    pub avg_power: Option<f64>,
}

/// Validated, ordered sequence of samples.
///
/// Invariants: at least one sample, all values finite, timestamps non-decreasing,
/// `start_time == samples[0].timestamp` and `end_time == samples[last].timestamp`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "TimelineDef", into = "TimelineDef")]
pub struct Timeline {
    samples: Vec<Sample>,
    stats: TimelineStats,
}

impl Timeline {
    pub fn new(samples: Vec<Sample>) -> StridashResult<Self> {
        Self::from_def(TimelineDef {
            samples,
            start_time: None,
            end_time: None,
            total_distance: None,
            avg_heart_rate: None,
            avg_speed: None,
            avg_cadence: None,
            avg_power: None,
        })
    }

    pub fn from_def(def: TimelineDef) -> StridashResult<Self> {
        let samples = def.samples;
        let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
            return Err(StridashError::validation(
                "timeline must contain at least one sample",
            ));
        };

        let mut prev = f64::NEG_INFINITY;
        for (i, s) in samples.iter().enumerate() {
            if !s.timestamp.is_finite() {
                return Err(StridashError::validation(format!(
                    "timeline sample {i} has a non-finite timestamp"
                )));
            }
            if s.timestamp < prev {
                return Err(StridashError::validation(format!(
                    "timeline sample {i} is out of order ({} < {prev})",
                    s.timestamp
                )));
            }
            prev = s.timestamp;
            for (name, v) in s.optional_fields() {
                if let Some(v) = v
                    && !v.is_finite()
                {
                    return Err(StridashError::validation(format!(
                        "timeline sample {i} field '{name}' is not finite"
                    )));
                }
            }
        }

        for (name, declared, actual) in [
            ("startTime", def.start_time, first.timestamp),
            ("endTime", def.end_time, last.timestamp),
        ] {
            if let Some(declared) = declared
                && (declared - actual).abs() > 1e-6
            {
                return Err(StridashError::validation(format!(
                    "timeline {name} {declared} does not match sample timestamp {actual}"
                )));
            }
        }

        let stats = TimelineStats {
            total_distance: def
                .total_distance
                .unwrap_or_else(|| max_of(samples.iter().filter_map(|s| s.distance))),
            avg_heart_rate: def
                .avg_heart_rate
                .or_else(|| mean_of(samples.iter().filter_map(|s| s.heart_rate))),
            avg_speed: def
                .avg_speed
                .or_else(|| mean_of(samples.iter().filter_map(|s| s.speed))),
            avg_cadence: def
                .avg_cadence
                .or_else(|| mean_of(samples.iter().filter_map(|s| s.cadence))),
            avg_power: def
                .avg_power
                .or_else(|| mean_of(samples.iter().filter_map(|s| s.power))),
        };

        Ok(Self { samples, stats })
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn start_time(&self) -> f64 {
        self.samples[0].timestamp
    }

    pub fn end_time(&self) -> f64 {
        self.samples[self.samples.len() - 1].timestamp
    }

    pub fn duration_secs(&self) -> f64 {
        self.end_time() - self.start_time()
    }

    pub fn stats(&self) -> &TimelineStats {
        &self.stats
    }
}

impl TryFrom<TimelineDef> for Timeline {
    type Error = StridashError;

    fn try_from(def: TimelineDef) -> Result<Self, Self::Error> {
        Timeline::from_def(def)
    }
}

impl From<Timeline> for TimelineDef {
    fn from(t: Timeline) -> Self {
        let start_time = Some(t.start_time());
        let end_time = Some(t.end_time());
        TimelineDef {
            samples: t.samples,
            start_time,
            end_time,
            total_distance: Some(t.stats.total_distance),
            avg_heart_rate: t.stats.avg_heart_rate,
            avg_speed: t.stats.avg_speed,
            avg_cadence: t.stats.avg_cadence,
            avg_power: t.stats.avg_power,
        }
    }
}

fn mean_of(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0u64), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

fn max_of(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(0.0, f64::max)
}

#[cfg(test)]
#[path = "../../tests/unit/activity/sample.rs"]
mod tests;

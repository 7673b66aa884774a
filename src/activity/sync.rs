use crate::activity::sample::{Sample, Timeline};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::math::lerp;

/// User-adjustable alignment between the video clock and the activity timeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOffset {
    /// Seconds into the timeline where video frame 0 lands.
    #[serde(alias = "fitStartOffset")]
    pub activity_start_offset: f64,
    /// Seconds after composition frame 0 where the underlying video track begins.
    #[serde(default)]
    pub video_start_offset: f64,
    /// Length of the composition in seconds when it differs from the probed video.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_duration: Option<f64>,
}

impl SyncOffset {
    pub fn new(activity_start_offset: f64) -> Self {
        Self {
            activity_start_offset,
            ..Self::default()
        }
    }

    pub fn with_video_start_offset(mut self, secs: f64) -> Self {
        self.video_start_offset = secs;
        self
    }

    pub fn with_video_duration(mut self, secs: f64) -> Self {
        self.video_duration = Some(secs);
        self
    }

    pub fn validate(&self) -> crate::foundation::error::StridashResult<()> {
        if !self.activity_start_offset.is_finite() || !self.video_start_offset.is_finite() {
            return Err(crate::foundation::error::StridashError::validation(
                "sync offsets must be finite",
            ));
        }
        if let Some(d) = self.video_duration
            && (!d.is_finite() || d <= 0.0)
        {
            return Err(crate::foundation::error::StridashError::validation(format!(
                "videoDuration must be finite and > 0, got {d}"
            )));
        }
        Ok(())
    }
}

/// Maps video frames onto interpolated activity samples.
///
/// Borrows the timeline snapshot for the duration of a render pass; lookups never mutate it.
#[derive(Clone, Copy, Debug)]
pub struct SyncEngine<'a> {
    timeline: &'a Timeline,
    offset: SyncOffset,
}

impl<'a> SyncEngine<'a> {
    pub fn new(timeline: &'a Timeline, offset: SyncOffset) -> Self {
        Self { timeline, offset }
    }

    pub fn offset(&self) -> SyncOffset {
        self.offset
    }

    /// Absolute activity time shown at `frame`.
    pub fn activity_time(&self, frame: FrameIndex, fps: Fps) -> f64 {
        self.timeline.start_time() + self.offset.activity_start_offset + fps.frame_to_secs(frame)
    }

    /// Interpolated sample at `frame`, or `None` when the timeline does not cover it.
    pub fn sample_at_frame(&self, frame: FrameIndex, fps: Fps) -> Option<Sample> {
        self.sample_at_time(self.activity_time(frame, fps))
    }

    /// Interpolated sample at absolute activity time `t`.
    pub fn sample_at_time(&self, t: f64) -> Option<Sample> {
        let samples = self.timeline.samples();
        if !t.is_finite() || t < self.timeline.start_time() || t > self.timeline.end_time() {
            return None;
        }

        let first = &samples[0];
        if t <= first.timestamp {
            return Some(first.clone());
        }

        // First index whose timestamp is strictly after `t`; `before` is the last sample at or
        // before `t`, so duplicate timestamps resolve to the tightest pair.
        let idx = samples.partition_point(|s| s.timestamp <= t);
        let Some(after) = samples.get(idx) else {
            return samples.last().cloned();
        };
        let before = &samples[idx - 1];

        let span = after.timestamp - before.timestamp;
        if span <= 0.0 {
            return Some(before.clone());
        }
        Some(interpolate(before, after, (t - before.timestamp) / span))
    }
}

fn interpolate(a: &Sample, b: &Sample, t: f64) -> Sample {
    Sample {
        timestamp: lerp(a.timestamp, b.timestamp, t),
        heart_rate: lerp_field(a.heart_rate, b.heart_rate, t),
        speed: lerp_field(a.speed, b.speed, t),
        cadence: lerp_field(a.cadence, b.cadence, t),
        power: lerp_field(a.power, b.power, t),
        altitude: lerp_field(a.altitude, b.altitude, t),
        latitude: lerp_field(a.latitude, b.latitude, t),
        longitude: lerp_field(a.longitude, b.longitude, t),
        distance: lerp_field(a.distance, b.distance, t),
    }
}

/// A field present on only one side keeps that side's value as-is.
fn lerp_field(a: Option<f64>, b: Option<f64>, t: f64) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(lerp(a, b, t)),
        (a, b) => a.or(b),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/activity/sync.rs"]
mod tests;

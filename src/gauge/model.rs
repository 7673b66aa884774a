use std::collections::HashSet;

use crate::activity::metric::MetricKey;
use crate::foundation::core::{Canvas, Rgba8};
use crate::foundation::error::{StridashError, StridashResult};

/// Default gauge size as a fraction of the canvas.
pub const DEFAULT_GAUGE_SIZE: NormSize = NormSize {
    width: 0.20,
    height: 0.11,
};
/// Smallest gauge size a layout may request.
pub const GAUGE_MIN_SIZE: NormSize = NormSize {
    width: 0.08,
    height: 0.045,
};
/// Largest gauge size a layout may request.
pub const GAUGE_MAX_SIZE: NormSize = NormSize {
    width: 0.4,
    height: 0.22,
};

/// Visual gauge family.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GaugeStyle {
    /// 270 degree sweep with zone arcs.
    #[default]
    Arc,
    /// Full ring starting at 12 o'clock.
    Radial,
    /// Vertical thermometer.
    Bar,
    /// Large number with a sparkline.
    Minimal,
}

/// Top-left corner in normalized canvas coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NormPoint {
    pub x: f64,
    pub y: f64,
}

/// Size in normalized canvas units.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NormSize {
    pub width: f64,
    pub height: f64,
}

impl Default for NormSize {
    fn default() -> Self {
        DEFAULT_GAUGE_SIZE
    }
}

impl NormSize {
    /// Clamp into `[GAUGE_MIN_SIZE, GAUGE_MAX_SIZE]` per axis.
    pub fn clamped(self) -> Self {
        Self {
            width: self.width.clamp(GAUGE_MIN_SIZE.width, GAUGE_MAX_SIZE.width),
            height: self
                .height
                .clamp(GAUGE_MIN_SIZE.height, GAUGE_MAX_SIZE.height),
        }
    }
}

/// A value sub-range drawn in one color. `min` is inclusive, `max` exclusive.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ColorZone {
    pub min: f64,
    pub max: f64,
    pub color: Rgba8,
}

impl ColorZone {
    pub fn new(min: f64, max: f64, color: Rgba8) -> Self {
        Self { min, max, color }
    }
}

/// One configured gauge, owned by the editing layer and read per frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GaugeSpec {
    /// Stable identifier; keys damping and sparkline state.
    pub id: String,
    pub metric: MetricKey,
    #[serde(default)]
    pub position: NormPoint,
    #[serde(default)]
    pub size: NormSize,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub style: GaugeStyle,
    #[serde(default)]
    pub color_zones: Vec<ColorZone>,
    /// Smoothing factor in `(0, 1]`; the metric default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damping_factor: Option<f64>,
    pub label: String,
    pub unit: String,
    pub min_value: f64,
    pub max_value: f64,
}

fn default_visible() -> bool {
    true
}

/// Integer pixel placement of a gauge on a canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl GaugeSpec {
    /// Gauge for `metric` using its default label, unit, range, zones and damping.
    pub fn for_metric(id: impl Into<String>, metric: MetricKey, position: NormPoint) -> Self {
        let display = metric.display();
        Self {
            id: id.into(),
            metric,
            position,
            size: DEFAULT_GAUGE_SIZE,
            visible: true,
            style: GaugeStyle::Arc,
            color_zones: crate::gauge::preset::default_zones(metric),
            damping_factor: Some(metric.default_damping()),
            label: display.label.to_string(),
            unit: display.unit.to_string(),
            min_value: display.min_value,
            max_value: display.max_value,
        }
    }

    pub fn with_style(mut self, style: GaugeStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_size(mut self, size: NormSize) -> Self {
        self.size = size;
        self
    }

    pub fn with_damping(mut self, factor: f64) -> Self {
        self.damping_factor = Some(factor);
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Effective smoothing factor.
    pub fn damping(&self) -> f64 {
        self.damping_factor
            .unwrap_or_else(|| self.metric.default_damping())
    }

    /// Pixel placement: `round(position * canvas)` and `round(clamped size * canvas)`.
    pub fn pixel_rect(&self, canvas: Canvas) -> PixelRect {
        let cw = f64::from(canvas.width);
        let ch = f64::from(canvas.height);
        let size = self.size.clamped();
        PixelRect {
            x: (self.position.x * cw).round() as i64,
            y: (self.position.y * ch).round() as i64,
            width: (size.width * cw).round().max(0.0) as u32,
            height: (size.height * ch).round().max(0.0) as u32,
        }
    }

    pub fn validate(&self) -> StridashResult<()> {
        let id = &self.id;
        if id.trim().is_empty() {
            return Err(StridashError::validation("gauge id must be non-empty"));
        }
        let finite = [
            self.position.x,
            self.position.y,
            self.size.width,
            self.size.height,
            self.min_value,
            self.max_value,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(StridashError::validation(format!(
                "gauge '{id}' has non-finite geometry or range"
            )));
        }
        if self.max_value <= self.min_value {
            return Err(StridashError::validation(format!(
                "gauge '{id}' maxValue must be greater than minValue"
            )));
        }
        if let Some(f) = self.damping_factor
            && !(f > 0.0 && f <= 1.0)
        {
            return Err(StridashError::validation(format!(
                "gauge '{id}' dampingFactor must be in (0, 1], got {f}"
            )));
        }
        for (i, z) in self.color_zones.iter().enumerate() {
            if !z.min.is_finite() || !z.max.is_finite() || z.max < z.min {
                return Err(StridashError::validation(format!(
                    "gauge '{id}' color zone {i} has an invalid range"
                )));
            }
        }
        Ok(())
    }
}

/// Validate each gauge and reject duplicate ids.
pub fn validate_gauges(gauges: &[GaugeSpec]) -> StridashResult<()> {
    let mut seen = HashSet::new();
    for g in gauges {
        g.validate()?;
        if !seen.insert(g.id.as_str()) {
            return Err(StridashError::validation(format!(
                "duplicate gauge id '{}'",
                g.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/gauge/model.rs"]
mod tests;

use crate::activity::metric::MetricKey;
use crate::foundation::core::Rgba8;
use crate::gauge::model::ColorZone;

/// Color used when no zone applies.
pub const NEUTRAL_COLOR: Rgba8 = Rgba8::WHITE;

/// Color of the first zone with `min <= value < max`.
///
/// Values at or past `max_value` fall into the last zone; anything else is neutral.
pub fn active_color(value: f64, zones: &[ColorZone], max_value: f64) -> Rgba8 {
    if let Some(z) = zones.iter().find(|z| value >= z.min && value < z.max) {
        return z.color;
    }
    match zones.last() {
        Some(last) if value >= max_value => last.color,
        _ => NEUTRAL_COLOR,
    }
}

/// Display text for a gauge value.
///
/// Pace is decimal minutes shown as `M:SS`; other metrics round to an integer.
pub fn format_value(value: f64, metric: MetricKey) -> String {
    match metric {
        MetricKey::Pace => {
            if !value.is_finite() || value <= 0.0 {
                return "--:--".to_string();
            }
            let total_secs = (value * 60.0).round() as u64;
            format!("{}:{:02}", total_secs / 60, total_secs % 60)
        }
        _ if !value.is_finite() => "--".to_string(),
        _ => format!("{}", value.round() as i64),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/gauge/zones.rs"]
mod tests;

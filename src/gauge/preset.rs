use crate::activity::metric::MetricKey;
use crate::foundation::core::Rgba8;
use crate::gauge::model::{ColorZone, GaugeSpec, NormPoint, NormSize};

const BLUE: Rgba8 = Rgba8::rgb(0x3b, 0x82, 0xf6);
const GREEN: Rgba8 = Rgba8::rgb(0x22, 0xc5, 0x5e);
const YELLOW: Rgba8 = Rgba8::rgb(0xea, 0xb3, 0x08);
const RED: Rgba8 = Rgba8::rgb(0xef, 0x44, 0x44);

/// Default color zones for `metric`, ordered by ascending value.
pub fn default_zones(metric: MetricKey) -> Vec<ColorZone> {
    let (bounds, colors): ([f64; 5], [Rgba8; 4]) = match metric {
        MetricKey::HeartRate => ([0.0, 120.0, 150.0, 170.0, 220.0], [BLUE, GREEN, YELLOW, RED]),
        // Faster pace is a lower number.
        MetricKey::Pace => ([0.0, 4.0, 5.0, 6.0, 10.0], [RED, YELLOW, GREEN, BLUE]),
        MetricKey::Cadence => ([0.0, 160.0, 175.0, 190.0, 240.0], [BLUE, GREEN, YELLOW, RED]),
        MetricKey::Power => ([0.0, 200.0, 300.0, 400.0, 600.0], [BLUE, GREEN, YELLOW, RED]),
    };
    colors
        .iter()
        .enumerate()
        .map(|(i, &c)| ColorZone::new(bounds[i], bounds[i + 1], c))
        .collect()
}

/// Named starter layout.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GaugePreset {
    pub id: &'static str,
    pub name: &'static str,
    pub gauges: Vec<GaugeSpec>,
}

/// All built-in layouts.
pub fn presets() -> Vec<GaugePreset> {
    let left = |y: f64| NormPoint { x: 0.06, y };
    vec![
        build(
            "runner-minimal",
            "Runner Minimal",
            vec![
                (MetricKey::HeartRate, left(0.06)),
                (MetricKey::Pace, left(0.19)),
            ],
        ),
        build(
            "full-dashboard",
            "Full Dashboard",
            vec![
                (MetricKey::HeartRate, left(0.06)),
                (MetricKey::Pace, left(0.19)),
                (MetricKey::Cadence, left(0.32)),
                (MetricKey::Power, left(0.45)),
            ],
        ),
        GaugePreset {
            gauges: vec![
                GaugeSpec::for_metric("hr-focus-heartRate", MetricKey::HeartRate, left(0.06))
                    .with_size(NormSize {
                        width: 0.28,
                        height: 0.15,
                    }),
            ],
            ..build("hr-focus", "HR Focus", vec![])
        },
    ]
}

/// Built-in layout by id.
pub fn preset(id: &str) -> Option<GaugePreset> {
    presets().into_iter().find(|p| p.id == id)
}

fn build(id: &'static str, name: &'static str, gauges: Vec<(MetricKey, NormPoint)>) -> GaugePreset {
    GaugePreset {
        id,
        name,
        gauges: gauges
            .into_iter()
            .map(|(metric, pos)| GaugeSpec::for_metric(format!("{id}-{metric}"), metric, pos))
            .collect(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/gauge/preset.rs"]
mod tests;

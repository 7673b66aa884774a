use super::*;

fn hr(id: &str) -> GaugeSpec {
    GaugeSpec::for_metric(id, MetricKey::HeartRate, NormPoint { x: 0.1, y: 0.2 })
}

#[test]
fn pixel_rect_rounds_and_clamps_size() {
    let canvas = Canvas::new(1080, 1920).unwrap();
    let r = hr("a").pixel_rect(canvas);
    assert_eq!(r, PixelRect { x: 108, y: 384, width: 216, height: 211 });

    let tiny = hr("b").with_size(NormSize { width: 0.01, height: 0.9 });
    let r = tiny.pixel_rect(canvas);
    assert_eq!(r.width, (0.08f64 * 1080.0).round() as u32);
    assert_eq!(r.height, (0.22f64 * 1920.0).round() as u32);
}

#[test]
fn json_defaults_fill_optional_fields() {
    let g: GaugeSpec = serde_json::from_str(
        r#"{"id":"g1","metric":"pace","label":"Pace","unit":"min/km","minValue":2,"maxValue":10}"#,
    )
    .unwrap();
    assert!(g.visible);
    assert_eq!(g.style, GaugeStyle::Arc);
    assert_eq!(g.size, DEFAULT_GAUGE_SIZE);
    assert!(g.color_zones.is_empty());
    assert_eq!(g.damping(), 0.15);
}

#[test]
fn zones_parse_hex_colors() {
    let g: GaugeSpec = serde_json::from_str(
        r##"{"id":"g1","metric":"heartRate","style":"minimal","label":"HR","unit":"bpm",
            "minValue":60,"maxValue":220,"dampingFactor":1,
            "colorZones":[{"min":0,"max":120,"color":"#3b82f6"}]}"##,
    )
    .unwrap();
    assert_eq!(g.style, GaugeStyle::Minimal);
    assert_eq!(g.color_zones[0].color, Rgba8::rgb(0x3b, 0x82, 0xf6));
    assert_eq!(g.damping(), 1.0);
}

#[test]
fn missing_required_fields_fail_to_parse() {
    let r = serde_json::from_str::<GaugeSpec>(r#"{"id":"g1","metric":"pace"}"#);
    assert!(r.is_err());
    let r = serde_json::from_str::<GaugeSpec>(
        r#"{"id":"g1","metric":"speed","label":"","unit":"","minValue":0,"maxValue":1}"#,
    );
    assert!(r.is_err());
}

#[test]
fn validation_rejects_bad_ranges_damping_and_duplicates() {
    assert!(hr("ok").validate().is_ok());

    let mut g = hr("range");
    g.max_value = g.min_value;
    assert!(g.validate().is_err());

    assert!(hr("zero").with_damping(0.0).validate().is_err());
    assert!(hr("big").with_damping(1.5).validate().is_err());

    let mut g = hr("");
    g.id = "  ".into();
    assert!(g.validate().is_err());

    let err = validate_gauges(&[hr("same"), hr("same")]).unwrap_err();
    assert!(err.to_string().contains("duplicate"));
    assert!(validate_gauges(&[hr("one"), hr("two")]).is_ok());
}

use std::f64::consts::{PI, TAU};

use kurbo::{Arc, BezPath, Circle, Point, Rect, RoundedRect, Vec2};

use crate::activity::metric::MetricKey;
use crate::foundation::core::Rgba8;
use crate::foundation::error::StridashResult;
use crate::foundation::math::unit_ratio;
use crate::gauge::model::{ColorZone, GaugeSpec, GaugeStyle, PixelRect};
use crate::gauge::sparkline::{SPARKLINE_LENGTH, SparklineHistory};
use crate::gauge::zones::{active_color, format_value};
use crate::render::backend::FrameRGBA;
use crate::render::cpu::{CpuCanvas, LineCap, Painter, TextAlign, TextBaseline};

const BG_COLOR: Rgba8 = Rgba8::rgba(0, 0, 0, 140);
const TRACK_COLOR: Rgba8 = Rgba8::rgba(255, 255, 255, 26);
const NEEDLE_COLOR: Rgba8 = Rgba8::WHITE;
const TEXT_COLOR: Rgba8 = Rgba8::WHITE;
const CAPTION_COLOR: Rgba8 = Rgba8::rgba(255, 255, 255, 179);
const MINIMAL_CAPTION_COLOR: Rgba8 = Rgba8::rgba(255, 255, 255, 128);

/// Whole-gauge opacity while the gauge has no data.
pub const NO_DATA_OPACITY: f32 = 0.45;
/// Value text shown while the gauge has no data.
pub const NO_DATA_TEXT: &str = "--";

const ARC_START: f64 = PI * 0.75;
const ARC_SWEEP: f64 = TAU * 0.75;
const RADIAL_START: f64 = -PI / 2.0;

const ZONE_ARC_ALPHA: f32 = 0x40 as f32 / 255.0;
const ZONE_BAR_ALPHA: f32 = 0x30 as f32 / 255.0;
const SPARKLINE_ALPHA: f32 = 0x80 as f32 / 255.0;

/// Everything needed to draw one gauge for one frame.
#[derive(Clone, Copy, Debug)]
pub struct RenderRequest<'a> {
    /// Smoothed value; ignored when `has_data` is false.
    pub value: f64,
    pub has_data: bool,
    pub min_value: f64,
    pub max_value: f64,
    pub label: &'a str,
    pub unit: &'a str,
    pub color_zones: &'a [ColorZone],
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub style: GaugeStyle,
    pub metric: MetricKey,
    pub gauge_id: &'a str,
}

impl<'a> RenderRequest<'a> {
    /// Request for `spec` at pixel size `rect`; `None` draws the no-data placeholder.
    pub fn for_gauge(spec: &'a GaugeSpec, value: Option<f64>, rect: PixelRect) -> Self {
        Self {
            value: value.unwrap_or(spec.min_value),
            has_data: value.is_some(),
            min_value: spec.min_value,
            max_value: spec.max_value,
            label: &spec.label,
            unit: &spec.unit,
            color_zones: &spec.color_zones,
            pixel_width: rect.width,
            pixel_height: rect.height,
            style: spec.style,
            metric: spec.metric,
            gauge_id: &spec.id,
        }
    }

    fn clamped_value(&self) -> f64 {
        if self.has_data {
            self.value.clamp(self.min_value, self.max_value)
        } else {
            self.min_value
        }
    }

    fn ratio(&self) -> f64 {
        if self.has_data {
            unit_ratio(self.clamped_value(), self.min_value, self.max_value)
        } else {
            0.0
        }
    }

    fn value_text(&self) -> String {
        if self.has_data {
            format_value(self.value, self.metric)
        } else {
            NO_DATA_TEXT.to_string()
        }
    }

    /// Position of `v` in the value range, unclamped.
    fn range_ratio(&self, v: f64) -> f64 {
        (v - self.min_value) / (self.max_value - self.min_value)
    }
}

/// Style-dispatched gauge rasterizer.
///
/// Holds only raster scratch state; given the same request and history the output is identical.
pub struct GaugeRenderer {
    canvas: CpuCanvas,
}

impl GaugeRenderer {
    pub fn new(font_bytes: Option<&[u8]>) -> Self {
        Self {
            canvas: CpuCanvas::new(font_bytes),
        }
    }

    /// `true` when value and caption text will be drawn.
    pub fn has_font(&self) -> bool {
        self.canvas.has_font()
    }

    /// Draw `req` into a premultiplied `pixel_width`x`pixel_height` buffer.
    ///
    /// Minimal gauges append the value to `history` under the request's gauge id.
    pub fn render(
        &mut self,
        req: &RenderRequest<'_>,
        history: &mut SparklineHistory,
    ) -> StridashResult<FrameRGBA> {
        if req.style == GaugeStyle::Minimal && req.has_data {
            history.push(req.gauge_id, req.value);
        }
        let history: &SparklineHistory = history;
        let opacity = if req.has_data { 1.0 } else { NO_DATA_OPACITY };

        self.canvas
            .draw(req.pixel_width, req.pixel_height, |p| {
                p.with_opacity(opacity, |p| match req.style {
                    GaugeStyle::Arc => draw_arc(p, req),
                    GaugeStyle::Radial => draw_radial(p, req),
                    GaugeStyle::Bar => draw_bar(p, req),
                    GaugeStyle::Minimal => draw_minimal(p, req, history),
                });
                Ok(())
            })
    }
}

fn dims(req: &RenderRequest<'_>) -> (f64, f64) {
    (f64::from(req.pixel_width), f64::from(req.pixel_height))
}

fn rounded(x0: f64, y0: f64, x1: f64, y1: f64, radius: f64) -> RoundedRect {
    let r = radius.min((x1 - x0) / 2.0).min((y1 - y0) / 2.0).max(0.0);
    RoundedRect::new(x0, y0, x1, y1, r)
}

fn arc(center: Point, radius: f64, start: f64, sweep: f64) -> Arc {
    Arc {
        center,
        radii: Vec2::new(radius, radius),
        start_angle: start,
        sweep_angle: sweep,
        x_rotation: 0.0,
    }
}

fn draw_arc(p: &mut Painter<'_>, req: &RenderRequest<'_>) {
    let (w, h) = dims(req);
    let c = Point::new(w / 2.0, h * 0.55);
    let radius = w.min(h) * 0.38;
    let lw = radius * 0.18;
    let ratio = req.ratio();

    p.fill(&Circle::new(c, radius + lw), BG_COLOR);
    p.stroke(
        &arc(c, radius, ARC_START, ARC_SWEEP),
        lw,
        LineCap::Round,
        TRACK_COLOR,
    );

    for zone in req.color_zones {
        let zs = req.range_ratio(zone.min.max(req.min_value)) * ARC_SWEEP;
        let ze = req.range_ratio(zone.max.min(req.max_value)) * ARC_SWEEP;
        if ze <= 0.0 || zs >= ARC_SWEEP {
            continue;
        }
        let s = zs.max(0.0);
        let e = ze.min(ARC_SWEEP);
        p.stroke(
            &arc(c, radius, ARC_START + s, e - s),
            lw,
            LineCap::Butt,
            zone.color.fade(ZONE_ARC_ALPHA),
        );
    }

    if req.has_data && ratio > 0.0 {
        let sweep = ratio * ARC_SWEEP;
        let tip = ARC_START + sweep;
        let color = active_color(req.clamped_value(), req.color_zones, req.max_value);
        p.stroke(&arc(c, radius, ARC_START, sweep), lw, LineCap::Round, color);
        let needle = Point::new(c.x + tip.cos() * radius, c.y + tip.sin() * radius);
        p.fill(&Circle::new(needle, lw * 0.35), NEEDLE_COLOR);
    }

    let fs = (radius * 0.7).max(28.0);
    p.text(
        &req.value_text(),
        fs,
        TEXT_COLOR,
        (c.x, c.y - fs * 0.1),
        TextAlign::Center,
        TextBaseline::Middle,
    );
    p.text(
        &format!("{} · {}", req.label, req.unit),
        (radius * 0.28).max(14.0),
        CAPTION_COLOR,
        (c.x, c.y + fs * 0.6),
        TextAlign::Center,
        TextBaseline::Middle,
    );
}

fn draw_radial(p: &mut Painter<'_>, req: &RenderRequest<'_>) {
    let (w, h) = dims(req);
    let c = Point::new(w / 2.0, h / 2.0);
    let radius = w.min(h) * 0.4;
    let lw = radius * 0.15;
    let ratio = req.ratio();

    p.fill(&Circle::new(c, radius + lw * 0.5), BG_COLOR);
    p.stroke(&Circle::new(c, radius), lw, LineCap::Butt, TRACK_COLOR);

    if req.has_data && ratio > 0.0 {
        let color = active_color(req.clamped_value(), req.color_zones, req.max_value);
        p.stroke(
            &arc(c, radius, RADIAL_START, ratio * TAU),
            lw,
            LineCap::Round,
            color,
        );
    }

    let fs = (radius * 0.55).max(28.0);
    p.text(
        &req.value_text(),
        fs,
        TEXT_COLOR,
        (c.x, c.y - fs * 0.15),
        TextAlign::Center,
        TextBaseline::Middle,
    );
    p.text(
        &format!("{} · {}", req.label, req.unit),
        (radius * 0.22).max(14.0),
        CAPTION_COLOR,
        (c.x, c.y + fs * 0.5),
        TextAlign::Center,
        TextBaseline::Middle,
    );
}

fn draw_bar(p: &mut Painter<'_>, req: &RenderRequest<'_>) {
    let (w, h) = dims(req);
    let padding = 8.0;
    let bar_w = (w * 0.3).min(30.0);
    let bar_x = w / 2.0 - bar_w / 2.0;
    let bar_top = padding + 20.0;
    let bar_bottom = h - padding - 24.0;
    let bar_h = bar_bottom - bar_top;
    let ratio = req.ratio();

    p.fill(&rounded(0.0, 0.0, w, h, 8.0), BG_COLOR);

    if bar_h > 0.0 {
        p.fill(
            &rounded(bar_x, bar_top, bar_x + bar_w, bar_bottom, bar_w / 2.0),
            TRACK_COLOR,
        );

        for zone in req.color_zones {
            let lo = req.range_ratio(zone.min.max(req.min_value));
            let hi = req.range_ratio(zone.max.min(req.max_value));
            if hi <= 0.0 || lo >= 1.0 {
                continue;
            }
            let y_top = bar_bottom - hi * bar_h;
            let y_bottom = bar_bottom - lo * bar_h;
            p.fill(
                &Rect::new(bar_x, y_top, bar_x + bar_w, y_bottom),
                zone.color.fade(ZONE_BAR_ALPHA),
            );
        }

        if req.has_data && ratio > 0.0 {
            let fill_h = ratio * bar_h;
            let color = active_color(req.clamped_value(), req.color_zones, req.max_value);
            p.fill(
                &rounded(
                    bar_x,
                    bar_bottom - fill_h,
                    bar_x + bar_w,
                    bar_bottom,
                    bar_w / 2.0,
                ),
                color,
            );
        }
    }

    p.text(
        &req.value_text(),
        (w * 0.25).max(28.0),
        TEXT_COLOR,
        (w / 2.0, 4.0),
        TextAlign::Center,
        TextBaseline::Top,
    );
    let small = (w * 0.12).max(12.0);
    p.text(
        req.label,
        small,
        CAPTION_COLOR,
        (w / 2.0, h - 10.0),
        TextAlign::Center,
        TextBaseline::Bottom,
    );
    p.text(
        req.unit,
        small,
        CAPTION_COLOR,
        (w / 2.0, h - 2.0),
        TextAlign::Center,
        TextBaseline::Bottom,
    );
}

fn draw_minimal(p: &mut Painter<'_>, req: &RenderRequest<'_>, history: &SparklineHistory) {
    let (w, h) = dims(req);

    p.fill(&rounded(0.0, 0.0, w, h, 6.0), BG_COLOR);

    p.text(
        &req.value_text(),
        (h * 0.45).max(28.0),
        TEXT_COLOR,
        (8.0, h * 0.38),
        TextAlign::Left,
        TextBaseline::Middle,
    );
    p.text(
        &format!("{} {}", req.label, req.unit),
        (h * 0.18).max(12.0),
        MINIMAL_CAPTION_COLOR,
        (8.0, h * 0.72),
        TextAlign::Left,
        TextBaseline::Middle,
    );

    let Some(series) = history.series(req.gauge_id).filter(|s| s.len() > 1) else {
        return;
    };
    let spark_x = w * 0.55;
    let spark_w = w * 0.4;
    let spark_y = 6.0;
    let spark_h = h - 12.0;

    let (lo, hi) = series
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = if hi - lo == 0.0 { 1.0 } else { hi - lo };

    let mut line = BezPath::new();
    let step = spark_w / (SPARKLINE_LENGTH - 1) as f64;
    for (i, &v) in series.iter().enumerate() {
        let pt = Point::new(
            spark_x + i as f64 * step,
            spark_y + spark_h - (v - lo) / range * spark_h,
        );
        if i == 0 {
            line.move_to(pt);
        } else {
            line.line_to(pt);
        }
    }
    let color = active_color(req.value, req.color_zones, req.max_value).fade(SPARKLINE_ALPHA);
    p.stroke(&line, 1.5, LineCap::Butt, color);
}

#[cfg(test)]
#[path = "../../tests/unit/gauge/render.rs"]
mod tests;

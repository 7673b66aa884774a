use kurbo::{PathEl, Shape};

use crate::foundation::core::Rgba8;
use crate::foundation::error::{StridashError, StridashResult};
use crate::render::backend::FrameRGBA;
use crate::render::text::{TextBlock, TextBrushRgba8, TextLayoutEngine};

/// Curve flattening tolerance in pixels.
const TOLERANCE: f64 = 0.1;

/// Stroke end style.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LineCap {
    Butt,
    Round,
}

/// Horizontal text anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TextAlign {
    Left,
    Center,
}

/// Vertical text anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TextBaseline {
    Top,
    Middle,
    Bottom,
}

/// Reusable `vello_cpu` raster target plus the text engine used to label shapes.
///
/// The render context is kept across calls and only rebuilt when the target size changes.
pub(crate) struct CpuCanvas {
    ctx: Option<vello_cpu::RenderContext>,
    text: TextLayoutEngine,
}

impl CpuCanvas {
    pub(crate) fn new(font_bytes: Option<&[u8]>) -> Self {
        Self {
            ctx: None,
            text: TextLayoutEngine::new(font_bytes),
        }
    }

    pub(crate) fn has_font(&self) -> bool {
        self.text.has_font()
    }

    /// Draw into a cleared `width`x`height` target and read it back as a premultiplied frame.
    pub(crate) fn draw(
        &mut self,
        width: u32,
        height: u32,
        f: impl FnOnce(&mut Painter<'_>) -> StridashResult<()>,
    ) -> StridashResult<FrameRGBA> {
        let w: u16 = width
            .try_into()
            .map_err(|_| StridashError::render("raster width exceeds u16"))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| StridashError::render("raster height exceeds u16"))?;
        if w == 0 || h == 0 {
            return Ok(FrameRGBA::transparent(width, height));
        }

        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == w && ctx.height() == h => ctx,
            _ => vello_cpu::RenderContext::new(w, h),
        };
        ctx.reset();

        let drawn = {
            let mut painter = Painter {
                ctx: &mut ctx,
                text: &mut self.text,
            };
            f(&mut painter)
        };
        let out = drawn.map(|()| {
            let mut pixmap = vello_cpu::Pixmap::new(w, h);
            ctx.flush();
            ctx.render_to_pixmap(&mut pixmap);
            pixmap.data_as_u8_slice().to_vec()
        });
        self.ctx = Some(ctx);
        FrameRGBA::from_premul(width, height, out?)
    }
}

/// Drawing surface handed to [`CpuCanvas::draw`] callbacks.
pub(crate) struct Painter<'a> {
    ctx: &'a mut vello_cpu::RenderContext,
    text: &'a mut TextLayoutEngine,
}

impl Painter<'_> {
    pub(crate) fn fill(&mut self, shape: &impl Shape, color: Rgba8) {
        self.set_color(color);
        self.ctx
            .fill_path(&path_to_cpu(shape.path_elements(TOLERANCE)));
    }

    pub(crate) fn stroke(&mut self, shape: &impl Shape, width: f64, cap: LineCap, color: Rgba8) {
        if width.is_nan() || width <= 0.0 {
            return;
        }
        let cap = match cap {
            LineCap::Butt => kurbo::Cap::Butt,
            LineCap::Round => kurbo::Cap::Round,
        };
        let style = kurbo::Stroke::new(width).with_caps(cap);
        let outline = kurbo::stroke(
            shape.path_elements(TOLERANCE),
            &style,
            &kurbo::StrokeOpts::default(),
            TOLERANCE,
        );
        self.set_color(color);
        self.ctx.fill_path(&path_to_cpu(outline.elements().iter().copied()));
    }

    /// Run `f` inside an opacity layer; `opacity >= 1` draws directly.
    pub(crate) fn with_opacity(&mut self, opacity: f32, f: impl FnOnce(&mut Self)) {
        if opacity < 1.0 {
            self.ctx.push_opacity_layer(opacity.clamp(0.0, 1.0));
            f(self);
            self.ctx.pop_layer();
        } else {
            f(self);
        }
    }

    /// Draw one line of text anchored at `(x, y)`. Without a font this is a no-op.
    pub(crate) fn text(
        &mut self,
        text: &str,
        size_px: f64,
        color: Rgba8,
        at: (f64, f64),
        align: TextAlign,
        baseline: TextBaseline,
    ) {
        let brush = TextBrushRgba8 {
            r: color.r,
            g: color.g,
            b: color.b,
            a: color.a,
        };
        let Some(block) = self.text.layout_line(text, size_px as f32, brush) else {
            return;
        };
        let Some(font) = self.text.font_data().cloned() else {
            return;
        };

        let (x, y) = at;
        let left = match align {
            TextAlign::Left => x,
            TextAlign::Center => x - block.width / 2.0,
        };
        let top = match baseline {
            TextBaseline::Top => y,
            TextBaseline::Middle => y - block.height / 2.0,
            TextBaseline::Bottom => y - block.height,
        };

        self.ctx
            .set_transform(vello_cpu::kurbo::Affine::translate((left, top)));
        draw_glyphs(self.ctx, &font, &block);
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    }

    fn set_color(&mut self, c: Rgba8) {
        self.ctx
            .set_paint(vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a));
    }
}

fn draw_glyphs(
    ctx: &mut vello_cpu::RenderContext,
    font: &vello_cpu::peniko::FontData,
    block: &TextBlock,
) {
    for line in block.layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let brush = run.style().brush;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                brush.r, brush.g, brush.b, brush.a,
            ));
            let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
}

fn path_to_cpu(elements: impl IntoIterator<Item = PathEl>) -> vello_cpu::kurbo::BezPath {
    let pt = |p: kurbo::Point| vello_cpu::kurbo::Point::new(p.x, p.y);
    let mut out = vello_cpu::kurbo::BezPath::new();
    for el in elements {
        match el {
            PathEl::MoveTo(p) => out.move_to(pt(p)),
            PathEl::LineTo(p) => out.line_to(pt(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(pt(p1), pt(p2)),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(pt(p1), pt(p2), pt(p3)),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Environment variable naming a TTF/OTF file used for gauge text.
pub const FONT_ENV_VAR: &str = "STRIDASH_FONT";

/// Well-known sans fonts probed when no font is configured.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Where gauge text gets its font bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FontSource {
    /// `STRIDASH_FONT`, then the first readable well-known system font.
    #[default]
    Auto,
    /// An explicit font file; falls back to [`FontSource::Auto`] when unreadable.
    File(PathBuf),
    /// Render gauges without text.
    Disabled,
}

impl FontSource {
    /// Load font bytes, degrading along the fallback chain instead of failing.
    pub fn load(&self) -> Option<Arc<Vec<u8>>> {
        match self {
            FontSource::Disabled => None,
            FontSource::File(path) => read_font(path).or_else(load_auto),
            FontSource::Auto => load_auto(),
        }
    }
}

fn load_auto() -> Option<Arc<Vec<u8>>> {
    if let Some(path) = std::env::var_os(FONT_ENV_VAR)
        && let Some(bytes) = read_font(Path::new(&path))
    {
        return Some(bytes);
    }
    let found = SYSTEM_FONT_CANDIDATES
        .iter()
        .find_map(|p| read_font(Path::new(p)));
    if found.is_none() {
        tracing::warn!("no usable font found; gauges will render without text");
    }
    found
}

fn read_font(path: &Path) -> Option<Arc<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(bytes) if !bytes.is_empty() => Some(Arc::new(bytes)),
        Ok(_) => {
            tracing::warn!(path = %path.display(), "font file is empty");
            None
        }
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "font not readable");
            None
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

struct RegisteredFont {
    family_name: String,
    data: vello_cpu::peniko::FontData,
}

/// Shaped single-line text ready to draw.
pub(crate) struct TextBlock {
    pub(crate) layout: parley::Layout<TextBrushRgba8>,
    pub(crate) width: f64,
    pub(crate) height: f64,
}

/// Stateful helper for building Parley text layouts from one registered font.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    font: Option<RegisteredFont>,
}

impl TextLayoutEngine {
    /// Register `font_bytes` once; registration failure degrades to shape-only rendering.
    pub(crate) fn new(font_bytes: Option<&[u8]>) -> Self {
        let mut font_ctx = parley::FontContext::default();
        let font = font_bytes.and_then(|bytes| {
            let families = font_ctx
                .collection
                .register_fonts(parley::fontique::Blob::from(bytes.to_vec()), None);
            let Some(family_name) = families
                .first()
                .and_then(|(id, _)| font_ctx.collection.family_name(*id))
                .map(str::to_string)
            else {
                tracing::warn!("font bytes registered no usable family; drawing without text");
                return None;
            };
            Some(RegisteredFont {
                family_name,
                data: vello_cpu::peniko::FontData::new(
                    vello_cpu::peniko::Blob::from(bytes.to_vec()),
                    0,
                ),
            })
        });
        Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            font,
        }
    }

    pub(crate) fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub(crate) fn font_data(&self) -> Option<&vello_cpu::peniko::FontData> {
        self.font.as_ref().map(|f| &f.data)
    }

    /// Shape `text` on one line. `None` when no font is registered or the text is empty.
    pub(crate) fn layout_line(
        &mut self,
        text: &str,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> Option<TextBlock> {
        let font = self.font.as_ref()?;
        if text.is_empty() || !size_px.is_finite() || size_px <= 0.0 {
            return None;
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(font.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        let width = f64::from(layout.width());
        let height = f64::from(layout.height());
        Some(TextBlock {
            layout,
            width,
            height,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;

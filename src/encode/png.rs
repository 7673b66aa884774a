use std::path::Path;

use image::ImageEncoder as _;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};

use crate::foundation::error::{StridashError, StridashResult};
use crate::render::backend::FrameRGBA;

/// PNG signature bytes.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// Encode a frame as a straight-alpha RGBA PNG still.
///
/// Uses fast compression since stills are consumed immediately by the encoder.
pub fn encode_png(frame: &FrameRGBA) -> StridashResult<Vec<u8>> {
    let rgba = frame.to_straight_rgba8();
    let mut buf = Vec::with_capacity(rgba.len() / 4 + 64);
    PngEncoder::new_with_quality(&mut buf, CompressionType::Fast, FilterType::Adaptive)
        .write_image(
            &rgba,
            frame.width,
            frame.height,
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| StridashError::encode(format!("png encode failed: {e}")))?;
    Ok(buf)
}

/// Write a frame to `path` as PNG, creating parent directories.
pub fn write_png(path: &Path, frame: &FrameRGBA) -> StridashResult<()> {
    crate::encode::ffmpeg::ensure_parent_dir(path)?;
    let bytes = encode_png(frame)?;
    use anyhow::Context as _;
    std::fs::write(path, bytes).with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/png.rs"]
mod tests;

use crate::foundation::error::{StridashError, StridashResult};
use crate::foundation::math::{mul_div255_u16, premul_over_px};

/// A rendered frame as RGBA8 pixels.
///
/// Frames are **premultiplied alpha** unless `premultiplied` says otherwise. Gauge overlays and
/// composited frames are always premultiplied; only export boundaries (PNG stills) unpremultiply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Fully transparent premultiplied frame.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; byte_len(width, height)],
            premultiplied: true,
        }
    }

    /// Wrap premultiplied bytes, checking the buffer length.
    pub fn from_premul(width: u32, height: u32, data: Vec<u8>) -> StridashResult<Self> {
        check_len(width, height, &data)?;
        Ok(Self {
            width,
            height,
            data,
            premultiplied: true,
        })
    }

    /// Premultiply straight-alpha RGBA8 bytes (e.g. decoded video frames).
    pub fn from_straight(width: u32, height: u32, mut data: Vec<u8>) -> StridashResult<Self> {
        check_len(width, height, &data)?;
        for px in data.chunks_exact_mut(4) {
            let a = u16::from(px[3]);
            if a == 255 {
                continue;
            }
            for c in &mut px[..3] {
                *c = mul_div255_u16(u16::from(*c), a) as u8;
            }
        }
        Ok(Self {
            width,
            height,
            data,
            premultiplied: true,
        })
    }

    /// Premultiplied pixel at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// `true` when every pixel is fully transparent.
    pub fn is_blank(&self) -> bool {
        self.data.chunks_exact(4).all(|px| px[3] == 0)
    }

    /// Source-over `src` onto `self` with its top-left corner at `(x, y)`.
    ///
    /// Parts of `src` that fall outside this frame are clipped.
    pub fn composite_over(&mut self, src: &FrameRGBA, x: i64, y: i64) {
        let dst_w = i64::from(self.width);
        let dst_h = i64::from(self.height);
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + i64::from(src.width)).min(dst_w);
        let y1 = (y + i64::from(src.height)).min(dst_h);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let span = ((x1 - x0) * 4) as usize;
        for dy in y0..y1 {
            let sy = (dy - y) as usize;
            let sx = (x0 - x) as usize;
            let s_off = (sy * src.width as usize + sx) * 4;
            let d_off = (dy as usize * self.width as usize + x0 as usize) * 4;
            let s_row = &src.data[s_off..s_off + span];
            let d_row = &mut self.data[d_off..d_off + span];
            for (d, s) in d_row.chunks_exact_mut(4).zip(s_row.chunks_exact(4)) {
                let out = premul_over_px([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
                d.copy_from_slice(&out);
            }
        }
    }

    /// Straight-alpha copy of the pixel data, as image codecs expect.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        if !self.premultiplied {
            return self.data.clone();
        }
        let mut out = self.data.clone();
        for px in out.chunks_exact_mut(4) {
            let a = u32::from(px[3]);
            if a == 0 {
                px[..3].fill(0);
                continue;
            }
            if a == 255 {
                continue;
            }
            for c in &mut px[..3] {
                *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
            }
        }
        out
    }
}

fn byte_len(width: u32, height: u32) -> usize {
    (width as usize)
        .saturating_mul(height as usize)
        .saturating_mul(4)
}

fn check_len(width: u32, height: u32, data: &[u8]) -> StridashResult<()> {
    if data.len() != byte_len(width, height) {
        return Err(StridashError::render(format!(
            "frame buffer has {} bytes, expected {} for {width}x{height}",
            data.len(),
            byte_len(width, height)
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/backend.rs"]
mod tests;

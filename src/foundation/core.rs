use crate::foundation::error::{StridashError, StridashResult};

/// Absolute 0-based frame index in output video space.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Frame rate used when the probed video does not report one.
    pub const DEFAULT: Fps = Fps { num: 30, den: 1 };

    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> StridashResult<Self> {
        if den == 0 {
            return Err(StridashError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(StridashError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert a decimal rate as reported by container probes (`30`, `29.97`, `23.976`).
    ///
    /// Integral rates map to `n/1`, NTSC-style rates to `n/1001`, anything else to millihertz.
    pub fn from_rate(rate: f64) -> StridashResult<Self> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(StridashError::validation(format!(
                "frame rate must be finite and > 0, got {rate}"
            )));
        }
        let rounded = rate.round();
        if (rate - rounded).abs() < 1e-6 {
            return Self::new(rounded as u32, 1);
        }
        let ntsc = (rate * 1001.0).round();
        if (ntsc / 1001.0 - rate).abs() < 1e-3 && (ntsc as u64).is_multiple_of(1000) {
            return Self::new(ntsc as u32, 1001);
        }
        Self::new((rate * 1000.0).round() as u32, 1000)
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Seconds from frame 0 to the start of `frame`.
    pub fn frame_to_secs(self, frame: FrameIndex) -> f64 {
        (frame.0 as f64) * self.frame_duration_secs()
    }

    /// Number of frames covering `duration_secs`, rounded to the nearest frame.
    pub fn total_frames(self, duration_secs: f64) -> u64 {
        (duration_secs * self.as_f64()).round().max(0.0) as u64
    }

    /// `num/den` form understood by ffmpeg's `-framerate` and `-r`.
    pub fn to_ffmpeg_arg(self) -> String {
        format!("{}/{}", self.num, self.den)
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> StridashResult<Self> {
        if width == 0 || height == 0 {
            return Err(StridashError::validation(
                "canvas width/height must be non-zero",
            ));
        }
        if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
            return Err(StridashError::validation(format!(
                "canvas {width}x{height} exceeds the {0}x{0} raster limit",
                u16::MAX
            )));
        }
        Ok(Self { width, height })
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgba8Premul {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Straight-alpha RGBA8 color, serialized as a CSS-style hex string (`#rgb`, `#rrggbb`,
/// `#rrggbbaa`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const WHITE: Rgba8 = Rgba8::rgb(255, 255, 255);
    pub const BLACK: Rgba8 = Rgba8::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_hex(s: &str) -> StridashResult<Self> {
        let hex = s
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| StridashError::validation(format!("color '{s}' must start with '#'")))?;
        let nibble = |c: u8| -> StridashResult<u8> {
            (c as char)
                .to_digit(16)
                .map(|d| d as u8)
                .ok_or_else(|| StridashError::validation(format!("color '{s}' is not hex")))
        };
        let bytes = hex.as_bytes();
        match bytes.len() {
            3 => {
                let r = nibble(bytes[0])?;
                let g = nibble(bytes[1])?;
                let b = nibble(bytes[2])?;
                Ok(Self::rgb(r * 17, g * 17, b * 17))
            }
            6 | 8 => {
                let mut ch = [255u8; 4];
                for (i, pair) in bytes.chunks_exact(2).enumerate() {
                    ch[i] = nibble(pair[0])? * 16 + nibble(pair[1])?;
                }
                Ok(Self::rgba(ch[0], ch[1], ch[2], ch[3]))
            }
            _ => Err(StridashError::validation(format!(
                "color '{s}' must have 3, 6 or 8 hex digits"
            ))),
        }
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Multiply the alpha channel by `opacity` in `[0, 1]`.
    pub fn fade(self, opacity: f32) -> Self {
        let op = opacity.clamp(0.0, 1.0);
        Self {
            a: (f32::from(self.a) * op).round() as u8,
            ..self
        }
    }

    pub fn to_premul(self) -> Rgba8Premul {
        let a16 = u16::from(self.a);
        let premul = |c: u8| -> u8 { (((u16::from(c) * a16) + 127) / 255) as u8 };
        Rgba8Premul {
            r: premul(self.r),
            g: premul(self.g),
            b: premul(self.b),
            a: self.a,
        }
    }
}

impl serde::Serialize for Rgba8 {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Rgba8 {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Rgba8::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Cooperative cancellation flag shared between a session and its encoder.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(std::sync::Arc<std::sync::atomic::AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;

use std::path::PathBuf;

use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{StridashError, StridashResult};
use crate::render::backend::FrameRGBA;

/// Portrait canvas assumed when the metadata omits dimensions.
pub const DEFAULT_VIDEO_WIDTH: u32 = 1080;
pub const DEFAULT_VIDEO_HEIGHT: u32 = 1920;

/// Probed metadata of the source video, as supplied by the probing collaborator.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMeta {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    /// Frames per second; absent or unusable rates fall back to 30.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
    /// Seconds.
    pub duration: f64,
    #[serde(default)]
    pub file_path: PathBuf,
}

fn default_width() -> u32 {
    DEFAULT_VIDEO_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_VIDEO_HEIGHT
}

impl VideoMeta {
    pub fn validate(&self) -> StridashResult<()> {
        Canvas::new(self.width, self.height)?;
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(StridashError::validation(format!(
                "video duration must be finite and > 0, got {}",
                self.duration
            )));
        }
        Ok(())
    }

    pub fn canvas(&self) -> StridashResult<Canvas> {
        Canvas::new(self.width, self.height)
    }

    /// Effective frame rate.
    pub fn fps(&self) -> Fps {
        self.fps
            .and_then(|r| Fps::from_rate(r).ok())
            .unwrap_or(Fps::DEFAULT)
    }

    /// Frames in the composition: `round(duration * fps)`.
    pub fn total_frames(&self) -> u64 {
        self.fps().total_frames(self.duration)
    }
}

/// Supplies underlying video pixels for the compositor.
pub trait VideoSource {
    /// Length of the source in seconds.
    fn duration_secs(&self) -> f64;

    /// Frame at `t` seconds scaled to fill `canvas`, or `None` when nothing can be shown.
    fn frame_at(&mut self, t: f64, canvas: Canvas) -> StridashResult<Option<FrameRGBA>>;
}

/// Seeks and decodes single frames with the system `ffmpeg`.
#[derive(Clone, Debug)]
pub struct FfmpegVideoSource {
    path: PathBuf,
    duration: f64,
    program: String,
}

impl FfmpegVideoSource {
    pub fn new(path: impl Into<PathBuf>, duration: f64) -> Self {
        Self {
            path: path.into(),
            duration,
            program: crate::encode::ffmpeg::ffmpeg_program(),
        }
    }

    pub fn from_meta(meta: &VideoMeta) -> Self {
        Self::new(meta.file_path.clone(), meta.duration)
    }
}

impl VideoSource for FfmpegVideoSource {
    fn duration_secs(&self) -> f64 {
        self.duration
    }

    fn frame_at(&mut self, t: f64, canvas: Canvas) -> StridashResult<Option<FrameRGBA>> {
        let out = std::process::Command::new(&self.program)
            .args(["-v", "error", "-ss", &format!("{t:.9}")])
            .arg("-i")
            .arg(&self.path)
            .args([
                "-frames:v",
                "1",
                "-vf",
                &format!("scale={}:{}", canvas.width, canvas.height),
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "pipe:1",
            ])
            .output()
            .map_err(|e| {
                StridashError::render(format!("failed to run ffmpeg for video decode: {e}"))
            })?;

        if !out.status.success() {
            return Err(StridashError::render(format!(
                "ffmpeg video decode failed for '{}': {}",
                self.path.display(),
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }

        let expected = canvas.width as usize * canvas.height as usize * 4;
        if out.stdout.is_empty() {
            // Seeking to the very end yields no frame.
            tracing::debug!(t, path = %self.path.display(), "no video frame decoded");
            return Ok(None);
        }
        if out.stdout.len() < expected {
            return Err(StridashError::render(format!(
                "decoded video frame has {} bytes, expected {expected}",
                out.stdout.len()
            )));
        }
        let mut bytes = out.stdout;
        bytes.truncate(expected);
        FrameRGBA::from_straight(canvas.width, canvas.height, bytes).map(Some)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/video.rs"]
mod tests;

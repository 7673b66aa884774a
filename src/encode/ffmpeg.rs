use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::encode::bridge::drain_tail;
use crate::encode::overlay::{DEFAULT_ENCODER_TIMEOUT, DEFAULT_STDERR_TAIL_BYTES};
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{FrameIndex, Rgba8};
use crate::foundation::error::{StridashError, StridashResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::backend::FrameRGBA;

/// Environment variable naming the `ffmpeg` executable.
pub const FFMPEG_ENV_VAR: &str = "STRIDASH_FFMPEG";

/// Options for [`FfmpegSink`].
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    pub out_path: PathBuf,
    pub overwrite: bool,
    /// Colour shown where the overlay is transparent and no video was drawn.
    pub matte: Rgba8,
    pub program: String,
    /// Upper bound on the capture process's run time, counted from `begin`.
    pub timeout: Duration,
}

impl FfmpegSinkOpts {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            matte: Rgba8::BLACK,
            program: ffmpeg_program(),
            timeout: DEFAULT_ENCODER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A running capture process.
struct Capture {
    child: Child,
    stdin: Option<ChildStdin>,
    stderr_tail: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    cfg: SinkConfig,
    last_idx: Option<FrameIndex>,
    deadline: Instant,
}

impl Capture {
    fn stderr_tail(&mut self) -> String {
        let bytes = self
            .stderr_tail
            .take()
            .and_then(|h| h.join().ok())
            .and_then(Result::ok)
            .unwrap_or_default();
        String::from_utf8_lossy(&bytes).trim().to_owned()
    }

    /// Stop the process and return whatever it wrote to stderr.
    fn kill(&mut self) -> String {
        drop(self.stdin.take());
        let _ = self.child.kill();
        let _ = self.child.wait();
        self.stderr_tail()
    }
}

/// Real-time capture: flattens each composited frame onto the matte and pipes it to `ffmpeg`
/// as raw RGBA, producing an H.264 MP4 at `out_path`.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,
    capture: Option<Capture>,
    opaque: Vec<u8>,
}

impl FfmpegSink {
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            capture: None,
            opaque: Vec::new(),
        }
    }

    pub fn opts(&self) -> &FfmpegSinkOpts {
        &self.opts
    }

    fn raw_args(&self, cfg: &SinkConfig) -> Vec<String> {
        let size = format!("{}x{}", cfg.width, cfg.height);
        let rate = cfg.fps.to_ffmpeg_arg();
        let overwrite = if self.opts.overwrite { "-y" } else { "-n" };
        [
            overwrite, "-loglevel", "error", "-f", "rawvideo", "-pix_fmt", "rgba", "-s", &size,
            "-r", &rate, "-i", "pipe:0", "-an", "-c:v", "libx264", "-pix_fmt", "yuv420p",
            "-movflags", "+faststart",
        ]
        .iter()
        .map(|s| (*s).to_owned())
        .collect()
    }

    /// Tear down the capture after a failure; returns the encoder's stderr tail.
    fn shut_down(&mut self) -> String {
        let tail = self
            .capture
            .take()
            .map(|mut cap| cap.kill())
            .unwrap_or_default();
        let _ = std::fs::remove_file(&self.opts.out_path);
        tail
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> StridashResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(StridashError::validation("capture size must be non-zero"));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(StridashError::validation(format!(
                "capture size {}x{} must be even (required for yuv420p mp4 output)",
                cfg.width, cfg.height
            )));
        }
        if self.capture.is_some() {
            return Err(StridashError::encode("capture already running"));
        }
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(StridashError::validation(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }
        ensure_parent_dir(&self.opts.out_path)?;

        let mut child = Command::new(&self.opts.program)
            .args(self.raw_args(&cfg))
            .arg(&self.opts.out_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                StridashError::encode(format!(
                    "failed to spawn {} (is it installed and on PATH?): {e}",
                    self.opts.program
                ))
            })?;
        let stdin = child.stdin.take();
        let stderr_tail = child
            .stderr
            .take()
            .map(|err| std::thread::spawn(move || drain_tail(err, DEFAULT_STDERR_TAIL_BYTES)));

        tracing::debug!(
            out = %self.opts.out_path.display(),
            width = cfg.width,
            height = cfg.height,
            "capture started"
        );
        self.opaque = vec![0u8; cfg.width as usize * cfg.height as usize * 4];
        self.capture = Some(Capture {
            child,
            stdin,
            stderr_tail,
            cfg,
            last_idx: None,
            deadline: Instant::now() + self.opts.timeout,
        });
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> StridashResult<()> {
        let Some(cap) = self.capture.as_mut() else {
            return Err(StridashError::encode("capture not started"));
        };
        if cap.last_idx.is_some_and(|last| idx <= last) {
            return Err(StridashError::encode(format!(
                "capture received frame {} out of order",
                idx.0
            )));
        }
        if frame.width != cap.cfg.width || frame.height != cap.cfg.height {
            return Err(StridashError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cap.cfg.width, cap.cfg.height
            )));
        }
        if Instant::now() >= cap.deadline {
            let tail = self.shut_down();
            return Err(StridashError::timeout(format!(
                "capture exceeded {:?} at frame {} and was killed: {tail}",
                self.opts.timeout, idx.0
            )));
        }
        cap.last_idx = Some(idx);

        if frame.premultiplied {
            flatten_premul_over_bg_to_opaque_rgba8(&mut self.opaque, &frame.data, self.opts.matte)?;
        } else {
            let premul = FrameRGBA::from_straight(frame.width, frame.height, frame.data.clone())?;
            flatten_premul_over_bg_to_opaque_rgba8(&mut self.opaque, &premul.data, self.opts.matte)?;
        }

        let written = match cap.stdin.as_mut() {
            Some(stdin) => stdin.write_all(&self.opaque),
            None => return Err(StridashError::encode("capture input already closed")),
        };
        match written {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                let tail = self.shut_down();
                Err(StridashError::encode(format!(
                    "encoder closed its input at frame {}: {tail}",
                    idx.0
                )))
            }
            Err(e) => {
                self.shut_down();
                Err(StridashError::encode(format!(
                    "failed to write frame {}: {e}",
                    idx.0
                )))
            }
        }
    }

    fn end(&mut self) -> StridashResult<()> {
        let Some(mut cap) = self.capture.take() else {
            return Err(StridashError::encode("capture not started"));
        };
        drop(cap.stdin.take());
        let status = match wait_until(&mut cap.child, cap.deadline) {
            Ok(Some(status)) => status,
            Ok(None) => {
                self.capture = Some(cap);
                let tail = self.shut_down();
                return Err(StridashError::timeout(format!(
                    "capture exceeded {:?} and was killed: {tail}",
                    self.opts.timeout
                )));
            }
            Err(e) => {
                self.capture = Some(cap);
                self.shut_down();
                return Err(StridashError::encode(format!(
                    "failed to wait for encoder: {e}"
                )));
            }
        };
        let tail = cap.stderr_tail();
        if !status.success() {
            let _ = std::fs::remove_file(&self.opts.out_path);
            return Err(StridashError::encode(format!(
                "encoder exited with status {status}: {tail}"
            )));
        }
        tracing::debug!(out = %self.opts.out_path.display(), frames = ?cap.last_idx, "capture finished");
        Ok(())
    }

    fn abort(&mut self) {
        if self.capture.is_some() {
            self.shut_down();
        }
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Wait for `child` to exit, giving up at `deadline`. `Ok(None)` means it is still running.
pub(crate) fn wait_until(child: &mut Child, deadline: Instant) -> std::io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}

/// Composite premultiplied `src` over the opaque `matte`, writing opaque RGBA8 into `dst`.
pub(crate) fn flatten_premul_over_bg_to_opaque_rgba8(
    dst: &mut [u8],
    src_premul: &[u8],
    matte: Rgba8,
) -> StridashResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(StridashError::validation(
            "flatten expects equal-length rgba8 buffers",
        ));
    }
    let bg = [u16::from(matte.r), u16::from(matte.g), u16::from(matte.b)];

    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let inv = 255 - u16::from(s[3]);
        for c in 0..3 {
            d[c] = (u16::from(s[c]) + mul_div255_u16(bg[c], inv)).min(255) as u8;
        }
        d[3] = 255;
    }
    Ok(())
}

/// The `ffmpeg` executable: `STRIDASH_FFMPEG` when set, else `ffmpeg` from `PATH`.
pub fn ffmpeg_program() -> String {
    std::env::var(FFMPEG_ENV_VAR)
        .ok()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| "ffmpeg".to_owned())
}

/// Create the parent directory of `path` if it has one.
pub fn ensure_parent_dir(path: &Path) -> StridashResult<()> {
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    use anyhow::Context as _;
    std::fs::create_dir_all(parent)
        .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    Ok(())
}

/// `true` when [`ffmpeg_program`] answers `-version`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new(ffmpeg_program())
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;

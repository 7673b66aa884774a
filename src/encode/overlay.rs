use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;

use crate::encode::ffmpeg::ffmpeg_program;
use crate::foundation::core::{Canvas, Fps};

/// Default upper bound on encoder run time.
pub const DEFAULT_ENCODER_TIMEOUT: Duration = Duration::from_secs(600);
/// Default bound on captured encoder diagnostics.
pub const DEFAULT_STDERR_TAIL_BYTES: usize = 16 * 1024;

/// Options for the overlay encoder subprocess.
#[derive(Clone, Debug, PartialEq)]
pub struct EncoderOpts {
    /// Executable to spawn.
    pub program: String,
    /// Arguments placed before the generated ones (wrappers such as `nice -n 10`).
    pub leading_args: Vec<String>,
    /// Overwrite an existing output file.
    pub overwrite: bool,
    pub profile: String,
    pub preset: String,
    pub crf: u8,
    pub audio_bitrate: String,
    /// The encoder is killed when it runs longer than this.
    pub timeout: Duration,
    pub stderr_tail_bytes: usize,
}

impl Default for EncoderOpts {
    fn default() -> Self {
        Self {
            program: ffmpeg_program(),
            leading_args: Vec::new(),
            overwrite: true,
            profile: "high".to_owned(),
            preset: "medium".to_owned(),
            crf: 18,
            audio_bitrate: "128k".to_owned(),
            timeout: DEFAULT_ENCODER_TIMEOUT,
            stderr_tail_bytes: DEFAULT_STDERR_TAIL_BYTES,
        }
    }
}

impl EncoderOpts {
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = preset.into();
        self
    }

    pub fn with_crf(mut self, crf: u8) -> Self {
        self.crf = crf;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// One batch composite: the source video plus a PNG still stream on stdin.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayJob {
    pub video_path: PathBuf,
    pub out_path: PathBuf,
    pub canvas: Canvas,
    pub fps: Fps,
    /// Output time at which the source video starts. Positive values delay it behind a black
    /// lead-in; negative values skip into it.
    pub video_start_offset: f64,
}

/// Builds the `ffmpeg` invocation that composites gauge stills over the source video.
#[derive(Clone, Debug, Default)]
pub struct OverlayEncoder {
    opts: EncoderOpts,
}

impl OverlayEncoder {
    pub fn new(opts: EncoderOpts) -> Self {
        Self { opts }
    }

    pub fn opts(&self) -> &EncoderOpts {
        &self.opts
    }

    /// Filter graph: fit and pad the source to the canvas, then overlay the stills at `0:0`.
    ///
    /// A positive `video_start_offset` prepends that many seconds of black before the source.
    pub fn filter_graph(canvas: Canvas, video_start_offset: f64) -> String {
        let (w, h) = (canvas.width, canvas.height);
        let lead_in = if video_start_offset > 0.0 {
            format!("setpts=PTS-STARTPTS,tpad=start_duration={video_start_offset:.6}:color=black,")
        } else {
            String::new()
        };
        format!(
            "[0:v]{lead_in}scale={w}:{h}:force_original_aspect_ratio=decrease,\
             pad={w}:{h}:(ow-iw)/2:(oh-ih)/2[bg];[bg][1:v]overlay=0:0[out]"
        )
    }

    /// Input options placed before the source video's `-i`.
    ///
    /// A positive offset shifts the source audio by `-itsoffset` (video is padded in the filter
    /// graph); a negative offset seeks past the start of the source.
    fn source_input_args(video_start_offset: f64) -> Vec<String> {
        if video_start_offset > 0.0 {
            vec!["-itsoffset".to_owned(), format!("{video_start_offset:.6}")]
        } else if video_start_offset < 0.0 {
            vec!["-ss".to_owned(), format!("{:.6}", -video_start_offset)]
        } else {
            Vec::new()
        }
    }

    /// Full argument list, leading args first and output path last.
    pub fn args(&self, job: &OverlayJob) -> Vec<OsString> {
        let o = &self.opts;
        let mut args: Vec<OsString> = o.leading_args.iter().map(OsString::from).collect();
        let mut push = |a: &str| args.push(OsString::from(a));

        push(if o.overwrite { "-y" } else { "-n" });
        push("-loglevel");
        push("error");
        for a in Self::source_input_args(job.video_start_offset) {
            push(a.as_str());
        }
        push("-i");
        args.push(job.video_path.clone().into_os_string());

        let crf = o.crf.to_string();
        let fps = job.fps.to_ffmpeg_arg();
        let filter = Self::filter_graph(job.canvas, job.video_start_offset);
        args.extend(
            [
                "-f",
                "image2pipe",
                "-framerate",
                fps.as_str(),
                "-c:v",
                "png",
                "-i",
                "pipe:0",
                "-filter_complex",
                filter.as_str(),
                "-map",
                "[out]",
                "-map",
                "0:a?",
                "-c:v",
                "libx264",
                "-profile:v",
                o.profile.as_str(),
                "-preset",
                o.preset.as_str(),
                "-crf",
                crf.as_str(),
                "-c:a",
                "aac",
                "-b:a",
                o.audio_bitrate.as_str(),
                "-movflags",
                "+faststart",
                "-pix_fmt",
                "yuv420p",
            ]
            .map(OsString::from),
        );
        args.push(job.out_path.clone().into_os_string());
        args
    }

    /// Ready-to-spawn command with stdin piped and stderr captured.
    pub fn command(&self, job: &OverlayJob) -> Command {
        let mut cmd = Command::new(&self.opts.program);
        cmd.args(self.args(job))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/overlay.rs"]
mod tests;

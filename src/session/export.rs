use std::path::Path;
use std::time::{Duration, Instant};

use crate::encode::bridge::{BridgeOpts, BridgeStats, run_encoder};
use crate::encode::ffmpeg::ensure_parent_dir;
use crate::encode::overlay::{EncoderOpts, OverlayEncoder, OverlayJob};
use crate::foundation::core::{CancelToken, FrameIndex};
use crate::foundation::error::{StridashError, StridashResult};
use crate::render::backend::FrameRGBA;
use crate::render::text::FontSource;
use crate::session::composer::{Composition, FrameComposer};
use crate::session::progress::{ProgressObserver, RenderProgress};
use crate::session::stream::FrameStream;

/// Options for [`export_overlay`].
#[derive(Clone, Debug, PartialEq)]
pub struct ExportOpts {
    /// Encoded stills allowed in flight between compositing and the encoder.
    pub channel_capacity: usize,
    pub encoder: EncoderOpts,
    pub font: FontSource,
    pub show_placeholders: bool,
}

impl Default for ExportOpts {
    fn default() -> Self {
        Self {
            channel_capacity: 4,
            encoder: EncoderOpts::default(),
            font: FontSource::default(),
            show_placeholders: false,
        }
    }
}

impl ExportOpts {
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    pub fn with_encoder(mut self, encoder: EncoderOpts) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_font(mut self, font: FontSource) -> Self {
        self.font = font;
        self
    }
}

/// Summary of a finished export.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportStats {
    pub frames: u64,
    pub bridge: BridgeStats,
    pub elapsed: Duration,
}

/// Batch adapter: composite gauge stills as fast as the encoder accepts them and let the encoder
/// overlay them on `video_path`, writing `out_path`.
///
/// Input is validated before the encoder is spawned. On any failure `out_path` is removed.
#[tracing::instrument(
    skip_all,
    fields(
        video = %video_path.display(),
        out = %out_path.display(),
        frames = comp.total_frames(),
    )
)]
pub fn export_overlay(
    comp: Composition<'_>,
    video_path: &Path,
    out_path: &Path,
    opts: &ExportOpts,
    progress: &mut dyn ProgressObserver,
    cancel: &CancelToken,
) -> StridashResult<ExportStats> {
    comp.validate()?;
    let canvas = comp.canvas;
    if !canvas.width.is_multiple_of(2) || !canvas.height.is_multiple_of(2) {
        return Err(StridashError::validation(format!(
            "output size {}x{} must be even (required for yuv420p mp4 output)",
            canvas.width, canvas.height
        )));
    }
    if !opts.encoder.overwrite && out_path.exists() {
        return Err(StridashError::validation(format!(
            "output file '{}' already exists",
            out_path.display()
        )));
    }

    let total = comp.total_frames();
    progress.on_progress(RenderProgress::loading(total));
    ensure_parent_dir(out_path)?;

    let font = opts.font.load();
    let composer = FrameComposer::new(comp, font.as_deref().map(Vec::as_slice))
        .with_placeholders(opts.show_placeholders);
    let frames = Reporting {
        inner: FrameStream::new(composer, None),
        progress: &mut *progress,
        total,
        finished: false,
    };

    let job = OverlayJob {
        video_path: video_path.to_path_buf(),
        out_path: out_path.to_path_buf(),
        canvas,
        fps: comp.fps,
        video_start_offset: comp.offset.video_start_offset,
    };
    let cmd = OverlayEncoder::new(opts.encoder.clone()).command(&job);
    let bridge_opts = BridgeOpts::from_encoder(opts.channel_capacity, &opts.encoder);

    tracing::info!(total, capacity = bridge_opts.capacity, "export started");
    let started = Instant::now();
    let bridge = match run_encoder(cmd, frames, &bridge_opts, cancel) {
        Ok(stats) => stats,
        Err(e) => {
            discard_output(out_path);
            tracing::warn!(error = %e, "export failed");
            return Err(e);
        }
    };
    if bridge.frames_written < total && !bridge.encoder_closed_early {
        discard_output(out_path);
        return Err(StridashError::encode(format!(
            "encoder accepted {} of {total} frames",
            bridge.frames_written
        )));
    }

    progress.on_progress(RenderProgress::done(total));
    let stats = ExportStats {
        frames: bridge.frames_written,
        bridge,
        elapsed: started.elapsed(),
    };
    tracing::info!(
        frames = stats.frames,
        elapsed_ms = stats.elapsed.as_millis() as u64,
        "export finished"
    );
    Ok(stats)
}

fn discard_output(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "removed partial output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove partial output"),
    }
}

/// Reports `rendering` per frame and `encoding` once the stream is exhausted.
struct Reporting<'p, I> {
    inner: I,
    progress: &'p mut dyn ProgressObserver,
    total: u64,
    finished: bool,
}

impl<I> Iterator for Reporting<'_, I>
where
    I: Iterator<Item = StridashResult<(FrameIndex, FrameRGBA)>>,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        match self.inner.next() {
            Some(Ok((idx, frame))) => {
                self.progress
                    .on_progress(RenderProgress::rendered(idx, self.total));
                Some(Ok((idx, frame)))
            }
            Some(Err(e)) => Some(Err(e)),
            None => {
                if !self.finished {
                    self.finished = true;
                    self.progress.on_progress(RenderProgress::encoding(self.total));
                }
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/export.rs"]
mod tests;

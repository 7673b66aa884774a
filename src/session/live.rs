use std::time::{Duration, Instant};

use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::CancelToken;
use crate::foundation::error::{StridashError, StridashResult};
use crate::media::video::VideoSource;
use crate::render::text::FontSource;
use crate::session::composer::{Composition, FrameComposer};
use crate::session::progress::{ProgressObserver, RenderProgress};
use crate::session::stream::FrameStream;

/// How the live adapter spaces frames in wall-clock time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Pacing {
    /// Never deliver a frame before its presentation time.
    #[default]
    Realtime,
    /// Deliver frames as fast as they are composited.
    Unpaced,
}

/// Options for [`render_live`].
#[derive(Clone, Debug, PartialEq)]
pub struct LiveOpts {
    pub pacing: Pacing,
    /// Yield the thread after every this many frames; 0 disables.
    pub yield_every: u64,
    pub font: FontSource,
    pub show_placeholders: bool,
}

impl Default for LiveOpts {
    fn default() -> Self {
        Self {
            pacing: Pacing::Realtime,
            yield_every: 10,
            font: FontSource::default(),
            show_placeholders: false,
        }
    }
}

impl LiveOpts {
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_font(mut self, font: FontSource) -> Self {
        self.font = font;
        self
    }

    pub fn with_placeholders(mut self, show: bool) -> Self {
        self.show_placeholders = show;
        self
    }
}

/// Counters from one live pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LiveStats {
    pub frames: u64,
    pub elapsed: Duration,
}

/// Interactive adapter: composite every frame and hand it to `sink` in real time.
///
/// Progress is reported as `loading` (only with a video), `rendering` after each frame, then
/// `encoding` and `done`. On error or cancellation the sink is aborted.
#[tracing::instrument(skip_all, fields(frames = comp.total_frames(), pacing = ?opts.pacing))]
pub fn render_live(
    comp: Composition<'_>,
    video: Option<&mut dyn VideoSource>,
    sink: &mut dyn FrameSink,
    opts: &LiveOpts,
    progress: &mut dyn ProgressObserver,
    cancel: &CancelToken,
) -> StridashResult<LiveStats> {
    comp.validate()?;
    let total = comp.total_frames();
    if video.is_some() {
        progress.on_progress(RenderProgress::loading(total));
    }

    let font = opts.font.load();
    let composer =
        FrameComposer::new(comp, font.as_deref().map(Vec::as_slice)).with_placeholders(opts.show_placeholders);
    let stream = FrameStream::new(composer, video);

    sink.begin(SinkConfig {
        width: comp.canvas.width,
        height: comp.canvas.height,
        fps: comp.fps,
    })?;

    let started = Instant::now();
    let res = drive(stream, sink, opts, progress, cancel, started, comp);
    let frames = match res {
        Ok(n) => n,
        Err(e) => {
            sink.abort();
            return Err(e);
        }
    };

    progress.on_progress(RenderProgress::encoding(total));
    sink.end()?;
    progress.on_progress(RenderProgress::done(total));

    let stats = LiveStats {
        frames,
        elapsed: started.elapsed(),
    };
    tracing::info!(frames, elapsed_ms = stats.elapsed.as_millis() as u64, "live render finished");
    Ok(stats)
}

fn drive(
    stream: FrameStream<'_, '_>,
    sink: &mut dyn FrameSink,
    opts: &LiveOpts,
    progress: &mut dyn ProgressObserver,
    cancel: &CancelToken,
    started: Instant,
    comp: Composition<'_>,
) -> StridashResult<u64> {
    let total = comp.total_frames();
    let mut frames = 0u64;
    for item in stream {
        if cancel.is_cancelled() {
            return Err(StridashError::Cancelled);
        }
        let (idx, frame) = item?;

        if opts.pacing == Pacing::Realtime {
            let due = Duration::from_secs_f64(comp.fps.frame_to_secs(idx));
            if let Some(wait) = due.checked_sub(started.elapsed()) {
                std::thread::sleep(wait);
            }
        }

        sink.push_frame(idx, &frame)?;
        frames += 1;
        progress.on_progress(RenderProgress::rendered(idx, total));

        if opts.yield_every > 0 && idx.0.is_multiple_of(opts.yield_every) {
            std::thread::yield_now();
        }
    }
    Ok(frames)
}

#[cfg(test)]
#[path = "../../tests/unit/session/live.rs"]
mod tests;

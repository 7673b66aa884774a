use crate::activity::metric::metric_value;
use crate::activity::sample::Timeline;
use crate::activity::sync::{SyncEngine, SyncOffset};
use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::{StridashError, StridashResult};
use crate::gauge::damping::DampingEngine;
use crate::gauge::model::{GaugeSpec, validate_gauges};
use crate::gauge::render::{GaugeRenderer, RenderRequest};
use crate::gauge::sparkline::SparklineHistory;
use crate::media::video::VideoSource;
use crate::render::backend::FrameRGBA;

/// Read-only inputs of one render pass.
#[derive(Clone, Copy, Debug)]
pub struct Composition<'a> {
    pub timeline: &'a Timeline,
    pub offset: SyncOffset,
    pub gauges: &'a [GaugeSpec],
    pub canvas: Canvas,
    pub fps: Fps,
    /// Length of the output in seconds.
    pub duration_secs: f64,
}

impl Composition<'_> {
    pub fn total_frames(&self) -> u64 {
        self.fps.total_frames(self.duration_secs)
    }

    pub fn validate(&self) -> StridashResult<()> {
        self.offset.validate()?;
        validate_gauges(self.gauges)?;
        if !self.duration_secs.is_finite() || self.duration_secs <= 0.0 {
            return Err(StridashError::validation(format!(
                "duration must be finite and > 0, got {}",
                self.duration_secs
            )));
        }
        Ok(())
    }
}

/// Composites the video frame and all visible gauges for one frame index.
///
/// Owns the damping and sparkline state of one session; both adapters drive frames through
/// [`FrameComposer::compose_frame`].
pub struct FrameComposer<'a> {
    comp: Composition<'a>,
    sync: SyncEngine<'a>,
    damping: DampingEngine,
    history: SparklineHistory,
    renderer: GaugeRenderer,
    show_placeholders: bool,
}

impl<'a> FrameComposer<'a> {
    pub fn new(comp: Composition<'a>, font_bytes: Option<&[u8]>) -> Self {
        Self {
            sync: SyncEngine::new(comp.timeline, comp.offset),
            comp,
            damping: DampingEngine::new(),
            history: SparklineHistory::new(),
            renderer: GaugeRenderer::new(font_bytes),
            show_placeholders: false,
        }
    }

    /// Draw dimmed placeholders instead of skipping gauges without a value.
    pub fn with_placeholders(mut self, show: bool) -> Self {
        self.show_placeholders = show;
        self
    }

    pub fn composition(&self) -> &Composition<'a> {
        &self.comp
    }

    pub fn damping(&self) -> &DampingEngine {
        &self.damping
    }

    pub fn history(&self) -> &SparklineHistory {
        &self.history
    }

    /// Source video time shown at `frame`, when it lies within `[0, duration]`.
    pub fn video_time(&self, frame: FrameIndex, duration: f64) -> Option<f64> {
        let t = self.comp.fps.frame_to_secs(frame) - self.comp.offset.video_start_offset;
        (t >= 0.0 && t <= duration).then_some(t)
    }

    /// Composite frame `frame`: video background (when given and in range), then every visible
    /// gauge that has a value at the synced activity time.
    pub fn compose_frame(
        &mut self,
        frame: FrameIndex,
        video: Option<&mut (dyn VideoSource + '_)>,
    ) -> StridashResult<FrameRGBA> {
        let canvas = self.comp.canvas;
        let mut out = FrameRGBA::transparent(canvas.width, canvas.height);

        if let Some(src) = video
            && let Some(t) = self.video_time(frame, src.duration_secs())
            && let Some(bg) = src.frame_at(t, canvas)?
        {
            if bg.width == canvas.width && bg.height == canvas.height && bg.premultiplied {
                out = bg;
            } else {
                out.composite_over(&bg, 0, 0);
            }
        }

        let sample = self.sync.sample_at_frame(frame, self.comp.fps);
        let gauges = self.comp.gauges;

        for spec in gauges.iter().filter(|g| g.visible) {
            let raw = sample.as_ref().and_then(|s| metric_value(s, spec.metric));
            let value = match raw {
                Some(v) => Some(self.damping.smooth(&spec.id, v, Some(spec.damping()))),
                None if self.show_placeholders => None,
                None => continue,
            };

            let rect = spec.pixel_rect(canvas);
            if rect.width == 0 || rect.height == 0 {
                continue;
            }
            let req = RenderRequest::for_gauge(spec, value, rect);
            let img = self.renderer.render(&req, &mut self.history)?;
            out.composite_over(&img, rect.x, rect.y);
        }

        tracing::trace!(frame = frame.0, has_sample = sample.is_some(), "frame composed");
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/composer.rs"]
mod tests;

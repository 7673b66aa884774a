use crate::foundation::core::FrameIndex;

pub use crate::foundation::core::CancelToken;

/// Stage of a render session, in the order they are reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderPhase {
    Loading,
    Rendering,
    Encoding,
    Done,
}

/// Progress snapshot reported to the session observer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderProgress {
    pub current_frame: u64,
    pub total_frames: u64,
    pub phase: RenderPhase,
}

impl RenderProgress {
    pub fn loading(total_frames: u64) -> Self {
        Self {
            current_frame: 0,
            total_frames,
            phase: RenderPhase::Loading,
        }
    }

    /// Reported after `frame` has been composited.
    pub fn rendered(frame: FrameIndex, total_frames: u64) -> Self {
        Self {
            current_frame: frame.0,
            total_frames,
            phase: RenderPhase::Rendering,
        }
    }

    pub fn encoding(total_frames: u64) -> Self {
        Self {
            current_frame: total_frames,
            total_frames,
            phase: RenderPhase::Encoding,
        }
    }

    pub fn done(total_frames: u64) -> Self {
        Self {
            current_frame: total_frames,
            total_frames,
            phase: RenderPhase::Done,
        }
    }

    /// Completed fraction in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        match self.phase {
            RenderPhase::Loading => 0.0,
            RenderPhase::Done => 1.0,
            _ if self.total_frames == 0 => 1.0,
            _ => (self.current_frame as f64 / self.total_frames as f64).clamp(0.0, 1.0),
        }
    }
}

/// Receives progress updates from a session.
pub trait ProgressObserver {
    fn on_progress(&mut self, progress: RenderProgress);
}

/// Observer that ignores all updates.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&mut self, _progress: RenderProgress) {}
}

impl<F: FnMut(RenderProgress)> ProgressObserver for F {
    fn on_progress(&mut self, progress: RenderProgress) {
        self(progress)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/progress.rs"]
mod tests;

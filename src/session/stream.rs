use crate::foundation::core::FrameIndex;
use crate::foundation::error::StridashResult;
use crate::media::video::VideoSource;
use crate::render::backend::FrameRGBA;
use crate::session::composer::FrameComposer;

/// Single-pass, finite sequence of composited frames in index order.
///
/// Frames are produced lazily; nothing is rendered ahead of the consumer. The stream ends after
/// the last frame or after the first error.
pub struct FrameStream<'a, 'v> {
    composer: FrameComposer<'a>,
    video: Option<&'v mut (dyn VideoSource + 'v)>,
    next: u64,
    total: u64,
}

impl<'a, 'v> FrameStream<'a, 'v> {
    pub fn new(composer: FrameComposer<'a>, video: Option<&'v mut (dyn VideoSource + 'v)>) -> Self {
        let total = composer.composition().total_frames();
        Self {
            composer,
            video,
            next: 0,
            total,
        }
    }

    pub fn total_frames(&self) -> u64 {
        self.total
    }

    /// Frames not yet produced.
    pub fn remaining(&self) -> u64 {
        self.total - self.next
    }

    /// Recover the composer, e.g. to inspect session state after the pass.
    pub fn into_composer(self) -> FrameComposer<'a> {
        self.composer
    }
}

impl Iterator for FrameStream<'_, '_> {
    type Item = StridashResult<(FrameIndex, FrameRGBA)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total {
            return None;
        }
        let idx = FrameIndex(self.next);
        let video = self.video.as_deref_mut();
        match self.composer.compose_frame(idx, video) {
            Ok(frame) => {
                self.next += 1;
                Some(Ok((idx, frame)))
            }
            Err(e) => {
                self.next = self.total;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = usize::try_from(self.remaining()).unwrap_or(usize::MAX);
        (0, Some(n))
    }
}

impl std::iter::FusedIterator for FrameStream<'_, '_> {}

#[cfg(test)]
#[path = "../../tests/unit/session/stream.rs"]
mod tests;

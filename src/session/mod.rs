//! Render sessions: the per-frame composer shared by the live and batch adapters.

/// Per-frame compositing of video and gauges.
pub mod composer;
/// Batch adapter streaming stills into the overlay encoder.
pub mod export;
/// Interactive adapter feeding a frame sink in real time.
pub mod live;
/// Progress reporting and cancellation.
pub mod progress;
/// Lazy frame iterator.
pub mod stream;

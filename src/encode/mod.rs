//! Encoding: frame sinks for live capture, PNG stills, and the batch overlay encoder.

/// Bounded producer/encoder bridge for batch export.
pub mod bridge;
/// `ffmpeg` raw-frame sink and process helpers.
pub mod ffmpeg;
/// Overlay encoder invocation.
pub mod overlay;
/// PNG still encoding.
pub mod png;
/// Generic frame sink trait and built-in sinks.
pub mod sink;

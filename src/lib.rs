//! Stridash overlays activity metrics (heart rate, pace, cadence, power) as animated gauges on
//! action video.
//!
//! The public API is session-oriented:
//!
//! - Parse a [`Timeline`], a [`SyncOffset`] and a list of [`GaugeSpec`]s (or a whole
//!   [`ExportRequest`] document)
//! - Composite single frames with a [`FrameComposer`]
//! - Stream frames into a [`FrameSink`] in real time with [`render_live`], or into the overlay
//!   encoder with [`export_overlay`]
#![forbid(unsafe_code)]

mod foundation;

/// Activity samples, timelines and video-to-activity sync.
pub mod activity;
/// Batch export request surface.
pub mod api;
/// Frame sinks, PNG stills and the overlay encoder bridge.
pub mod encode;
/// Gauge model, smoothing and rasterization.
pub mod gauge;
/// Source video metadata and frame decoding.
pub mod media;
/// Frame buffers, CPU drawing and text.
pub mod render;
/// Render sessions.
pub mod session;

pub use crate::foundation::core::{CancelToken, Canvas, Fps, FrameIndex, Rgba8, Rgba8Premul};
pub use crate::foundation::error::{StridashError, StridashResult};

pub use crate::activity::metric::{MetricKey, metric_value};
pub use crate::activity::sample::{Sample, Timeline};
pub use crate::activity::sync::{SyncEngine, SyncOffset};
pub use crate::api::export::{ExportResponse, export_request};
pub use crate::api::request::{ExportArtifact, ExportRequest};
pub use crate::encode::bridge::{BridgeOpts, BridgeStats, pump_stills, run_encoder};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::overlay::{EncoderOpts, OverlayEncoder, OverlayJob};
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::gauge::damping::DampingEngine;
pub use crate::gauge::model::{ColorZone, GaugeSpec, GaugeStyle, NormPoint, NormSize};
pub use crate::gauge::render::{GaugeRenderer, RenderRequest};
pub use crate::gauge::sparkline::SparklineHistory;
pub use crate::media::video::{FfmpegVideoSource, VideoMeta, VideoSource};
pub use crate::render::backend::FrameRGBA;
pub use crate::render::text::FontSource;
pub use crate::session::composer::{Composition, FrameComposer};
pub use crate::session::export::{ExportOpts, ExportStats, export_overlay};
pub use crate::session::live::{LiveOpts, LiveStats, Pacing, render_live};
pub use crate::session::progress::{
    NoProgress, ProgressObserver, RenderPhase, RenderProgress,
};
pub use crate::session::stream::FrameStream;

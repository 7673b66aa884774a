use std::path::{Path, PathBuf};

use crate::activity::sample::Timeline;
use crate::activity::sync::SyncOffset;
use crate::foundation::core::Canvas;
use crate::foundation::error::{StridashError, StridashResult};
use crate::gauge::model::GaugeSpec;
use crate::media::video::VideoMeta;
use crate::session::composer::Composition;

/// Media type of an export response body.
pub const EXPORT_CONTENT_TYPE: &str = "video/mp4";
/// File name suggested to clients downloading an export.
pub const EXPORT_FILE_NAME: &str = "stridash-export.mp4";

/// Batch render request document.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    #[serde(alias = "fitTimeline")]
    pub timeline: Timeline,
    #[serde(alias = "sync")]
    pub sync_offset: SyncOffset,
    pub gauges: Vec<GaugeSpec>,
    pub video_meta: VideoMeta,
}

impl ExportRequest {
    /// Parse and validate a request document.
    pub fn from_json(bytes: &[u8]) -> StridashResult<Self> {
        let req: Self = serde_json::from_slice(bytes)?;
        req.validate()?;
        Ok(req)
    }

    /// Build a request from separately uploaded JSON fields, as sent by a form upload.
    pub fn from_fields(
        timeline: Option<&str>,
        sync_offset: Option<&str>,
        gauges: Option<&str>,
        video_meta: Option<&str>,
    ) -> StridashResult<Self> {
        let (Some(timeline), Some(sync_offset), Some(gauges), Some(video_meta)) =
            (timeline, sync_offset, gauges, video_meta)
        else {
            return Err(StridashError::validation("Missing required fields"));
        };

        fn field<T: serde::de::DeserializeOwned>(name: &str, s: &str) -> StridashResult<T> {
            serde_json::from_str(s)
                .map_err(|e| StridashError::serde(format!("Invalid JSON in form field '{name}': {e}")))
        }

        let req = Self {
            timeline: field("fitTimeline", timeline)?,
            sync_offset: field("sync", sync_offset)?,
            gauges: field("gauges", gauges)?,
            video_meta: field("videoMeta", video_meta)?,
        };
        req.validate()?;
        Ok(req)
    }

    pub fn validate(&self) -> StridashResult<()> {
        self.sync_offset.validate()?;
        crate::gauge::model::validate_gauges(&self.gauges)?;
        self.canvas()?;
        let d = self.duration_secs();
        if !d.is_finite() || d <= 0.0 {
            return Err(StridashError::validation(format!(
                "video duration must be finite and > 0, got {d}"
            )));
        }
        Ok(())
    }

    pub fn canvas(&self) -> StridashResult<Canvas> {
        self.video_meta.canvas()
    }

    /// Output length: the sync override when present, else the probed duration.
    pub fn duration_secs(&self) -> f64 {
        self.sync_offset
            .video_duration
            .unwrap_or(self.video_meta.duration)
    }

    /// Source video path recorded in the metadata, if any.
    pub fn video_path(&self) -> Option<&Path> {
        let p = self.video_meta.file_path.as_path();
        (!p.as_os_str().is_empty()).then_some(p)
    }

    pub fn composition(&self) -> StridashResult<Composition<'_>> {
        Ok(Composition {
            timeline: &self.timeline,
            offset: self.sync_offset,
            gauges: &self.gauges,
            canvas: self.canvas()?,
            fps: self.video_meta.fps(),
            duration_secs: self.duration_secs(),
        })
    }
}

/// Finished export: the composited video and its response headers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportArtifact {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub content_disposition: String,
}

impl ExportArtifact {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            content_type: EXPORT_CONTENT_TYPE,
            content_disposition: format!("attachment; filename=\"{EXPORT_FILE_NAME}\""),
        }
    }

    pub fn from_file(path: &Path) -> StridashResult<Self> {
        use anyhow::Context as _;
        let bytes = std::fs::read(path)
            .with_context(|| format!("read export output '{}'", path.display()))?;
        Ok(Self::new(bytes))
    }

    pub fn headers(&self) -> [(&'static str, String); 2] {
        [
            ("Content-Type", self.content_type.to_owned()),
            ("Content-Disposition", self.content_disposition.clone()),
        ]
    }
}

/// Scratch directory removed on drop.
#[derive(Debug)]
pub(crate) struct WorkDir(PathBuf);

impl WorkDir {
    pub(crate) fn create() -> StridashResult<Self> {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let dir = std::env::temp_dir().join(format!("stridash-{}-{nanos}", std::process::id()));
        use anyhow::Context as _;
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create work dir '{}'", dir.display()))?;
        Ok(Self(dir))
    }

    pub(crate) fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/api/request.rs"]
mod tests;

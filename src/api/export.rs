use std::path::Path;

use crate::api::request::{ExportArtifact, ExportRequest, WorkDir};
use crate::foundation::core::CancelToken;
use crate::foundation::error::{StridashError, StridashResult};
use crate::session::export::{ExportOpts, export_overlay};
use crate::session::progress::ProgressObserver;

/// Render `req` over `video` (or the path in its metadata) and return the finished MP4.
///
/// The output is written to a scratch directory that is removed before returning.
pub fn export_request(
    req: &ExportRequest,
    video: Option<&Path>,
    opts: &ExportOpts,
    progress: &mut dyn ProgressObserver,
    cancel: &CancelToken,
) -> StridashResult<ExportArtifact> {
    req.validate()?;
    let video = video
        .or_else(|| req.video_path())
        .ok_or_else(|| StridashError::validation("Missing required fields: video"))?;
    let comp = req.composition()?;

    let work = WorkDir::create()?;
    let out = work.path().join("output.mp4");
    export_overlay(comp, video, &out, opts, progress, cancel)?;
    ExportArtifact::from_file(&out)
}

/// Status, headers and body for a request-level caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ExportResponse {
    /// Map an export outcome: client errors to 400, timeouts to 504, everything else to 500.
    pub fn from_result(result: StridashResult<ExportArtifact>) -> Self {
        match result {
            Ok(artifact) => Self {
                status: 200,
                headers: artifact
                    .headers()
                    .into_iter()
                    .map(|(k, v)| (k.to_owned(), v))
                    .collect(),
                body: artifact.bytes,
            },
            Err(e) => {
                let status = match &e {
                    e if e.is_client_error() => 400,
                    StridashError::Timeout(_) => 504,
                    _ => 500,
                };
                let body = serde_json::json!({ "statusCode": status, "message": e.to_string() });
                Self {
                    status,
                    headers: vec![("Content-Type".to_owned(), "application/json".to_owned())],
                    body: body.to_string().into_bytes(),
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/api/export.rs"]
mod tests;

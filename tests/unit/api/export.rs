use super::*;
use crate::encode::overlay::EncoderOpts;
use crate::render::text::FontSource;
use crate::session::progress::NoProgress;

const FIXTURE: &str = include_str!("../../data/export_request.json");

#[test]
fn success_maps_to_download_response() {
    let resp = ExportResponse::from_result(Ok(ExportArtifact::new(b"mp4".to_vec())));
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, b"mp4");
    assert!(resp.headers.contains(&(
        "Content-Disposition".to_owned(),
        r#"attachment; filename="stridash-export.mp4""#.to_owned()
    )));
}

#[test]
fn errors_map_to_status_codes() {
    let bad = ExportResponse::from_result(Err(StridashError::validation("Missing required fields")));
    assert_eq!(bad.status, 400);
    let body: serde_json::Value = serde_json::from_slice(&bad.body).unwrap();
    assert_eq!(body["statusCode"], 400);
    assert!(body["message"].as_str().unwrap().contains("Missing required fields"));

    assert_eq!(ExportResponse::from_result(Err(StridashError::timeout("slow"))).status, 504);
    assert_eq!(ExportResponse::from_result(Err(StridashError::encode("exit 1"))).status, 500);
}

#[test]
fn invalid_requests_fail_before_spawning() {
    let mut req = ExportRequest::from_json(FIXTURE.as_bytes()).unwrap();
    req.gauges[1].id = "hr".to_owned();
    let opts = ExportOpts::default()
        .with_font(FontSource::Disabled)
        .with_encoder(EncoderOpts::default().with_program("/nonexistent/stridash-ffmpeg"));
    let err = export_request(&req, None, &opts, &mut NoProgress, &CancelToken::new()).unwrap_err();
    assert!(err.is_client_error(), "{err}");
}

#[test]
fn a_video_path_is_required() {
    let mut req = ExportRequest::from_json(FIXTURE.as_bytes()).unwrap();
    req.video_meta.file_path = Default::default();
    let err = export_request(&req, None, &ExportOpts::default(), &mut NoProgress, &CancelToken::new())
        .unwrap_err();
    assert!(err.is_client_error(), "{err}");
}

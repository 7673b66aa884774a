use super::*;
use crate::foundation::core::Fps;

const MATTE: Rgba8 = Rgba8::rgb(10, 20, 30);

#[test]
fn flatten_premul_alpha_0_returns_bg() {
    let src = vec![0u8, 0, 0, 0];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, MATTE).unwrap();
    assert_eq!(dst, vec![10, 20, 30, 255]);
}

#[test]
fn flatten_premul_alpha_255_is_identity() {
    let src = vec![1u8, 2, 3, 255];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, MATTE).unwrap();
    assert_eq!(dst, src);
}

#[test]
fn flatten_premul_half_alpha_blends_with_the_matte() {
    let src = vec![100u8, 0, 0, 128];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, Rgba8::WHITE).unwrap();
    assert_eq!(dst[3], 255);
    assert!((226..=228).contains(&dst[0]), "{dst:?}");
    assert!((126..=128).contains(&dst[1]), "{dst:?}");
}

#[test]
fn flatten_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 8];
    assert!(flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &[0u8; 4], Rgba8::BLACK).is_err());
}

#[test]
fn raw_capture_args_describe_the_frame_format() {
    let sink = FfmpegSink::new(FfmpegSinkOpts::new("/tmp/out.mp4"));
    let args = sink.raw_args(&SinkConfig {
        width: 64,
        height: 32,
        fps: Fps::new(30000, 1001).unwrap(),
    });
    let joined = args.join(" ");
    assert!(joined.starts_with("-y -loglevel error -f rawvideo -pix_fmt rgba -s 64x32"));
    assert!(joined.contains("-r 30000/1001 -i pipe:0"));
    assert!(joined.ends_with("-movflags +faststart"));
}

#[test]
fn odd_dimensions_are_rejected_before_spawning() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("/tmp/never.mp4"));
    let err = sink
        .begin(SinkConfig {
            width: 63,
            height: 32,
            fps: Fps::DEFAULT,
        })
        .unwrap_err();
    assert!(err.is_client_error());
}

#[test]
fn ensure_parent_dir_accepts_bare_file_names() {
    ensure_parent_dir(Path::new("out.mp4")).unwrap();
}

#[test]
fn frames_before_begin_are_rejected() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("/tmp/never.mp4"));
    let err = sink
        .push_frame(FrameIndex(0), &FrameRGBA::transparent(2, 2))
        .unwrap_err();
    assert!(matches!(err, StridashError::Encode(_)));
    sink.abort();
}

#[test]
fn missing_encoder_fails_to_begin() {
    let mut opts = FfmpegSinkOpts::new(std::env::temp_dir().join("stridash-missing-encoder.mp4"));
    opts.program = "/nonexistent/stridash-ffmpeg".to_owned();
    let mut sink = FfmpegSink::new(opts);
    let err = sink
        .begin(SinkConfig {
            width: 4,
            height: 4,
            fps: Fps::DEFAULT,
        })
        .unwrap_err();
    assert!(matches!(err, StridashError::Encode(ref m) if m.contains("failed to spawn")), "{err}");
}

#[cfg(unix)]
#[test]
fn wait_until_gives_up_on_a_stalled_process() {
    let mut child = Command::new("sleep").arg("30").spawn().unwrap();
    let started = Instant::now();
    let waited = wait_until(&mut child, Instant::now() + Duration::from_millis(100)).unwrap();
    assert!(waited.is_none());
    assert!(started.elapsed() < Duration::from_secs(10));
    child.kill().unwrap();
    child.wait().unwrap();
}

#[cfg(unix)]
#[test]
fn wait_until_returns_the_exit_status() {
    let mut child = Command::new("sh").args(["-c", "exit 3"]).spawn().unwrap();
    let status = wait_until(&mut child, Instant::now() + Duration::from_secs(30))
        .unwrap()
        .unwrap();
    assert_eq!(status.code(), Some(3));
}

#[test]
fn capture_timeout_defaults_to_the_encoder_bound() {
    let opts = FfmpegSinkOpts::new("/tmp/out.mp4");
    assert_eq!(opts.timeout, DEFAULT_ENCODER_TIMEOUT);
    let opts = opts.with_timeout(Duration::from_secs(5));
    assert_eq!(opts.timeout, Duration::from_secs(5));
}

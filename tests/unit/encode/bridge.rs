use super::*;
use crate::encode::png::PNG_SIGNATURE;

fn solid(idx: u64) -> StridashResult<(FrameIndex, FrameRGBA)> {
    let px = [idx as u8, 0, 0, 255];
    let data = px.repeat(4 * 4);
    Ok((FrameIndex(idx), FrameRGBA::from_premul(4, 4, data)?))
}

fn never() -> bool {
    false
}

struct FailingWriter(ErrorKind);

impl Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::from(self.0))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn drain_tail_keeps_the_last_bytes() {
    let input = b"0123456789".repeat(1000);
    let tail = drain_tail(&input[..], 16).unwrap();
    assert_eq!(tail, b"4567890123456789");
    assert_eq!(drain_tail(&b"short"[..], 16).unwrap(), b"short");
}

#[test]
fn stills_are_written_in_order_as_pngs() {
    let mut out = Vec::new();
    let stats = pump_stills((0..5).map(solid), &mut out, 2, &never).unwrap();
    assert_eq!(stats.frames_produced, 5);
    assert_eq!(stats.frames_written, 5);
    assert_eq!(stats.bytes_written, out.len() as u64);
    assert!(!stats.encoder_closed_early);
    assert!(stats.max_in_flight <= 2 + 2);

    let starts: Vec<usize> = out
        .windows(8)
        .enumerate()
        .filter(|(_, w)| *w == PNG_SIGNATURE)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(starts.len(), 5);
    for (n, &start) in starts.iter().enumerate() {
        let end = starts.get(n + 1).copied().unwrap_or(out.len());
        let img = image::load_from_memory(&out[start..end]).unwrap().to_rgba8();
        assert_eq!(img.get_pixel(0, 0).0, [n as u8, 0, 0, 255]);
    }
}

#[test]
fn stop_request_ends_the_stream_between_frames() {
    let produced = std::cell::Cell::new(0u32);
    let frames = (0..100).map(|i| {
        produced.set(produced.get() + 1);
        solid(i)
    });
    let stop = || produced.get() > 3;
    let stats = pump_stills(frames, Vec::new(), 4, &stop).unwrap();
    assert_eq!(stats.frames_produced, 3);
    assert_eq!(stats.frames_written, 3);
}

#[test]
fn broken_pipe_is_end_of_stream() {
    let stats =
        pump_stills((0..10).map(solid), FailingWriter(ErrorKind::BrokenPipe), 1, &never).unwrap();
    assert!(stats.encoder_closed_early);
    assert_eq!(stats.frames_written, 0);
    assert!(stats.frames_produced < 10);
}

#[test]
fn other_write_errors_are_fatal() {
    let err = pump_stills(
        (0..10).map(solid),
        FailingWriter(ErrorKind::PermissionDenied),
        1,
        &never,
    )
    .unwrap_err();
    assert!(matches!(err, StridashError::Encode(ref m) if m.contains("frame 0")), "{err}");
}

#[test]
fn producer_errors_stop_the_stream() {
    let frames = (0..10).map(|i| {
        if i == 2 {
            Err(StridashError::render("boom"))
        } else {
            solid(i)
        }
    });
    let mut out = Vec::new();
    let err = pump_stills(frames, &mut out, 4, &never).unwrap_err();
    assert!(matches!(err, StridashError::Render(_)));
}

#[cfg(unix)]
fn sh(script: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.args(["-c", script])
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::piped());
    cmd
}

#[cfg(unix)]
#[test]
fn run_encoder_consumes_everything_on_success() {
    let stats = run_encoder(
        sh("cat >/dev/null"),
        (0..8).map(solid),
        &BridgeOpts::default(),
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(stats.frames_written, 8);
}

#[cfg(unix)]
#[test]
fn run_encoder_reports_stderr_on_failure() {
    let err = run_encoder(
        sh("cat >/dev/null; echo 'bad codec' >&2; exit 3"),
        (0..2).map(solid),
        &BridgeOpts::default(),
        &CancelToken::new(),
    )
    .unwrap_err();
    let msg = err.to_string();
    assert!(matches!(err, StridashError::Encode(_)));
    assert!(msg.contains("bad codec"), "{msg}");
}

#[cfg(unix)]
#[test]
fn run_encoder_kills_a_stalled_encoder_on_timeout() {
    let opts = BridgeOpts {
        timeout: Duration::from_millis(200),
        ..BridgeOpts::default()
    };
    let started = Instant::now();
    let err = run_encoder(
        sh("exec sleep 30"),
        (0..1000).map(solid),
        &opts,
        &CancelToken::new(),
    )
    .unwrap_err();
    assert!(matches!(err, StridashError::Timeout(_)), "{err}");
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[cfg(unix)]
#[test]
fn deadline_hit_between_frames_is_a_timeout() {
    // The encoder exits cleanly on EOF, so only the deadline explains the short stream.
    let opts = BridgeOpts {
        timeout: Duration::ZERO,
        ..BridgeOpts::default()
    };
    let err = run_encoder(
        sh("cat >/dev/null"),
        (0..50).map(solid),
        &opts,
        &CancelToken::new(),
    )
    .unwrap_err();
    assert!(matches!(err, StridashError::Timeout(_)), "{err}");
}

#[cfg(unix)]
#[test]
fn run_encoder_honours_cancellation() {
    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    let frames = (0..1000).map(move |i| {
        if i == 5 {
            trigger.cancel();
        }
        solid(i)
    });
    let err = run_encoder(
        sh("cat >/dev/null"),
        frames,
        &BridgeOpts::default(),
        &cancel,
    )
    .unwrap_err();
    assert!(matches!(err, StridashError::Cancelled));
}

#[test]
fn spawn_failure_is_an_encode_error() {
    let err = run_encoder(
        Command::new("/nonexistent/stridash-encoder"),
        (0..1).map(solid),
        &BridgeOpts::default(),
        &CancelToken::new(),
    )
    .unwrap_err();
    assert!(matches!(err, StridashError::Encode(ref m) if m.contains("failed to spawn")));
}

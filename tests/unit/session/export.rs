use super::*;
use crate::activity::metric::MetricKey;
use crate::activity::sample::{Sample, Timeline};
use crate::activity::sync::SyncOffset;
use crate::encode::png::PNG_SIGNATURE;
use crate::foundation::core::{Canvas, Fps};
use crate::gauge::model::{GaugeSpec, NormPoint};
use crate::session::progress::{NoProgress, RenderPhase};
use std::path::PathBuf;

fn timeline() -> Timeline {
    Timeline::new(vec![
        Sample::at(0.0).with_heart_rate(120.0),
        Sample::at(30.0).with_heart_rate(160.0),
    ])
    .unwrap()
}

fn comp<'a>(tl: &'a Timeline, gauges: &'a [GaugeSpec], w: u32) -> Composition<'a> {
    Composition {
        timeline: tl,
        offset: SyncOffset::default(),
        gauges,
        canvas: Canvas::new(w, 64).unwrap(),
        fps: Fps::new(10, 1).unwrap(),
        duration_secs: 0.6,
    }
}

fn scratch(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("stridash-export-unit-{}", std::process::id()))
        .join(name)
}

#[cfg(unix)]
fn fake_encoder(script: &str) -> ExportOpts {
    // The output path is the last positional argument.
    let script = format!(r#"for a; do out="$a"; done; {script}"#);
    ExportOpts::default()
        .with_font(FontSource::Disabled)
        .with_encoder(
            EncoderOpts::default()
                .with_program("sh")
                .with_leading_args(["-c".to_owned(), script, "fake-ffmpeg".to_owned()]),
        )
}

#[cfg(unix)]
#[test]
fn stills_stream_into_the_encoder_with_progress() {
    let tl = timeline();
    let gauges = [GaugeSpec::for_metric("hr", MetricKey::HeartRate, NormPoint::default())];
    let out = scratch("ok.mp4");
    let mut phases = Vec::new();
    let mut observer = |p: RenderProgress| phases.push(p);

    let stats = export_overlay(
        comp(&tl, &gauges, 64),
        Path::new("/dev/null"),
        &out,
        &fake_encoder(r#"cat > "$out""#),
        &mut observer,
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(stats.frames, 6);

    let bytes = std::fs::read(&out).unwrap();
    let stills = bytes.windows(8).filter(|w| *w == PNG_SIGNATURE).count();
    assert_eq!(stills, 6);

    assert_eq!(phases.first(), Some(&RenderProgress::loading(6)));
    assert_eq!(
        phases.iter().filter(|p| p.phase == RenderPhase::Rendering).count(),
        6
    );
    assert_eq!(phases[phases.len() - 2], RenderProgress::encoding(6));
    assert_eq!(phases.last(), Some(&RenderProgress::done(6)));
    let _ = std::fs::remove_file(&out);
}

#[cfg(unix)]
#[test]
fn failed_encodes_leave_no_output() {
    let tl = timeline();
    let out = scratch("failed.mp4");
    let err = export_overlay(
        comp(&tl, &[], 64),
        Path::new("/dev/null"),
        &out,
        &fake_encoder(r#"cat > "$out"; echo 'muxer failed' >&2; exit 1"#),
        &mut NoProgress,
        &CancelToken::new(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("muxer failed"), "{err}");
    assert!(!out.exists());
}

#[test]
fn odd_canvas_is_rejected_before_spawning() {
    let tl = timeline();
    let opts = ExportOpts::default()
        .with_encoder(EncoderOpts::default().with_program("/nonexistent/stridash-ffmpeg"));
    let err = export_overlay(
        comp(&tl, &[], 63),
        Path::new("in.mp4"),
        &scratch("odd.mp4"),
        &opts,
        &mut NoProgress,
        &CancelToken::new(),
    )
    .unwrap_err();
    assert!(err.is_client_error(), "{err}");
}

#[test]
fn invalid_gauges_are_rejected_before_spawning() {
    let tl = timeline();
    let gauges = [
        GaugeSpec::for_metric("dup", MetricKey::HeartRate, NormPoint::default()),
        GaugeSpec::for_metric("dup", MetricKey::Power, NormPoint::default()),
    ];
    let opts = ExportOpts::default()
        .with_encoder(EncoderOpts::default().with_program("/nonexistent/stridash-ffmpeg"));
    let mut phases = Vec::new();
    let mut observer = |p: RenderProgress| phases.push(p);
    let err = export_overlay(
        comp(&tl, &gauges, 64),
        Path::new("in.mp4"),
        &scratch("dup.mp4"),
        &opts,
        &mut observer,
        &CancelToken::new(),
    )
    .unwrap_err();
    assert!(err.is_client_error(), "{err}");
    assert!(phases.is_empty());
}

#[cfg(unix)]
#[test]
fn video_start_offset_reaches_the_encoder() {
    let tl = timeline();
    let record_argv = r#"cat >/dev/null; printf '%s\n' "$@" > "$out""#;

    let mut argv = Vec::new();
    for (name, offset) in [("aligned.txt", 0.0), ("shifted.txt", 2.5)] {
        let out = scratch(name);
        let c = Composition {
            offset: SyncOffset::default().with_video_start_offset(offset),
            ..comp(&tl, &[], 64)
        };
        export_overlay(
            c,
            Path::new("in.mp4"),
            &out,
            &fake_encoder(record_argv),
            &mut NoProgress,
            &CancelToken::new(),
        )
        .unwrap();
        argv.push(std::fs::read_to_string(&out).unwrap());
        let _ = std::fs::remove_file(&out);
    }

    assert_ne!(argv[0], argv[1]);
    assert!(!argv[0].contains("tpad"));
    assert!(argv[1].contains("-itsoffset\n2.500000\n-i\nin.mp4"), "{}", argv[1]);
    assert!(argv[1].contains("tpad=start_duration=2.500000"), "{}", argv[1]);
}

use super::*;
use crate::activity::metric::MetricKey;
use crate::activity::sample::{Sample, Timeline};
use crate::activity::sync::SyncOffset;
use crate::encode::sink::InMemorySink;
use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::gauge::model::{GaugeSpec, NormPoint};
use crate::session::progress::{NoProgress, RenderPhase};

fn timeline() -> Timeline {
    Timeline::new(vec![
        Sample::at(0.0).with_cadence(170.0),
        Sample::at(60.0).with_cadence(180.0),
    ])
    .unwrap()
}

fn comp<'a>(tl: &'a Timeline, gauges: &'a [GaugeSpec], secs: f64) -> Composition<'a> {
    Composition {
        timeline: tl,
        offset: SyncOffset::default(),
        gauges,
        canvas: Canvas::new(96, 96).unwrap(),
        fps: Fps::new(10, 1).unwrap(),
        duration_secs: secs,
    }
}

fn unpaced() -> LiveOpts {
    LiveOpts::default()
        .with_pacing(Pacing::Unpaced)
        .with_font(FontSource::Disabled)
}

#[test]
fn frames_reach_the_sink_in_order_with_progress() {
    let tl = timeline();
    let gauges = [GaugeSpec::for_metric("c", MetricKey::Cadence, NormPoint::default())];
    let mut sink = InMemorySink::new();
    let mut seen = Vec::new();
    let mut observer = |p: RenderProgress| seen.push(p);

    let stats = render_live(
        comp(&tl, &gauges, 1.0),
        None,
        &mut sink,
        &unpaced(),
        &mut observer,
        &CancelToken::new(),
    )
    .unwrap();

    assert_eq!(stats.frames, 10);
    assert!(sink.is_finished());
    let cfg = sink.config().unwrap();
    assert_eq!((cfg.width, cfg.height, cfg.fps), (96, 96, Fps::new(10, 1).unwrap()));
    let idx: Vec<u64> = sink.frames().iter().map(|(i, _)| i.0).collect();
    assert_eq!(idx, (0..10).collect::<Vec<_>>());

    // No video: no loading phase.
    assert_eq!(seen.len(), 12);
    assert_eq!(seen[0], RenderProgress::rendered(FrameIndex(0), 10));
    assert_eq!(seen[9].current_frame, 9);
    assert_eq!(seen[10], RenderProgress::encoding(10));
    assert_eq!(seen[11], RenderProgress::done(10));
    assert!(seen.windows(2).all(|w| w[0].phase <= w[1].phase));
}

#[test]
fn cancellation_aborts_the_sink() {
    let tl = timeline();
    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    let mut observer = move |p: RenderProgress| {
        if p.phase == RenderPhase::Rendering && p.current_frame == 3 {
            trigger.cancel();
        }
    };
    let mut sink = InMemorySink::new();
    let err = render_live(
        comp(&tl, &[], 2.0),
        None,
        &mut sink,
        &unpaced(),
        &mut observer,
        &cancel,
    )
    .unwrap_err();
    assert!(matches!(err, StridashError::Cancelled));
    assert!(!sink.is_finished());
    assert!(sink.frames().is_empty());
}

#[test]
fn invalid_composition_fails_before_the_sink_starts() {
    let tl = timeline();
    let mut sink = InMemorySink::new();
    let err = render_live(
        comp(&tl, &[], -1.0),
        None,
        &mut sink,
        &unpaced(),
        &mut NoProgress,
        &CancelToken::new(),
    )
    .unwrap_err();
    assert!(err.is_client_error());
    assert!(sink.config().is_none());
}

#[test]
fn realtime_pacing_waits_for_presentation_time() {
    let tl = timeline();
    let mut sink = InMemorySink::new();
    let opts = LiveOpts::default().with_font(FontSource::Disabled);
    let stats = render_live(
        comp(&tl, &[], 0.3),
        None,
        &mut sink,
        &opts,
        &mut NoProgress,
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(stats.frames, 3);
    assert!(stats.elapsed >= Duration::from_millis(200), "{:?}", stats.elapsed);
}

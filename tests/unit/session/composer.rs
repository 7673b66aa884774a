use super::*;
use crate::activity::metric::MetricKey;
use crate::activity::sample::Sample;
use crate::gauge::model::{NormPoint, NormSize};

struct SolidVideo {
    rgba: [u8; 4],
    duration: f64,
    requested: Vec<f64>,
}

impl VideoSource for SolidVideo {
    fn duration_secs(&self) -> f64 {
        self.duration
    }

    fn frame_at(&mut self, t: f64, canvas: Canvas) -> StridashResult<Option<FrameRGBA>> {
        self.requested.push(t);
        let n = canvas.width as usize * canvas.height as usize;
        FrameRGBA::from_straight(canvas.width, canvas.height, self.rgba.repeat(n)).map(Some)
    }
}

fn timeline() -> Timeline {
    Timeline::new(vec![
        Sample::at(0.0).with_heart_rate(100.0).with_speed(0.0),
        Sample::at(10.0).with_heart_rate(200.0).with_speed(4.0),
    ])
    .unwrap()
}

fn hr_gauge(id: &str) -> GaugeSpec {
    GaugeSpec::for_metric(id, MetricKey::HeartRate, NormPoint { x: 0.1, y: 0.2 }).with_size(
        NormSize {
            width: 0.4,
            height: 0.22,
        },
    )
}

fn comp<'a>(tl: &'a Timeline, gauges: &'a [GaugeSpec], offset: SyncOffset) -> Composition<'a> {
    Composition {
        timeline: tl,
        offset,
        gauges,
        canvas: Canvas::new(200, 100).unwrap(),
        fps: Fps::DEFAULT,
        duration_secs: 5.0,
    }
}

#[test]
fn total_frames_rounds_duration_times_fps() {
    let tl = timeline();
    let c = Composition {
        duration_secs: 10.01,
        ..comp(&tl, &[], SyncOffset::default())
    };
    assert_eq!(c.total_frames(), 300);
    assert!(c.validate().is_ok());
    assert!(
        Composition {
            duration_secs: 0.0,
            ..c
        }
        .validate()
        .is_err()
    );
}

#[test]
fn gauges_are_drawn_at_their_pixel_rect() {
    let tl = timeline();
    let gauges = [hr_gauge("hr")];
    let mut composer = FrameComposer::new(comp(&tl, &gauges, SyncOffset::default()), None);
    let frame = composer.compose_frame(FrameIndex(15), None).unwrap();

    // Rect: x 20, y 20, 80 x 22.
    assert!(frame.pixel(60, 31).unwrap()[3] > 0);
    assert_eq!(frame.pixel(150, 80), Some([0, 0, 0, 0]));
    assert_eq!(frame.pixel(10, 10), Some([0, 0, 0, 0]));
    assert_eq!(composer.damping().current("hr"), Some(105.0));
}

#[test]
fn uncovered_frames_skip_every_gauge() {
    let tl = timeline();
    let gauges = [hr_gauge("hr")];
    let mut composer = FrameComposer::new(comp(&tl, &gauges, SyncOffset::new(20.0)), None);
    let frame = composer.compose_frame(FrameIndex(0), None).unwrap();
    assert!(frame.is_blank());
    assert!(composer.damping().is_empty());
}

#[test]
fn missing_metric_values_skip_only_that_gauge() {
    let tl = timeline();
    let gauges = [
        hr_gauge("hr"),
        GaugeSpec::for_metric("pace", MetricKey::Pace, NormPoint { x: 0.5, y: 0.6 }),
    ];
    let mut composer = FrameComposer::new(comp(&tl, &gauges, SyncOffset::default()), None);
    // Speed is 0 at t=0, so pace has no value.
    composer.compose_frame(FrameIndex(0), None).unwrap();
    assert_eq!(composer.damping().current("hr"), Some(100.0));
    assert_eq!(composer.damping().current("pace"), None);
}

#[test]
fn placeholders_draw_gauges_without_data() {
    let tl = timeline();
    let gauges = [hr_gauge("hr")];
    let mut composer = FrameComposer::new(comp(&tl, &gauges, SyncOffset::new(20.0)), None)
        .with_placeholders(true);
    let frame = composer.compose_frame(FrameIndex(0), None).unwrap();
    assert!(frame.pixel(60, 31).unwrap()[3] > 0);
    assert!(composer.damping().is_empty());
}

#[test]
fn hidden_gauges_are_not_drawn_or_damped() {
    let tl = timeline();
    let gauges = [hr_gauge("hr").with_visible(false)];
    let mut composer = FrameComposer::new(comp(&tl, &gauges, SyncOffset::default()), None);
    assert!(composer.compose_frame(FrameIndex(3), None).unwrap().is_blank());
    assert!(composer.damping().is_empty());
}

#[test]
fn damping_state_is_keyed_by_gauge_id() {
    let tl = timeline();
    let gauges = [hr_gauge("fast").with_damping(1.0), hr_gauge("slow").with_damping(0.1)];
    let mut composer = FrameComposer::new(comp(&tl, &gauges, SyncOffset::default()), None);
    composer.compose_frame(FrameIndex(0), None).unwrap();
    composer.compose_frame(FrameIndex(30), None).unwrap();
    assert_eq!(composer.damping().current("fast"), Some(110.0));
    let slow = composer.damping().current("slow").unwrap();
    assert!((slow - 101.0).abs() < 1e-9, "{slow}");
}

#[test]
fn video_background_honours_start_offset_and_duration() {
    let tl = timeline();
    let offset = SyncOffset::default().with_video_start_offset(1.0);
    let mut composer = FrameComposer::new(comp(&tl, &[], offset), None);
    let mut video = SolidVideo {
        rgba: [10, 20, 30, 255],
        duration: 2.0,
        requested: Vec::new(),
    };

    assert_eq!(composer.video_time(FrameIndex(0), 2.0), None);
    assert_eq!(composer.video_time(FrameIndex(30), 2.0), Some(0.0));
    assert_eq!(composer.video_time(FrameIndex(90), 2.0), Some(2.0));
    assert_eq!(composer.video_time(FrameIndex(91), 2.0), None);

    let before = composer.compose_frame(FrameIndex(0), Some(&mut video)).unwrap();
    assert!(before.is_blank());
    let during = composer.compose_frame(FrameIndex(45), Some(&mut video)).unwrap();
    assert_eq!(during.pixel(0, 0), Some([10, 20, 30, 255]));
    assert_eq!(during.pixel(199, 99), Some([10, 20, 30, 255]));
    assert_eq!(video.requested, [0.5]);
}

#[test]
fn gauges_composite_over_the_video() {
    let tl = timeline();
    let gauges = [hr_gauge("hr")];
    let mut composer = FrameComposer::new(comp(&tl, &gauges, SyncOffset::default()), None);
    let mut video = SolidVideo {
        rgba: [0, 0, 255, 255],
        duration: 10.0,
        requested: Vec::new(),
    };
    let frame = composer.compose_frame(FrameIndex(15), Some(&mut video)).unwrap();
    assert_eq!(frame.pixel(150, 80), Some([0, 0, 255, 255]));
    let inside = frame.pixel(60, 31).unwrap();
    assert_eq!(inside[3], 255);
    assert_ne!(inside, [0, 0, 255, 255]);
}

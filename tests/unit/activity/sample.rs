use super::*;

#[test]
fn start_and_end_follow_first_and_last_samples() {
    let t = Timeline::new(vec![
        Sample::at(1000.0).with_heart_rate(100.0),
        Sample::at(1000.0).with_heart_rate(110.0),
        Sample::at(1100.0).with_heart_rate(200.0),
    ])
    .unwrap();
    assert_eq!(t.start_time(), 1000.0);
    assert_eq!(t.end_time(), 1100.0);
    assert_eq!(t.duration_secs(), 100.0);
    assert_eq!(t.stats().avg_heart_rate, Some(410.0 / 3.0));
    assert_eq!(t.stats().avg_power, None);
}

#[test]
fn empty_and_unordered_timelines_are_rejected() {
    assert!(Timeline::new(vec![]).is_err());
    let err = Timeline::new(vec![Sample::at(10.0), Sample::at(5.0)]).unwrap_err();
    assert!(err.to_string().contains("out of order"));
}

#[test]
fn non_finite_values_are_rejected() {
    assert!(Timeline::new(vec![Sample::at(f64::NAN)]).is_err());
    assert!(Timeline::new(vec![Sample::at(1.0).with_power(f64::INFINITY)]).is_err());
}

#[test]
fn json_accepts_records_alias_and_checks_declared_bounds() {
    let t: Timeline = serde_json::from_str(
        r#"{"records":[{"timestamp":5,"heartRate":120},{"timestamp":7,"distance":12.5}],
            "startTime":5,"endTime":7}"#,
    )
    .unwrap();
    assert_eq!(t.samples().len(), 2);
    assert_eq!(t.samples()[0].heart_rate, Some(120.0));
    assert_eq!(t.stats().total_distance, 12.5);

    let bad = serde_json::from_str::<Timeline>(
        r#"{"samples":[{"timestamp":5}],"startTime":4,"endTime":5}"#,
    );
    assert!(bad.is_err());

    let missing = serde_json::from_str::<Timeline>(r#"{"samples":[{"heartRate":1}]}"#);
    assert!(missing.is_err());
}

#[test]
fn declared_aggregates_take_precedence() {
    let t: Timeline = serde_json::from_str(
        r#"{"samples":[{"timestamp":0,"heartRate":100}],"avgHeartRate":142,"totalDistance":5000}"#,
    )
    .unwrap();
    assert_eq!(t.stats().avg_heart_rate, Some(142.0));
    assert_eq!(t.stats().total_distance, 5000.0);

    let round_trip: Timeline = serde_json::from_str(&serde_json::to_string(&t).unwrap()).unwrap();
    assert_eq!(round_trip, t);
}

use super::*;

#[test]
fn first_value_seeds_state() {
    let mut d = DampingEngine::new();
    assert_eq!(d.smooth("g1", 120.0, Some(0.3)), 120.0);
    assert_eq!(d.current("g1"), Some(120.0));
}

#[test]
fn converges_monotonically_without_overshoot() {
    let mut d = DampingEngine::new();
    d.smooth("hr", 100.0, Some(0.3));
    let mut prev = 100.0;
    for _ in 0..200 {
        let v = d.smooth("hr", 200.0, Some(0.3));
        assert!(v >= prev, "{v} < {prev}");
        assert!(v <= 200.0, "{v} overshot");
        prev = v;
    }
    assert!((200.0 - prev).abs() < 1e-6);
}

#[test]
fn one_step_matches_formula() {
    let mut d = DampingEngine::new();
    d.smooth("k", 100.0, Some(0.3));
    assert!((d.smooth("k", 200.0, Some(0.3)) - 130.0).abs() < 1e-12);
    assert_eq!(d.smooth("k", 50.0, Some(1.0)), 50.0);
}

#[test]
fn keys_are_isolated() {
    let mut d = DampingEngine::new();
    d.smooth("a", 100.0, Some(0.5));
    d.smooth("b", 0.0, Some(0.5));
    for i in 0..10 {
        d.smooth("a", 200.0, Some(0.5));
        d.smooth("b", f64::from(i) * -10.0, Some(0.5));
    }
    let mut solo = DampingEngine::new();
    solo.smooth("a", 100.0, Some(0.5));
    for _ in 0..10 {
        solo.smooth("a", 200.0, Some(0.5));
    }
    assert_eq!(d.current("a"), solo.current("a"));
}

#[test]
fn missing_factor_uses_metric_default_then_fallback() {
    let mut d = DampingEngine::new();
    d.smooth("pace", 10.0, None);
    assert!((d.smooth("pace", 0.0, None) - 8.5).abs() < 1e-12);

    d.smooth("custom", 10.0, None);
    assert!((d.smooth("custom", 0.0, None) - 7.0).abs() < 1e-12);
}

#[test]
fn reset_clears_state() {
    let mut d = DampingEngine::new();
    d.smooth("a", 1.0, None);
    d.smooth("b", 2.0, None);
    d.reset_metric("a");
    assert_eq!(d.current("a"), None);
    assert_eq!(d.len(), 1);
    assert_eq!(d.smooth("a", 9.0, Some(0.1)), 9.0);
    d.reset();
    assert!(d.is_empty());
}

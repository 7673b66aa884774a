use super::*;

#[test]
fn ring_keeps_the_newest_points() {
    let mut h = SparklineHistory::new();
    for i in 0..55 {
        h.push("g", f64::from(i));
    }
    let s = h.series("g").unwrap();
    assert_eq!(s.len(), SPARKLINE_LENGTH);
    assert_eq!(s.front(), Some(&15.0));
    assert_eq!(s.back(), Some(&54.0));
}

#[test]
fn series_are_isolated_by_gauge_id() {
    let mut h = SparklineHistory::new();
    h.push("hr-left", 100.0);
    h.push("hr-right", 180.0);
    h.push("hr-right", 181.0);
    assert_eq!(h.series("hr-left").unwrap().len(), 1);
    assert_eq!(h.series("hr-right").unwrap().len(), 2);
    h.remove("hr-left");
    assert!(h.series("hr-left").is_none());
    h.clear();
    assert!(h.series("hr-right").is_none());
}

use super::*;

#[test]
fn mul_div255_rounds_to_nearest() {
    assert_eq!(mul_div255_u16(255, 255), 255);
    assert_eq!(mul_div255_u16(255, 128), 128);
    assert_eq!(mul_div255_u16(0, 200), 0);
    assert_eq!(mul_div255_u8(100, 128), 50);
}

#[test]
fn premul_over_endpoints() {
    let dst = [10, 20, 30, 255];
    assert_eq!(premul_over_px(dst, [0, 0, 0, 0]), dst);
    assert_eq!(premul_over_px(dst, [1, 2, 3, 255]), [1, 2, 3, 255]);
}

#[test]
fn premul_over_half_alpha_blends() {
    // Premultiplied white at 50% over opaque black.
    let out = premul_over_px([0, 0, 0, 255], [128, 128, 128, 128]);
    assert_eq!(out, [128, 128, 128, 255]);
}

#[test]
fn unit_ratio_clamps_and_handles_degenerate_ranges() {
    assert_eq!(unit_ratio(150.0, 100.0, 200.0), 0.5);
    assert_eq!(unit_ratio(50.0, 100.0, 200.0), 0.0);
    assert_eq!(unit_ratio(250.0, 100.0, 200.0), 1.0);
    assert_eq!(unit_ratio(5.0, 10.0, 10.0), 0.0);
    assert_eq!(unit_ratio(f64::NAN, 0.0, 1.0), 0.0);
}

#[test]
fn lerp_midpoint() {
    assert_eq!(lerp(100.0, 200.0, 0.5), 150.0);
}

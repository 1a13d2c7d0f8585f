use super::*;

#[test]
fn fmt_num_trims_trailing_zeros() {
    assert_eq!(fmt_num(5.0), "5");
    assert_eq!(fmt_num(0.6), "0.6");
    assert_eq!(fmt_num(2.5), "2.5");
    assert_eq!(fmt_num(-6.0), "-6");
    assert_eq!(fmt_num(0.12 * 5.0), "0.6");
    assert_eq!(fmt_num(std::f64::consts::PI / 5.0), "0.6283");
}

#[test]
fn fmt_num_handles_degenerate_values() {
    assert_eq!(fmt_num(-0.00001), "0");
    assert_eq!(fmt_num(f64::NAN), "0");
    assert_eq!(fmt_num(0.001), "0.001");
}

#[test]
fn canvas_requires_even_non_zero_sides() {
    assert!(Canvas::new(1080, 1920).is_ok());
    assert!(Canvas::new(0, 1920).is_err());
    assert!(Canvas::new(1081, 1920).is_err());
}

#[test]
fn low_res_uses_either_side() {
    assert!(Canvas::new(640, 1920).unwrap().is_low_res());
    assert!(Canvas::new(1920, 854).unwrap().is_low_res());
    assert!(!Canvas::new(1080, 1920).unwrap().is_low_res());
}

#[test]
fn time_window_formats_enable_option() {
    let w = TimeWindow::new(0.0, 5.0);
    assert_eq!(w.between_expr(), "between(t,0,5)");
    assert_eq!(w.enable_opt(), "enable='between(t,0,5)'");
    assert!((w.duration() - 5.0).abs() < 1e-12);
}

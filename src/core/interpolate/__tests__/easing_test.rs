use crate::core::interpolate::*;
use approx::assert_abs_diff_eq;

#[test]
fn 이징_경계값_테스트() {
    assert_abs_diff_eq!(easing_weight(0, 25), 0.0);
    assert_abs_diff_eq!(easing_weight(25, 25), 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(easing_weight(1, 2), 0.5, epsilon = 1e-6);
}

#[test]
fn 이징_단조성_테스트() {
    let n = 50;
    let weights: Vec<f32> = (0..=n).map(|t| easing_weight(t, n)).collect();
    for pair in weights.windows(2) {
        assert!(pair[1] >= pair[0], "{} -> {} 감소", pair[0], pair[1]);
    }
    assert!(weights.iter().all(|w| (0.0..=1.0).contains(w)));
}

#[test]
fn 구간_프레임수_테스트() {
    assert_eq!(segment_steps(1.0, INTERPOLATION_FPS), 25);
    assert_eq!(segment_steps(0.5, 25), 13, "반올림");
    assert_eq!(segment_steps(0.0, 25), 0);
    assert_eq!(segment_steps(2.0, 5), 10);
    assert_eq!(Interpolator::default().frame_count(&[1.0, 1.0]), 50);
}

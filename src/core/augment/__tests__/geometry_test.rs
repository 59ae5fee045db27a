use crate::core::augment::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn 크롭창_경계_테스트() {
    let mut rng = StdRng::seed_from_u64(77);
    let samplings = [
        CropSampling::Uniform { min: 0.2, max: 0.8 },
        CropSampling::Uniform { min: 1.0, max: 1.0 },
        CropSampling::ClippedNormal { mean: 0.6, std: 0.3, min: 0.1, max: 1.0 },
    ];
    for sampling in samplings {
        for (w, h) in [(64usize, 48usize), (7, 3), (1, 1)] {
            for _ in 0..200 {
                let window = CropWindow::sample(w, h, &sampling, &mut rng);
                assert!(window.fits(w, h), "{window:?} 가 {w}x{h} 밖으로 나감");
            }
        }
    }
}

#[test]
fn 크롭비율_범위_테스트() {
    let mut rng = StdRng::seed_from_u64(1);
    let sampling = CropSampling::ClippedNormal { mean: 0.5, std: 5.0, min: 0.3, max: 0.7 };
    for _ in 0..500 {
        let f = sampling.sample_fraction(&mut rng);
        assert!((0.3..=0.7).contains(&f), "clip 범위 밖 비율: {f}");
    }
    let fixed = CropSampling::Uniform { min: 0.4, max: 0.4 };
    assert_eq!(fixed.sample_fraction(&mut rng), 0.4);
}

#[test]
fn 패딩_포함_경계_테스트() {
    let mut rng = StdRng::seed_from_u64(5);
    let rich = RichAugment { pad: 4, ..RichAugment::default() };
    for _ in 0..200 {
        let view = ViewTransform::sample(16, 12, &CropSampling::default(), Some(&rich), &mut rng);
        assert!(view.window.fits(16 + 8, 12 + 8), "패딩된 원본 기준 경계 위반: {view:?}");
        assert_eq!(view.pad, 4);
        assert!(view.rotation.abs() <= 5f32.to_radians() + 1e-6);
        assert!(view.translate.0.abs() <= 0.05 * view.window.width as f32 + 1e-6);
    }
}

#[test]
fn 정렬모서리_좌표_테스트() {
    let view = ViewTransform::plain(CropWindow { x: 2, y: 3, width: 5, height: 9 });
    assert_eq!(view.source_point(0, 0, 5), (2.0, 3.0), "첫 픽셀은 크롭 모서리");
    assert_eq!(view.source_point(4, 4, 5), (6.0, 11.0), "마지막 픽셀은 반대 모서리");
    assert_eq!(view.source_point(2, 2, 5), (4.0, 7.0));

    let flipped = ViewTransform { flip: true, ..view };
    assert_eq!(flipped.source_point(0, 0, 5), (6.0, 3.0), "좌우 반전");

    let single = view.source_point(0, 0, 1);
    assert_eq!(single, (4.0, 7.0), "1픽셀 뷰는 크롭 중심");
}

#[test]
fn 회전_중심_고정_테스트() {
    let window = CropWindow { x: 0, y: 0, width: 5, height: 5 };
    let view = ViewTransform { rotation: std::f32::consts::FRAC_PI_2, ..ViewTransform::plain(window) };
    let (cx, cy) = view.source_point(2, 2, 5);
    assert!((cx - 2.0).abs() < 1e-5 && (cy - 2.0).abs() < 1e-5, "중심은 회전 불변");
    let (x, y) = view.source_point(2, 4, 5);
    assert!((x - 2.0).abs() < 1e-5 && (y - 4.0).abs() < 1e-5, "90도 회전: ({x}, {y})");
}

#[test]
fn 증강설정_검증_테스트() {
    assert!(AugmentConfig::default().validate().is_ok());
    let zero = AugmentConfig { num_views: 0, ..AugmentConfig::default() };
    assert!(zero.validate().is_err());
    let bad = AugmentConfig {
        sampling: CropSampling::Uniform { min: 0.9, max: 0.2 },
        ..AugmentConfig::default()
    };
    assert!(bad.validate().is_err());
}

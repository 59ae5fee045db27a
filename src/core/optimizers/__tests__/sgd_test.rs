use crate::core::optimizers::*;
use candle_core::{Device, Tensor};

fn 스칼라_텐서(v: f32) -> Tensor {
    Tensor::new(&[v], &Device::Cpu).unwrap()
}

fn 값(t: &Tensor) -> f32 {
    t.to_vec1::<f32>().unwrap()[0]
}

#[test]
fn 순수_SGD_테스트() {
    let mut sgd = Sgd::new(SgdConfig::default());
    let next = sgd.step(&스칼라_텐서(1.0), &스칼라_텐서(0.5), 0.2).unwrap();
    assert!((값(&next) - 0.9).abs() < 1e-6);
    assert!(sgd.velocity().is_none(), "모멘텀 0 이면 버퍼 없음");
}

#[test]
fn 모멘텀_누적_테스트() {
    let mut sgd = Sgd::new(SgdConfig { momentum: 0.9, ..SgdConfig::default() });
    let mut p = 스칼라_텐서(0.0);
    let g = 스칼라_텐서(1.0);

    // v1 = 1, v2 = 1.9, v3 = 2.71
    let mut expected = 0.0;
    for v in [1.0f32, 1.9, 2.71] {
        p = sgd.step(&p, &g, 0.1).unwrap();
        expected -= 0.1 * v;
        assert!((값(&p) - expected).abs() < 1e-5, "{} vs {expected}", 값(&p));
    }
    assert!((값(sgd.velocity().unwrap()) - 2.71).abs() < 1e-5);

    sgd.reset();
    assert!(sgd.velocity().is_none());
}

#[test]
fn 네스테로프_테스트() {
    let mut sgd = Sgd::new(SgdConfig { momentum: 0.5, nesterov: true, weight_decay: 0.0 });
    let g = 스칼라_텐서(1.0);
    // 첫 스텝: v = 1, 방향 = g + μ·v = 1.5
    let p = sgd.step(&스칼라_텐서(0.0), &g, 1.0).unwrap();
    assert!((값(&p) + 1.5).abs() < 1e-6);
}

#[test]
fn 가중치감소_테스트() {
    let mut sgd = Sgd::new(SgdConfig { weight_decay: 0.1, ..SgdConfig::default() });
    let p = sgd.step(&스칼라_텐서(2.0), &스칼라_텐서(0.0), 0.5).unwrap();
    assert!((값(&p) - 1.9).abs() < 1e-6, "p - lr·λ·p");
}

#[test]
fn 그래디언트_클리핑_테스트() {
    let grad = Tensor::new(&[3f32, 4.0], &Device::Cpu).unwrap();
    let clipped = clip_grad_norm(&grad, 1.0).unwrap().to_vec1::<f32>().unwrap();
    assert!((clipped[0] - 0.6).abs() < 1e-6 && (clipped[1] - 0.8).abs() < 1e-6);

    let untouched = clip_grad_norm(&grad, 10.0).unwrap().to_vec1::<f32>().unwrap();
    assert_eq!(untouched, vec![3.0, 4.0]);
}

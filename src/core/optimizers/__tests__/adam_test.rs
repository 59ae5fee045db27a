use crate::core::optimizers::*;
use candle_core::{Device, Tensor};

fn 스칼라_텐서(v: f32) -> Tensor {
    Tensor::new(&[v], &Device::Cpu).unwrap()
}

fn 값(t: &Tensor) -> f32 {
    t.to_vec1::<f32>().unwrap()[0]
}

#[test]
fn Adam업데이트_기본동작_테스트() {
    let mut adam = Adam::new(AdamConfig::default());
    let param = 스칼라_텐서(1.0);
    let next = adam.step(&param, &스칼라_텐서(0.1), 0.001).unwrap();

    // 첫 스텝은 편향 보정 후 lr 만큼 이동
    assert!((값(&next) - (1.0 - 0.001)).abs() < 1e-6, "첫 스텝 이동량은 lr: {}", 값(&next));
    assert_eq!(adam.steps(), 1, "시간 스텝이 증가해야 함");
    assert_eq!(값(&param), 1.0, "입력 파라미터는 변경되지 않음");
}

#[test]
fn Adam업데이트_스칼라공식_일치_테스트() {
    let config = AdamConfig::default();
    let mut adam = Adam::new(config);
    let mut tensor_param = 스칼라_텐서(0.5);

    // 스칼라 기준 구현
    let (mut m, mut v, mut p) = (0f32, 0f32, 0.5f32);
    let grads = [0.3f32, -0.2, 0.05, 0.4, -0.1];
    for (t, g) in grads.iter().enumerate() {
        let t = t as i32 + 1;
        m = config.beta1 * m + (1.0 - config.beta1) * g;
        v = config.beta2 * v + (1.0 - config.beta2) * g * g;
        let m_hat = m / (1.0 - config.beta1.powi(t));
        let v_hat = v / (1.0 - config.beta2.powi(t));
        p -= 0.01 * m_hat / (v_hat.sqrt() + config.epsilon);

        tensor_param = adam.step(&tensor_param, &스칼라_텐서(*g), 0.01).unwrap();
    }
    assert!((값(&tensor_param) - p).abs() < 1e-5, "텐서 {} vs 스칼라 {p}", 값(&tensor_param));
}

#[test]
fn AdamW_분리된_가중치감소_테스트() {
    let config = AdamConfig { weight_decay: 0.1, ..AdamConfig::default() };
    let mut coupled = Adam::new(config);
    let mut decoupled = Adam::adam_w(config);
    assert_eq!(coupled.name(), "adam");
    assert_eq!(decoupled.name(), "adamw");

    // 그래디언트 0 에서 AdamW 는 p·(1 - lr·λ) 로만 줄어든다
    let param = 스칼라_텐서(2.0);
    let zero = 스칼라_텐서(0.0);
    let next = decoupled.step(&param, &zero, 0.5).unwrap();
    assert!((값(&next) - 2.0 * (1.0 - 0.05)).abs() < 1e-6, "AdamW: {}", 값(&next));

    // 결합형 Adam 은 λ·p 를 그래디언트로 보고 정규화된 lr 만큼 이동
    let next = coupled.step(&param, &zero, 0.5).unwrap();
    assert!((값(&next) - 1.5).abs() < 1e-5, "Adam + L2: {}", 값(&next));
}

#[test]
fn Adam_초기화_테스트() {
    let mut adam = Adam::new(AdamConfig::default());
    let p = 스칼라_텐서(1.0);
    let _ = adam.step(&p, &스칼라_텐서(1.0), 0.1).unwrap();
    adam.reset();
    assert_eq!(adam.steps(), 0);
    let again = adam.step(&p, &스칼라_텐서(1.0), 0.1).unwrap();
    assert!((값(&again) - 0.9).abs() < 1e-6, "초기화 후 첫 스텝과 동일");
}

#[test]
fn 텐서형상_보존_테스트() {
    let device = Device::Cpu;
    let params = Tensor::zeros((2, 3, 4), candle_core::DType::F32, &device).unwrap();
    let grad = Tensor::ones((2, 3, 4), candle_core::DType::F32, &device).unwrap();
    let mut adam = Adam::adam_w(AdamConfig { weight_decay: 0.1, ..AdamConfig::default() });
    let next = adam.step(&params, &grad, 0.5).unwrap();
    assert_eq!(next.dims(), &[2, 3, 4]);
    let values = next.flatten_all().unwrap().to_vec1::<f32>().unwrap();
    assert!(values.iter().all(|v| (v + 0.5).abs() < 1e-5));
    println!("✅ Adam 텐서 형상 보존 테스트 통과");
}

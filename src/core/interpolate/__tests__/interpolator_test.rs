use crate::core::decoder::{DecodeMode, Decoder, SpectralConfig, SpectralDecoder};
use crate::core::error::GenError;
use crate::core::interpolate::*;
use crate::core::output::VecSink;
use crate::core::tensors::{tensor_to_frame, Checkpoint};
use candle_core::Device;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn 디코더() -> SpectralDecoder {
    let mut rng = StdRng::seed_from_u64(3);
    SpectralDecoder::new(1, 8, 8, &SpectralConfig::default(), &mut rng, &Device::Cpu).unwrap()
}

fn 체크포인트(decoder: &SpectralDecoder, seed: u64, step: usize) -> Checkpoint {
    let mut rng = StdRng::seed_from_u64(seed);
    let values = decoder.init_state(&mut rng, &Device::Cpu).unwrap();
    let values = values.affine(100.0, 0.0).unwrap();
    Checkpoint::from_tensor(step, decoder.layout().clone(), &values).unwrap()
}

#[test]
fn 두_체크포인트_25fps_테스트() {
    let decoder = 디코더();
    let checkpoints = vec![체크포인트(&decoder, 1, 0), 체크포인트(&decoder, 2, 10)];
    let interpolator = Interpolator::new(INTERPOLATION_FPS);

    let mut sink = VecSink::new(interpolator.fps());
    let emitted = interpolator.run(&checkpoints, &[1.0, 1.0], &decoder, &mut sink).unwrap();
    assert_eq!(emitted, 50, "구간마다 25 프레임, 순환 포함 2 구간");
    assert_eq!(sink.len(), 50);

    // 각 구간 첫 프레임은 출발 체크포인트 그대로
    let first = tensor_to_frame(&decoder.decode(checkpoints[0].values(), DecodeMode::Render).unwrap()).unwrap();
    let second = tensor_to_frame(&decoder.decode(checkpoints[1].values(), DecodeMode::Render).unwrap()).unwrap();
    assert_eq!(sink.frames()[0], first);
    assert_eq!(sink.frames()[25], second);
    println!("✅ 순환 보간 통과");
}

#[test]
fn 단일_체크포인트_정지영상_테스트() {
    let decoder = 디코더();
    let checkpoints = vec![체크포인트(&decoder, 5, 0)];
    let frames = Interpolator::new(25).collect(&checkpoints, &[0.4], &decoder).unwrap();
    assert_eq!(frames.len(), 10);
    assert!(frames.windows(2).all(|f| f[0] == f[1]), "자기 자신으로 보간");
}

#[test]
fn 길이_불일치_거부_테스트() {
    let decoder = 디코더();
    let checkpoints = vec![체크포인트(&decoder, 1, 0), 체크포인트(&decoder, 2, 1)];
    let err = Interpolator::default().collect(&checkpoints, &[1.0], &decoder).unwrap_err();
    assert!(matches!(err, GenError::InvalidConfig(_)));

    let err = Interpolator::default().collect(&[], &[], &decoder).unwrap_err();
    assert!(matches!(err, GenError::InvalidConfig(_)));
}

#[test]
fn 레이아웃_불일치_거부_테스트() {
    let decoder = 디코더();
    let mut rng = StdRng::seed_from_u64(9);
    let other = SpectralDecoder::new(1, 6, 6, &SpectralConfig::default(), &mut rng, &Device::Cpu).unwrap();
    let checkpoints = vec![체크포인트(&decoder, 1, 0), 체크포인트(&other, 2, 1)];
    let err = Interpolator::default().collect(&checkpoints, &[0.1, 0.1], &decoder).unwrap_err();
    assert!(matches!(err, GenError::ShapeMismatch { .. }));
}

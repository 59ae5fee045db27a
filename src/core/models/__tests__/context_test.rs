use crate::core::decoder::DecoderKind;
use crate::core::models::*;
use crate::core::testing::*;
use candle_core::Device;
use std::sync::Arc;

#[test]
fn 모듈_어댑터_테스트() {
    let device = Device::Cpu;
    let encoder = 소형_이미지인코더(1, &device);
    assert_eq!(encoder.input_size(), VIEW_SIZE);
    let batch = 무작위_텐서(2, &[5, 3, VIEW_SIZE, VIEW_SIZE], 1.0, &device);
    assert_eq!(encoder.encode(&batch).unwrap().dims(), &[5, EMBED_DIM]);

    let generator = ModuleGenerator::new(LatentProjector::new(4, 2, 3, 1, &device));
    let latent = 무작위_텐서(3, &[2, 4], 1.0, &device);
    assert_eq!(generator.generate(&latent).unwrap().dims(), &[2, 3, 2, 3]);
}

#[test]
fn 컨텍스트_지원_백엔드_테스트() {
    let device = Device::Cpu;
    let ctx = 소형_컨텍스트(&device);
    assert!(ctx.supports(DecoderKind::Spectral), "스펙트럼은 생성기가 필요 없음");
    assert!(!ctx.supports(DecoderKind::Codebook));
    assert!(ctx.generator(DecoderKind::Codebook).is_none());

    let ctx = 코드북_컨텍스트(4, &device);
    assert!(ctx.supports(DecoderKind::Codebook));
    assert!(!ctx.supports(DecoderKind::StyleLatent));
    assert!(ctx.code_encoder(DecoderKind::Codebook).is_none());
}

#[test]
fn 컨텍스트_공유_테스트() {
    let device = Device::Cpu;
    let ctx = 코드북_컨텍스트(4, &device);
    let cloned = ctx.clone();
    let a = ctx.generator(DecoderKind::Codebook).unwrap();
    let b = cloned.generator(DecoderKind::Codebook).unwrap();
    assert!(Arc::ptr_eq(&a, &b), "복제된 컨텍스트는 같은 모델을 공유");

    let debug = format!("{ctx:?}");
    assert!(debug.contains("image_input_size"), "Debug 출력: {debug}");
}

#[test]
fn 텍스트_해시_결정성_테스트() {
    let device = Device::Cpu;
    let ctx = 소형_컨텍스트(&device);
    let a = ctx.text_encoder().encode("a red fox").unwrap().flatten_all().unwrap().to_vec1::<f32>().unwrap();
    let b = ctx.text_encoder().encode("a red fox").unwrap().flatten_all().unwrap().to_vec1::<f32>().unwrap();
    let c = ctx.text_encoder().encode("a blue fox").unwrap().flatten_all().unwrap().to_vec1::<f32>().unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.len(), EMBED_DIM);
}

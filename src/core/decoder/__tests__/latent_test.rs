use crate::core::decoder::*;
use crate::core::error::GenError;
use crate::core::models::{CodeEncoder, ModuleGenerator};
use crate::core::testing::{무작위_텐서, LatentProjector};
use candle_core::{Device, Tensor};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

fn 스타일_설정() -> LatentConfig {
    LatentConfig {
        dims: vec![1, 4],
        init: LatentInit::Gaussian { std: 1.0, sharpen: None },
        repeat: Some(LatentRepeat { axis: 1, count: 3 }),
        output_range: OutputRange::Symmetric,
    }
}

fn 스타일_디코더(config: &LatentConfig) -> LatentDecoder {
    let generator = Arc::new(ModuleGenerator::new(LatentProjector::new(12, 4, 4, 21, &Device::Cpu)));
    LatentDecoder::new(DecoderKind::StyleLatent, config, generator, None).unwrap()
}

struct 고정잠재(Tensor);

impl CodeEncoder for 고정잠재 {
    fn encode(&self, _image: &Tensor) -> anyhow::Result<Tensor> {
        Ok(self.0.clone())
    }
}

#[test]
fn 잠재_복제축_테스트() {
    let decoder = 스타일_디코더(&스타일_설정());
    let latent = Tensor::new(&[[1f32, 2., 3., 4.]], &Device::Cpu).unwrap();
    let expanded = decoder.expand(&latent).unwrap();
    assert_eq!(expanded.dims(), &[1, 3, 4]);
    let rows = expanded.squeeze(0).unwrap().to_vec2::<f32>().unwrap();
    assert!(rows.iter().all(|r| r == &vec![1., 2., 3., 4.]), "모든 레이어가 같은 잠재");
}

#[test]
fn 잠재_디코드_범위_테스트() {
    let decoder = 스타일_디코더(&스타일_설정());
    let mut rng = StdRng::seed_from_u64(4);
    let latent = decoder.init_state(&mut rng, &Device::Cpu).unwrap();
    let image = decoder.decode(&latent, DecodeMode::Render).unwrap();
    assert_eq!(image.dims(), &[1, 3, 4, 4]);
    let min = image.min_all().unwrap().to_scalar::<f32>().unwrap();
    let max = image.max_all().unwrap().to_scalar::<f32>().unwrap();
    assert!(min >= 0.0 && max <= 1.0);
}

#[test]
fn 첨예화_초기화_테스트() {
    let device = Device::Cpu;
    let plain = 스타일_디코더(&스타일_설정());
    let sharp = 스타일_디코더(&LatentConfig {
        init: LatentInit::Gaussian { std: 1.0, sharpen: Some(2.0) },
        ..스타일_설정()
    });
    let a = plain.init_state(&mut StdRng::seed_from_u64(8), &device).unwrap();
    let b = sharp.init_state(&mut StdRng::seed_from_u64(8), &device).unwrap();

    let a = a.flatten_all().unwrap().to_vec1::<f32>().unwrap();
    let b = b.flatten_all().unwrap().to_vec1::<f32>().unwrap();
    for (x, y) in a.iter().zip(b.iter()) {
        let expected = (2.0 * x.asinh()).sinh();
        assert!((y - expected).abs() < 1e-4, "sinh(k·asinh(x)) 불일치");
        assert!(y.abs() >= x.abs() - 1e-6, "첨예화는 크기를 줄이지 않음");
    }

    let zeros = 스타일_디코더(&LatentConfig { init: LatentInit::Zeros, ..스타일_설정() });
    let z = zeros.init_state(&mut StdRng::seed_from_u64(0), &device).unwrap();
    assert_eq!(z.abs().unwrap().sum_all().unwrap().to_scalar::<f32>().unwrap(), 0.0);
}

#[test]
fn 참조_잠재_인코딩_테스트() {
    let device = Device::Cpu;
    let generator = Arc::new(ModuleGenerator::new(LatentProjector::new(12, 4, 4, 21, &device)));
    let image = Tensor::zeros((1, 3, 4, 4), candle_core::DType::F32, &device).unwrap();

    let without = 스타일_디코더(&스타일_설정());
    assert!(without.encode_reference(&image).unwrap().is_none(), "코드 인코더 없으면 None");

    let good = LatentDecoder::new(
        DecoderKind::StyleLatent,
        &스타일_설정(),
        generator.clone(),
        Some(Arc::new(고정잠재(무작위_텐서(1, &[1, 4], 1.0, &device)))),
    )
    .unwrap();
    assert_eq!(good.encode_reference(&image).unwrap().unwrap().dims(), &[1, 4]);

    let bad = LatentDecoder::new(
        DecoderKind::StyleLatent,
        &스타일_설정(),
        generator,
        Some(Arc::new(고정잠재(무작위_텐서(1, &[1, 5], 1.0, &device)))),
    )
    .unwrap();
    assert!(matches!(bad.encode_reference(&image), Err(GenError::ShapeMismatch { .. })));
}

#[test]
fn 잘못된_잠재설정_거부_테스트() {
    let generator = Arc::new(ModuleGenerator::new(LatentProjector::new(4, 2, 2, 1, &Device::Cpu)));
    let bad_repeat = LatentConfig { repeat: Some(LatentRepeat { axis: 5, count: 2 }), ..스타일_설정() };
    assert!(matches!(
        LatentDecoder::new(DecoderKind::StyleLatent, &bad_repeat, generator.clone(), None),
        Err(GenError::InvalidConfig(_))
    ));
    assert!(matches!(
        LatentDecoder::new(DecoderKind::Spectral, &스타일_설정(), generator, None),
        Err(GenError::UnsupportedBackend(_))
    ));
}

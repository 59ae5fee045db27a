//! 통합 테스트용 소형 결정적 모델

#![allow(dead_code)]

use candle_core::{Device, Module, Tensor};
use candle_nn::Linear;
use dream_canvas::core::models::{Generator, ModuleGenerator, ModuleImageEncoder, TextEncoder};
use dream_canvas::{DecoderKind, ModelContext};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

pub const EMBED_DIM: usize = 12;
pub const VIEW_SIZE: usize = 8;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn random_tensor(seed: u64, shape: &[usize], scale: f32) -> Tensor {
    let mut rng = StdRng::seed_from_u64(seed);
    let count: usize = shape.iter().product();
    let data: Vec<f32> = (0..count).map(|_| rng.gen_range(-scale..scale)).collect();
    Tensor::from_vec(data, shape, &Device::Cpu).unwrap()
}

pub struct WordHashEncoder;

impl TextEncoder for WordHashEncoder {
    fn encode(&self, text: &str) -> anyhow::Result<Tensor> {
        let seed = text.bytes().fold(7u64, |h, b| h.wrapping_mul(31).wrapping_add(b as u64));
        Ok(random_tensor(seed, &[1, EMBED_DIM], 1.0))
    }
}

pub struct Flatten(pub Linear);

impl Module for Flatten {
    fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        self.0.forward(&xs.flatten_from(1)?)
    }
}

/// `(B, D)` 잠재 → `(B, 3, S, S)`
pub struct Unflatten {
    pub linear: Linear,
    pub size: usize,
}

impl Module for Unflatten {
    fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        let batch = xs.dim(0)?;
        self.linear
            .forward(&xs.flatten_from(1)?)?
            .reshape((batch, 3, self.size, self.size))
    }
}

pub fn tiny_context() -> ModelContext {
    let inputs = 3 * VIEW_SIZE * VIEW_SIZE;
    let image_encoder = ModuleImageEncoder::new(
        Flatten(Linear::new(random_tensor(2, &[EMBED_DIM, inputs], 0.2), None)),
        VIEW_SIZE,
    );
    ModelContext::new(Device::Cpu, Arc::new(WordHashEncoder), Arc::new(image_encoder))
}

/// 스타일 잠재 `(B, layers, dim)` 를 받는 소형 생성기 포함 컨텍스트
pub fn style_context(layers: usize, dim: usize, size: usize) -> ModelContext {
    let generator: Arc<dyn Generator> = Arc::new(ModuleGenerator::new(Unflatten {
        linear: Linear::new(random_tensor(4, &[3 * size * size, layers * dim], 0.3), None),
        size,
    }));
    tiny_context().with_generator(DecoderKind::StyleLatent, generator)
}

//! 단위 테스트용 소형 결정적 모델들

use crate::core::decoder::DecoderKind;
use crate::core::models::*;
use candle_core::{DType, Device, Module, Tensor};
use candle_nn::Linear;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const EMBED_DIM: usize = 16;
pub const VIEW_SIZE: usize = 8;

pub fn 무작위_텐서(seed: u64, shape: &[usize], scale: f32, device: &Device) -> Tensor {
    let mut rng = StdRng::seed_from_u64(seed);
    let count: usize = shape.iter().product();
    let data: Vec<f32> = (0..count).map(|_| rng.gen_range(-scale..scale)).collect();
    Tensor::from_vec(data, shape, device).unwrap()
}

/// 텍스트 바이트 해시로 결정되는 임베딩
pub struct HashTextEncoder {
    pub dim: usize,
    pub device: Device,
}

impl TextEncoder for HashTextEncoder {
    fn encode(&self, text: &str) -> anyhow::Result<Tensor> {
        let seed = text
            .bytes()
            .fold(1469598103934665603u64, |h, b| (h ^ b as u64).wrapping_mul(1099511628211));
        Ok(무작위_텐서(seed, &[1, self.dim], 1.0, &self.device))
    }
}

/// `(N, C, S, S)` → flatten → linear
pub struct FlattenLinear {
    pub linear: Linear,
}

impl Module for FlattenLinear {
    fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        self.linear.forward(&xs.flatten_from(1)?)
    }
}

pub fn 소형_이미지인코더(seed: u64, device: &Device) -> ModuleImageEncoder<FlattenLinear> {
    let inputs = 3 * VIEW_SIZE * VIEW_SIZE;
    let weight = 무작위_텐서(seed, &[EMBED_DIM, inputs], 0.2, device);
    let bias = 무작위_텐서(seed + 1, &[EMBED_DIM], 0.1, device);
    ModuleImageEncoder::new(FlattenLinear { linear: Linear::new(weight, Some(bias)) }, VIEW_SIZE)
}

/// 코드 `(B, V, gh, gw)` 를 팔레트 `(V, 3)` 로 사영
pub struct PaletteGenerator {
    pub palette: Tensor,
}

impl PaletteGenerator {
    pub fn new(vocab: usize, seed: u64, device: &Device) -> Self {
        Self { palette: 무작위_텐서(seed, &[vocab, 3], 1.0, device) }
    }
}

impl Generator for PaletteGenerator {
    fn generate(&self, code: &Tensor) -> anyhow::Result<Tensor> {
        let (b, v, h, w) = code.dims4()?;
        let flat = code.permute((0, 2, 3, 1))?.contiguous()?.reshape((b * h * w, v))?;
        let rgb = flat.matmul(&self.palette)?;
        Ok(rgb.reshape((b, h, w, 3))?.permute((0, 3, 1, 2))?.contiguous()?)
    }
}

/// 잠재 벡터 → flatten → linear → `(B, 3, H, W)`
pub struct LatentProjector {
    pub linear: Linear,
    pub height: usize,
    pub width: usize,
}

impl LatentProjector {
    pub fn new(inputs: usize, height: usize, width: usize, seed: u64, device: &Device) -> Self {
        let weight = 무작위_텐서(seed, &[3 * height * width, inputs], 0.3, device);
        Self { linear: Linear::new(weight, None), height, width }
    }
}

impl Module for LatentProjector {
    fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        let batch = xs.dim(0)?;
        self.linear
            .forward(&xs.flatten_from(1)?)?
            .reshape((batch, 3, self.height, self.width))
    }
}

/// 지정된 호출에서 NaN 임베딩을 돌려주는 인코더
pub struct NanInjectingEncoder {
    pub inner: ModuleImageEncoder<FlattenLinear>,
    pub nan_at_call: usize,
    pub calls: AtomicUsize,
}

impl NanInjectingEncoder {
    pub fn new(nan_at_call: usize, device: &Device) -> Self {
        Self { inner: 소형_이미지인코더(11, device), nan_at_call, calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageEncoder for NanInjectingEncoder {
    fn input_size(&self) -> usize {
        self.inner.input_size()
    }

    fn encode(&self, batch: &Tensor) -> anyhow::Result<Tensor> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let out = self.inner.encode(batch)?;
        if call == self.nan_at_call {
            let nan = Tensor::full(f32::NAN, out.dims(), out.device())?;
            // 그래프 연결을 유지한 채 NaN 주입
            return Ok(out.broadcast_add(&nan)?);
        }
        Ok(out)
    }
}

/// 항상 실패하는 인코더
pub struct FailingImageEncoder;

impl ImageEncoder for FailingImageEncoder {
    fn input_size(&self) -> usize {
        VIEW_SIZE
    }

    fn encode(&self, _batch: &Tensor) -> anyhow::Result<Tensor> {
        anyhow::bail!("encoder offline")
    }
}

pub fn 소형_컨텍스트(device: &Device) -> ModelContext {
    ModelContext::new(
        device.clone(),
        Arc::new(HashTextEncoder { dim: EMBED_DIM, device: device.clone() }),
        Arc::new(소형_이미지인코더(3, device)),
    )
}

pub fn 코드북_컨텍스트(vocab: usize, device: &Device) -> ModelContext {
    소형_컨텍스트(device).with_generator(
        DecoderKind::Codebook,
        Arc::new(PaletteGenerator::new(vocab, 5, device)),
    )
}

pub fn 영_텐서(shape: &[usize], device: &Device) -> Tensor {
    Tensor::zeros(shape, DType::F32, device).unwrap()
}

//! # 외부 사전학습 네트워크 계약
//!
//! 인코더/생성기 내부는 구현하지 않고 입출력 계약만 정의한다.
//! `ModelContext` 는 워커 시작 시 한 번 만들어져 작업 간에 재사용된다.

use crate::core::decoder::DecoderKind;
use candle_core::{Device, Tensor};
use candle_nn::Module;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[cfg(test)]
mod __tests__;

/// 텍스트 → 임베딩 `(1, D)` 또는 `(D)`
pub trait TextEncoder: Send + Sync {
    fn encode(&self, text: &str) -> anyhow::Result<Tensor>;
}

/// 이미지 배치 `(N, 3, S, S)` → 임베딩 `(N, D)`
pub trait ImageEncoder: Send + Sync {
    /// 고정 입력 해상도 S (ViT-B/32 는 224, RN50x4 는 288)
    fn input_size(&self) -> usize;
    fn encode(&self, batch: &Tensor) -> anyhow::Result<Tensor>;
}

/// 코드(또는 잠재 벡터) → RGB 이미지 배치
pub trait Generator: Send + Sync {
    fn generate(&self, code: &Tensor) -> anyhow::Result<Tensor>;
}

/// 이미지 → 코드 로짓 / 잠재 벡터 (참조 이미지 시딩용, 선택)
pub trait CodeEncoder: Send + Sync {
    fn encode(&self, image: &Tensor) -> anyhow::Result<Tensor>;
}

/// 임의의 candle 모듈을 이미지 인코더로 감싸는 어댑터
pub struct ModuleImageEncoder<M> {
    module: M,
    input_size: usize,
}

impl<M: Module> ModuleImageEncoder<M> {
    pub fn new(module: M, input_size: usize) -> Self {
        Self { module, input_size }
    }
}

impl<M: Module + Send + Sync> ImageEncoder for ModuleImageEncoder<M> {
    fn input_size(&self) -> usize {
        self.input_size
    }

    fn encode(&self, batch: &Tensor) -> anyhow::Result<Tensor> {
        Ok(self.module.forward(batch)?)
    }
}

/// 임의의 candle 모듈을 생성기로 감싸는 어댑터
pub struct ModuleGenerator<M> {
    module: M,
}

impl<M: Module> ModuleGenerator<M> {
    pub fn new(module: M) -> Self {
        Self { module }
    }
}

impl<M: Module + Send + Sync> Generator for ModuleGenerator<M> {
    fn generate(&self, code: &Tensor) -> anyhow::Result<Tensor> {
        Ok(self.module.forward(code)?)
    }
}

/// 프로세스 단위 모델 컨텍스트
///
/// 로드는 워커 시작 시 한 번, 작업마다 재로딩하지 않는다.
#[derive(Clone)]
pub struct ModelContext {
    device: Device,
    text_encoder: Arc<dyn TextEncoder>,
    image_encoder: Arc<dyn ImageEncoder>,
    generators: HashMap<DecoderKind, Arc<dyn Generator>>,
    code_encoders: HashMap<DecoderKind, Arc<dyn CodeEncoder>>,
}

impl fmt::Debug for ModelContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelContext")
            .field("device", &self.device)
            .field("image_input_size", &self.image_encoder.input_size())
            .field("generators", &self.generators.keys().collect::<Vec<_>>())
            .field("code_encoders", &self.code_encoders.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ModelContext {
    pub fn new(
        device: Device,
        text_encoder: Arc<dyn TextEncoder>,
        image_encoder: Arc<dyn ImageEncoder>,
    ) -> Self {
        Self {
            device,
            text_encoder,
            image_encoder,
            generators: HashMap::new(),
            code_encoders: HashMap::new(),
        }
    }

    pub fn with_generator(mut self, kind: DecoderKind, generator: Arc<dyn Generator>) -> Self {
        self.generators.insert(kind, generator);
        self
    }

    pub fn with_code_encoder(mut self, kind: DecoderKind, encoder: Arc<dyn CodeEncoder>) -> Self {
        self.code_encoders.insert(kind, encoder);
        self
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn text_encoder(&self) -> &Arc<dyn TextEncoder> {
        &self.text_encoder
    }

    pub fn image_encoder(&self) -> &Arc<dyn ImageEncoder> {
        &self.image_encoder
    }

    pub fn generator(&self, kind: DecoderKind) -> Option<Arc<dyn Generator>> {
        self.generators.get(&kind).cloned()
    }

    pub fn code_encoder(&self, kind: DecoderKind) -> Option<Arc<dyn CodeEncoder>> {
        self.code_encoders.get(&kind).cloned()
    }

    /// 해당 백엔드를 실행할 수 있는지
    pub fn supports(&self, kind: DecoderKind) -> bool {
        !kind.requires_generator() || self.generators.contains_key(&kind)
    }
}

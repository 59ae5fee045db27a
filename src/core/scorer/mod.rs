//! # 프롬프트 유사도 점수
//!
//! 뷰 임베딩과 텍스트 임베딩의 코사인 유사도로 스칼라 손실을 만든다.
//! 손실 항의 가중치는 모두 `ScoreConfig` 의 명명된 필드다.

pub mod target;


pub use target::PromptTarget;

use crate::core::augment::{CropWindow, SamplingGrid, ViewTransform};
use crate::core::error::{Collaborator, CollaboratorContext, GenError, GenResult};
use crate::core::models::{ImageEncoder, ModelContext};
use candle_core::{DType, Tensor};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// CLIP 입력 정규화 상수
pub const CLIP_MEAN: [f32; 3] = [0.48145466, 0.4578275, 0.40821073];
pub const CLIP_STD: [f32; 3] = [0.26862954, 0.26130258, 0.27577711];

const NORM_EPS: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    pub similarity_weight: f32,
    pub subtract_weight: f32,
    /// 참조 이미지 임베딩 유사도 가중치
    pub image_weight: f32,
    /// 텍스트 항 부호 반전
    pub invert: bool,
    /// 인코더 입력에 CLIP 평균/표준편차 정규화 적용
    pub normalize_input: bool,
    pub anchor_enabled: bool,
    pub anchor_weight: f32,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            similarity_weight: 1.0,
            subtract_weight: 1.0,
            image_weight: 0.0,
            invert: false,
            normalize_input: true,
            anchor_enabled: false,
            anchor_weight: 1e-3,
        }
    }
}

/// 손실 구성 요소 (로그/진행 표시용)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScoreBreakdown {
    pub total: f32,
    /// 뷰-텍스트 평균 코사인 유사도
    pub text_similarity: f32,
    pub subtract_similarity: Option<f32>,
    pub reference_similarity: Option<f32>,
    pub anchor: Option<f32>,
}

/// L2 정규화 (마지막 축)
pub fn l2_normalize(embeddings: &Tensor) -> GenResult<Tensor> {
    let norm = embeddings
        .sqr()?
        .sum_keepdim(candle_core::D::Minus1)?
        .affine(1.0, NORM_EPS)?
        .sqrt()?;
    Ok(embeddings.broadcast_div(&norm)?)
}

/// `(B, 3, H, W)` 에 CLIP 평균/표준편차 적용
pub fn clip_normalize(images: &Tensor) -> GenResult<Tensor> {
    let device = images.device();
    let mean = Tensor::from_slice(&CLIP_MEAN, (1, 3, 1, 1), device)?;
    let std = Tensor::from_slice(&CLIP_STD, (1, 3, 1, 1), device)?;
    Ok(images.broadcast_sub(&mean)?.broadcast_div(&std)?)
}

fn as_row(embedding: Tensor) -> GenResult<Tensor> {
    let embedding = embedding.to_dtype(DType::F32)?;
    match embedding.rank() {
        1 => Ok(embedding.unsqueeze(0)?),
        2 if embedding.dim(0)? == 1 => Ok(embedding),
        _ => Err(GenError::ShapeMismatch {
            context: "prompt embedding",
            expected: vec![1, embedding.dim(candle_core::D::Minus1)?],
            actual: embedding.dims().to_vec(),
        }),
    }
}

/// 이미지 인코더 기준 임베딩 (인코더 입력 해상도로 전체 리샘플)
pub fn embed_image(
    encoder: &Arc<dyn ImageEncoder>,
    image: &Tensor,
    normalize_input: bool,
) -> GenResult<Tensor> {
    let (_, _, height, width) = image.dims4()?;
    let size = encoder.input_size();
    let window = CropWindow { x: 0, y: 0, width, height };
    let resized = SamplingGrid::build(&[ViewTransform::plain(window)], width, height, size)
        .resample(image, image.device())?;
    let input = if normalize_input { clip_normalize(&resized)? } else { resized };
    let embedding = encoder.encode(&input).collaborator(Collaborator::ImageEncoder)?;
    l2_normalize(&embedding.to_dtype(DType::F32)?)
}

/// 정규화된 대상 임베딩을 보관하는 점수기
pub struct Scorer {
    config: ScoreConfig,
    encoder: Arc<dyn ImageEncoder>,
    text: Tensor,
    subtract: Option<Tensor>,
    reference: Option<Tensor>,
    anchor: Option<Tensor>,
}

impl Scorer {
    /// 대상 임베딩을 한 번만 계산
    pub fn new(ctx: &ModelContext, target: &PromptTarget, config: &ScoreConfig) -> GenResult<Self> {
        let text_encoder = ctx.text_encoder();
        let text = text_encoder.encode(target.text()).collaborator(Collaborator::TextEncoder)?;
        let text = l2_normalize(&as_row(text)?)?;
        let dim = text.dim(1)?;

        let subtract = match target.subtract_text() {
            Some(sub) if config.subtract_weight != 0.0 => {
                let emb = text_encoder.encode(sub).collaborator(Collaborator::TextEncoder)?;
                Some(l2_normalize(&as_row(emb)?)?)
            }
            _ => None,
        };
        let reference = match target.reference_embedding() {
            Some(emb) if config.image_weight != 0.0 => Some(l2_normalize(&as_row(emb.clone())?)?),
            _ => None,
        };
        for emb in subtract.iter().chain(reference.iter()) {
            if emb.dim(1)? != dim {
                return Err(GenError::ShapeMismatch {
                    context: "prompt embedding",
                    expected: vec![1, dim],
                    actual: emb.dims().to_vec(),
                });
            }
        }
        let anchor = if config.anchor_enabled {
            target.reference_state().map(|s| s.detach())
        } else {
            None
        };

        Ok(Self {
            config: config.clone(),
            encoder: ctx.image_encoder().clone(),
            text,
            subtract,
            reference,
            anchor,
        })
    }

    pub fn config(&self) -> &ScoreConfig {
        &self.config
    }

    pub fn anchoring(&self) -> bool {
        self.anchor.is_some()
    }

    /// 뷰 `(N, 3, S, S)` 와 현재 상태로 스칼라 손실 계산
    pub fn score(&self, views: &Tensor, state: &Tensor) -> GenResult<(Tensor, ScoreBreakdown)> {
        let input = if self.config.normalize_input { clip_normalize(views)? } else { views.clone() };
        let raw = self.encoder.encode(&input).collaborator(Collaborator::ImageEncoder)?;
        let embeddings = l2_normalize(&raw.to_dtype(DType::F32)?)?;
        if embeddings.rank() != 2
            || embeddings.dim(0)? != views.dim(0)?
            || embeddings.dim(1)? != self.text.dim(1)?
        {
            return Err(GenError::ShapeMismatch {
                context: "view embeddings",
                expected: vec![views.dim(0)?, self.text.dim(1)?],
                actual: embeddings.dims().to_vec(),
            });
        }

        let mean_cos = |target: &Tensor| -> GenResult<Tensor> {
            Ok(embeddings.matmul(&target.t()?)?.mean_all()?)
        };

        let text_cos = mean_cos(&self.text)?;
        let sign = if self.config.invert { -1.0 } else { 1.0 };
        let mut loss = text_cos.affine(-(self.config.similarity_weight as f64) * sign, 0.0)?;
        let mut breakdown = ScoreBreakdown {
            text_similarity: text_cos.to_scalar::<f32>()?,
            ..ScoreBreakdown::default()
        };

        if let Some(sub) = &self.subtract {
            let cos = mean_cos(sub)?;
            breakdown.subtract_similarity = Some(cos.to_scalar::<f32>()?);
            loss = loss.add(&cos.affine(self.config.subtract_weight as f64, 0.0)?)?;
        }
        if let Some(reference) = &self.reference {
            let cos = mean_cos(reference)?;
            breakdown.reference_similarity = Some(cos.to_scalar::<f32>()?);
            loss = loss.sub(&cos.affine(self.config.image_weight as f64, 0.0)?)?;
        }
        if let Some(anchor) = &self.anchor {
            if anchor.dims() != state.dims() {
                return Err(GenError::ShapeMismatch {
                    context: "anchor state",
                    expected: anchor.dims().to_vec(),
                    actual: state.dims().to_vec(),
                });
            }
            let mse = state.sub(anchor)?.sqr()?.mean_all()?;
            breakdown.anchor = Some(mse.to_scalar::<f32>()?);
            loss = loss.add(&mse.affine(self.config.anchor_weight as f64, 0.0)?)?;
        }

        breakdown.total = loss.to_scalar::<f32>()?;
        Ok((loss, breakdown))
    }
}

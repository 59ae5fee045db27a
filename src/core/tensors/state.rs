//! 최적화 가능한 표현 상태와 불변 체크포인트

use crate::core::error::{GenError, GenResult};
use candle_core::{Tensor, Var};
use serde::{Deserialize, Serialize};

/// 디코딩 방식 태그와 형상 메타데이터
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum StateLayout {
    /// 주파수 영역 계수 `(B, C, H, Wf, 2)` - 마지막 축은 (실수, 허수)
    Spectral {
        batch: usize,
        channels: usize,
        height: usize,
        width: usize,
    },
    /// 코드북 로짓 `(B, V, gh, gw)`
    CodebookLogits {
        batch: usize,
        vocab: usize,
        grid_h: usize,
        grid_w: usize,
    },
    /// 생성기에 직접 들어가는 연속 잠재 벡터
    Latent { dims: Vec<usize> },
}

/// rfft 결과의 가로 주파수 빈 개수
pub fn freq_bins(width: usize) -> usize {
    if width % 2 == 1 {
        (width + 1) / 2
    } else {
        width / 2 + 1
    }
}

impl StateLayout {
    pub fn dims(&self) -> Vec<usize> {
        match self {
            StateLayout::Spectral { batch, channels, height, width } => {
                vec![*batch, *channels, *height, freq_bins(*width), 2]
            }
            StateLayout::CodebookLogits { batch, vocab, grid_h, grid_w } => {
                vec![*batch, *vocab, *grid_h, *grid_w]
            }
            StateLayout::Latent { dims } => dims.clone(),
        }
    }

    pub fn element_count(&self) -> usize {
        self.dims().iter().product()
    }

    /// 텐서 형상이 레이아웃과 일치하는지 검사
    pub fn check(&self, context: &'static str, values: &Tensor) -> GenResult<()> {
        let expected = self.dims();
        let actual = values.dims().to_vec();
        if expected != actual {
            return Err(GenError::ShapeMismatch { context, expected, actual });
        }
        Ok(())
    }
}

/// 그래디언트 추적 가능한 표현 상태
///
/// 작업 시작 시 생성되고 매 스텝 제자리에서 갱신된다.
#[derive(Debug)]
pub struct ParameterizedState {
    layout: StateLayout,
    var: Var,
}

impl ParameterizedState {
    pub fn new(layout: StateLayout, values: &Tensor) -> GenResult<Self> {
        layout.check("state init", values)?;
        let var = Var::from_tensor(&values.detach())?;
        Ok(Self { layout, var })
    }

    pub fn layout(&self) -> &StateLayout {
        &self.layout
    }

    /// 자동 미분 그래프에 연결되는 텐서
    pub fn values(&self) -> &Tensor {
        self.var.as_tensor()
    }

    /// 옵티마이저 전이 결과를 반영
    pub fn set(&self, values: &Tensor) -> GenResult<()> {
        self.layout.check("state update", values)?;
        self.var.set(values)?;
        Ok(())
    }

    /// 현재 값의 분리된 복사본으로 체크포인트 생성
    pub fn snapshot(&self, step: usize) -> GenResult<Checkpoint> {
        Checkpoint::from_tensor(step, self.layout.clone(), self.values())
    }
}

/// 특정 스텝의 불변 스냅샷
#[derive(Debug, Clone)]
pub struct Checkpoint {
    step: usize,
    layout: StateLayout,
    values: Tensor,
}

impl Checkpoint {
    /// 텐서를 깊은 복사하여 체크포인트로 고정
    pub fn from_tensor(step: usize, layout: StateLayout, values: &Tensor) -> GenResult<Self> {
        layout.check("checkpoint", values)?;
        let values = values.detach().copy()?;
        Ok(Self { step, layout, values })
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn layout(&self) -> &StateLayout {
        &self.layout
    }

    pub fn values(&self) -> &Tensor {
        &self.values
    }

    /// `w * other + (1 - w) * self` (표현 공간 블렌딩)
    pub fn blend(&self, other: &Checkpoint, weight: f32) -> GenResult<Tensor> {
        if self.layout != other.layout {
            return Err(GenError::ShapeMismatch {
                context: "checkpoint blend",
                expected: self.layout.dims(),
                actual: other.layout.dims(),
            });
        }
        let w = weight as f64;
        let near = self.values.affine(1.0 - w, 0.0)?;
        let far = other.values.affine(w, 0.0)?;
        Ok(near.add(&far)?)
    }
}

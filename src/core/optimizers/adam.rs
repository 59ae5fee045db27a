//! Adam / AdamW

use super::Optimizer;
use super::config::AdamConfig;
use crate::core::error::GenResult;
use candle_core::Tensor;

/// Adam 최적화기 상태
///
/// `decoupled` 이면 AdamW: 가중치 감소를 그래디언트가 아닌 파라미터에 직접 적용한다.
#[derive(Debug)]
pub struct Adam {
    config: AdamConfig,
    decoupled: bool,
    m: Option<Tensor>, // 1차 모멘트
    v: Option<Tensor>, // 2차 모멘트
    t: i32,            // 시간 스텝
}

impl Adam {
    pub fn new(config: AdamConfig) -> Self {
        Self { config, decoupled: false, m: None, v: None, t: 0 }
    }

    pub fn adam_w(config: AdamConfig) -> Self {
        Self { decoupled: true, ..Self::new(config) }
    }

    pub fn steps(&self) -> i32 {
        self.t
    }
}

impl Optimizer for Adam {
    fn name(&self) -> &'static str {
        if self.decoupled {
            "adamw"
        } else {
            "adam"
        }
    }

    fn step(&mut self, params: &Tensor, grad: &Tensor, lr: f32) -> GenResult<Tensor> {
        let AdamConfig { beta1, beta2, epsilon, weight_decay } = self.config;
        self.t += 1;

        let mut p = params.clone();
        let mut g = grad.clone();
        if weight_decay != 0.0 {
            if self.decoupled {
                p = p.affine(1.0 - (lr * weight_decay) as f64, 0.0)?;
            } else {
                g = g.add(&params.affine(weight_decay as f64, 0.0)?)?;
            }
        }

        // 모멘텀 업데이트
        let m_scaled = g.affine((1.0 - beta1) as f64, 0.0)?;
        let m = match &self.m {
            Some(m) => m.affine(beta1 as f64, 0.0)?.add(&m_scaled)?,
            None => m_scaled,
        };
        let v_scaled = g.sqr()?.affine((1.0 - beta2) as f64, 0.0)?;
        let v = match &self.v {
            Some(v) => v.affine(beta2 as f64, 0.0)?.add(&v_scaled)?,
            None => v_scaled,
        };

        // 편향 보정
        let m_hat = m.affine(1.0 / (1.0 - (beta1 as f64).powi(self.t)), 0.0)?;
        let v_hat = v.affine(1.0 / (1.0 - (beta2 as f64).powi(self.t)), 0.0)?;

        // 파라미터 업데이트
        let update = m_hat.div(&v_hat.sqrt()?.affine(1.0, epsilon as f64)?)?;
        let next = p.sub(&update.affine(lr as f64, 0.0)?)?;

        self.m = Some(m);
        self.v = Some(v);
        Ok(next)
    }

    /// 상태 초기화
    fn reset(&mut self) {
        self.m = None;
        self.v = None;
        self.t = 0;
    }
}

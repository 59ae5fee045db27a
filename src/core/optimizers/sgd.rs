//! 모멘텀 SGD

use super::Optimizer;
use super::config::SgdConfig;
use crate::core::error::GenResult;
use candle_core::Tensor;

/// 모멘텀 버퍼를 가진 SGD (감쇠 없음)
///
/// `g = ∇ + λ·p`, `v = μ·v + g`, `p ← p - lr·v` (nesterov: `p ← p - lr·(g + μ·v)`)
#[derive(Debug)]
pub struct Sgd {
    config: SgdConfig,
    velocity: Option<Tensor>,
}

impl Sgd {
    pub fn new(config: SgdConfig) -> Self {
        Self { config, velocity: None }
    }

    pub fn velocity(&self) -> Option<&Tensor> {
        self.velocity.as_ref()
    }
}

impl Optimizer for Sgd {
    fn name(&self) -> &'static str {
        "sgd"
    }

    fn step(&mut self, params: &Tensor, grad: &Tensor, lr: f32) -> GenResult<Tensor> {
        let SgdConfig { momentum, nesterov, weight_decay } = self.config;
        let mut g = grad.clone();
        if weight_decay != 0.0 {
            g = g.add(&params.affine(weight_decay as f64, 0.0)?)?;
        }

        let direction = if momentum != 0.0 {
            let v = match &self.velocity {
                Some(v) => v.affine(momentum as f64, 0.0)?.add(&g)?,
                None => g.clone(),
            };
            let direction = if nesterov {
                g.add(&v.affine(momentum as f64, 0.0)?)?
            } else {
                v.clone()
            };
            self.velocity = Some(v);
            direction
        } else {
            g
        };

        Ok(params.sub(&direction.affine(lr as f64, 0.0)?)?)
    }

    fn reset(&mut self) {
        self.velocity = None;
    }
}

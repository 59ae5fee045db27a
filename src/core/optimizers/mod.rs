//! # 옵티마이저
//!
//! 각 옵티마이저는 `step(params, grad) -> new_params` 순수 전이로 동작하고
//! 내부에는 모멘트 버퍼만 보관한다. 파라미터 반영(`Var::set`)은 루프가 한다.

pub mod adam;
pub mod config;
pub mod sgd;

#[cfg(test)]
mod __tests__;

pub use adam::Adam;
pub use config::{AdamConfig, LearningRateSchedule, OptimizerConfig, OptimizerMethod, SgdConfig};
pub use sgd::Sgd;

use crate::core::error::{GenError, GenResult};
use candle_core::Tensor;

pub trait Optimizer: Send {
    fn name(&self) -> &'static str;

    /// 현재 파라미터와 그래디언트로 다음 파라미터 계산
    fn step(&mut self, params: &Tensor, grad: &Tensor, lr: f32) -> GenResult<Tensor>;

    fn reset(&mut self);
}

pub fn build_optimizer(config: &OptimizerConfig) -> GenResult<Box<dyn Optimizer>> {
    if !(config.learning_rate > 0.0) || !config.learning_rate.is_finite() {
        return Err(GenError::invalid_config(format!(
            "learning rate must be positive, got {}",
            config.learning_rate
        )));
    }
    let optimizer: Box<dyn Optimizer> = match config.method {
        OptimizerMethod::Sgd(sgd) => {
            if !(0.0..1.0).contains(&sgd.momentum) {
                return Err(GenError::invalid_config("sgd momentum must be in [0, 1)"));
            }
            if sgd.nesterov && sgd.momentum == 0.0 {
                return Err(GenError::invalid_config("nesterov requires momentum"));
            }
            Box::new(Sgd::new(sgd))
        }
        OptimizerMethod::Adam(adam) => {
            validate_adam(&adam)?;
            Box::new(Adam::new(adam))
        }
        OptimizerMethod::AdamW(adam) => {
            validate_adam(&adam)?;
            Box::new(Adam::adam_w(adam))
        }
    };
    Ok(optimizer)
}

fn validate_adam(config: &AdamConfig) -> GenResult<()> {
    let betas_ok = (0.0..1.0).contains(&config.beta1) && (0.0..1.0).contains(&config.beta2);
    if !betas_ok || !(config.epsilon > 0.0) {
        return Err(GenError::invalid_config(format!(
            "adam betas must be in [0, 1) and epsilon positive: {config:?}"
        )));
    }
    Ok(())
}

/// 전역 L2 노름이 `max_norm` 을 넘으면 비례 축소
pub fn clip_grad_norm(grad: &Tensor, max_norm: f32) -> GenResult<Tensor> {
    let norm = grad.sqr()?.sum_all()?.sqrt()?.to_scalar::<f32>()?;
    if norm.is_finite() && norm > max_norm && norm > 0.0 {
        Ok(grad.affine((max_norm / norm) as f64, 0.0)?)
    } else {
        Ok(grad.clone())
    }
}

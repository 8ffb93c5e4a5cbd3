//! Entropy coefficient of SAC.
use crate::opt::{Optimizer, OptimizerConfig};
use anyhow::Result;
use candle_core::{DType, Device, Tensor};
use candle_nn::{init::Init, VarBuilder, VarMap};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Mode of the entropy coefficient of SAC.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum EntCoefMode {
    /// Use a constant as alpha.
    Fix(f64),

    /// Automatic tuning of alpha.
    Auto {
        /// Target entropy. `-action_dim` if not given.
        target_entropy: Option<f64>,

        /// Learning rate of `log(alpha)`.
        lr: f64,
    },
}

impl Default for EntCoefMode {
    fn default() -> Self {
        Self::Auto {
            target_entropy: None,
            lr: 3e-4,
        }
    }
}

/// The entropy coefficient of SAC.
///
/// The parameter is `log(alpha)`.
pub struct EntCoef {
    varmap: VarMap,
    log_alpha: Tensor,
    target_entropy: Option<f64>,
    opt: Option<Optimizer>,
}

impl EntCoef {
    /// Constructs an instance of `EntCoef`.
    ///
    /// `act_dim` gives the default target entropy `-act_dim`.
    pub fn new(mode: EntCoefMode, act_dim: usize, device: &Device) -> Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let (log_alpha, target_entropy, opt) = match mode {
            EntCoefMode::Fix(alpha) => {
                let init = Init::Const(alpha.ln());
                let log_alpha = vb.get_with_hints(1, "log_alpha", init)?;
                (log_alpha, None, None)
            }
            EntCoefMode::Auto { target_entropy, lr } => {
                let init = Init::Const(0.0);
                let log_alpha = vb.get_with_hints(1, "log_alpha", init)?;
                let opt = OptimizerConfig::Adam { lr }.build(varmap.all_vars())?;
                let target_entropy = target_entropy.unwrap_or(-(act_dim as f64));
                (log_alpha, Some(target_entropy), Some(opt))
            }
        };

        Ok(Self {
            varmap,
            log_alpha,
            opt,
            target_entropy,
        })
    }

    /// Returns the entropy coefficient, detached from the graph, with shape `[1]`.
    pub fn alpha(&self) -> Result<Tensor> {
        Ok(self.log_alpha.detach().exp()?)
    }

    /// Returns `true` if alpha is tuned automatically.
    pub fn is_auto(&self) -> bool {
        self.opt.is_some()
    }

    /// Loss of `log(alpha)` given log probabilities of sampled actions,
    /// `-mean(log_alpha * (log_p + target_entropy))`.
    ///
    /// Returns `None` if alpha is fixed.
    pub fn loss(&self, log_p: &Tensor) -> Result<Option<Tensor>> {
        match self.target_entropy {
            None => Ok(None),
            Some(target_entropy) => {
                let t = log_p.detach().affine(1.0, target_entropy)?;
                let loss = self.log_alpha.broadcast_mul(&t)?.mean_all()?.neg()?;
                Ok(Some(loss))
            }
        }
    }

    /// Does an optimization step given a loss.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        if let Some(opt) = &mut self.opt {
            opt.backward_step(loss)?;
        }
        Ok(())
    }

    /// Save the parameter into a file.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.varmap.save(&path)?;
        info!("Save entropy coefficient to {:?}", path.as_ref());
        Ok(())
    }

    /// Load the parameter from a file.
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.varmap.load(&path)?;
        info!("Load entropy coefficient from {:?}", path.as_ref());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_alpha() -> Result<()> {
        let ent_coef = EntCoef::new(EntCoefMode::Fix(0.2), 1, &Device::Cpu)?;
        let alpha = ent_coef.alpha()?.to_vec1::<f32>()?[0];
        assert!((alpha - 0.2).abs() < 1e-6);
        let log_p = Tensor::new(&[0.5f32, 1.0], &Device::Cpu)?;
        assert!(ent_coef.loss(&log_p)?.is_none());
        Ok(())
    }

    #[test]
    fn test_auto_alpha_follows_entropy() -> Result<()> {
        // log_p well above the target entropy of -1 means too little entropy,
        // so alpha has to grow.
        let mut ent_coef = EntCoef::new(
            EntCoefMode::Auto {
                target_entropy: None,
                lr: 0.1,
            },
            1,
            &Device::Cpu,
        )?;
        let log_p = Tensor::new(&[2.0f32, 3.0], &Device::Cpu)?;
        for _ in 0..5 {
            let loss = ent_coef.loss(&log_p)?.unwrap();
            ent_coef.backward_step(&loss)?;
        }
        assert!(ent_coef.alpha()?.to_vec1::<f32>()?[0] > 1.0);
        Ok(())
    }
}

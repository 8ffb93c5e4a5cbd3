//! Actor of SAC agent.
use crate::{
    model::SubModel1,
    opt::{Optimizer, OptimizerConfig},
    util::OutDim,
};
use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{VarBuilder, VarMap};
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`GaussianActor`].
pub struct GaussianActorConfig<P> {
    /// Configuration of the policy network.
    pub pi_config: Option<P>,

    /// Configuration of the optimizer.
    pub opt_config: OptimizerConfig,

    /// Lower bound of the log standard deviation.
    pub min_log_std: f64,

    /// Upper bound of the log standard deviation.
    pub max_log_std: f64,

    /// Added inside the logarithm of the tanh correction.
    pub epsilon: f64,
}

impl<P> Default for GaussianActorConfig<P> {
    fn default() -> Self {
        Self {
            pi_config: None,
            opt_config: OptimizerConfig::default(),
            min_log_std: -20.0,
            max_log_std: 2.0,
            epsilon: 1e-6,
        }
    }
}

impl<P> GaussianActorConfig<P>
where
    P: DeserializeOwned + Serialize + OutDim,
{
    /// Sets configurations for the policy network.
    pub fn pi_config(mut self, v: P) -> Self {
        self.pi_config = Some(v);
        self
    }

    /// Sets output dimension of the model.
    pub fn out_dim(mut self, v: usize) -> Self {
        if let Some(pi_config) = &mut self.pi_config {
            pi_config.set_out_dim(v);
        }
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Sets the bounds of the log standard deviation.
    pub fn log_std_range(mut self, min: f64, max: f64) -> Self {
        self.min_log_std = min;
        self.max_log_std = max;
        self
    }

    /// Constructs [`GaussianActorConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`GaussianActorConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Actions sampled from a [`GaussianActor`] with the distribution parameters.
pub struct ActorSample {
    /// Squashed actions, `[batch_size, act_dim]`.
    pub action: Tensor,

    /// Log probability of the actions, `[batch_size]`.
    pub log_p: Tensor,

    /// Mean before squashing.
    pub mean: Tensor,

    /// Clamped log standard deviation.
    pub log_std: Tensor,
}

/// Log density of `a = tanh(mean + exp(log_std) * z)`, summed over the last dimension.
///
/// `log N(z; 0, 1) - log_std - log(1 - a^2 + epsilon)`
pub fn tanh_normal_log_prob(
    z: &Tensor,
    log_std: &Tensor,
    a: &Tensor,
    epsilon: f64,
) -> Result<Tensor> {
    let half_log_2pi = 0.5 * (2.0 * std::f64::consts::PI).ln();
    let normal = z.sqr()?.affine(-0.5, -half_log_2pi)?.sum(D::Minus1)?;
    let log_std = log_std.sum(D::Minus1)?;
    let squash = a.sqr()?.affine(-1.0, 1.0 + epsilon)?.log()?.sum(D::Minus1)?;
    Ok(normal.sub(&log_std)?.sub(&squash)?)
}

/// Tanh-squashed Gaussian policy.
pub struct GaussianActor<P>
where
    P: SubModel1<Input = Tensor, Output = (Tensor, Tensor)>,
{
    device: Device,
    varmap: VarMap,
    out_dim: usize,
    pi: P,
    opt: Optimizer,
    min_log_std: f64,
    max_log_std: f64,
    epsilon: f64,
}

impl<P> GaussianActor<P>
where
    P: SubModel1<Input = Tensor, Output = (Tensor, Tensor)>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    /// Constructs [`GaussianActor`].
    pub fn build(config: GaussianActorConfig<P::Config>, device: &Device) -> Result<Self> {
        let pi_config = config.pi_config.context("pi_config is not set.")?;
        let out_dim = pi_config.get_out_dim();
        let varmap = VarMap::new();
        let pi = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, device).set_prefix("actor");
            P::build(vb, pi_config)?
        };
        let opt = config.opt_config.build(varmap.all_vars())?;

        Ok(Self {
            device: device.clone(),
            varmap,
            out_dim,
            pi,
            opt,
            min_log_std: config.min_log_std,
            max_log_std: config.max_log_std,
            epsilon: config.epsilon,
        })
    }

    /// Outputs the mean and the clamped log standard deviation given observations.
    pub fn forward(&self, obs: &Tensor) -> Result<(Tensor, Tensor)> {
        let (mean, log_std) = self.pi.forward(obs)?;
        debug_assert_eq!(mean.dims()[1], self.out_dim);
        let log_std = log_std.clamp(self.min_log_std, self.max_log_std)?;
        Ok((mean, log_std))
    }

    /// Samples actions with the reparameterization trick.
    ///
    /// Gradients flow from the actions and their log probabilities into the
    /// parameters of the policy.
    pub fn sample(&self, obs: &Tensor) -> Result<ActorSample> {
        let (mean, log_std) = self.forward(obs)?;
        let z = Tensor::randn(0f32, 1f32, mean.dims(), &self.device)?;
        let action = log_std.exp()?.mul(&z)?.add(&mean)?.tanh()?;
        let log_p = tanh_normal_log_prob(&z, &log_std, &action, self.epsilon)?;

        Ok(ActorSample {
            action,
            log_p,
            mean,
            log_std,
        })
    }

    /// Returns the mode of the action distribution, `tanh(mean)`.
    pub fn mode(&self, obs: &Tensor) -> Result<Tensor> {
        let (mean, _) = self.forward(obs)?;
        Ok(mean.tanh()?)
    }

    /// Dimension of actions.
    pub fn out_dim(&self) -> usize {
        self.out_dim
    }

    /// Variables of the policy.
    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// Does an optimization step given a loss.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.opt.backward_step(loss)
    }

    /// Saves the parameters as safetensors.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.varmap.save(&path)?;
        info!("Save actor to {:?}", path.as_ref());
        Ok(())
    }

    /// Loads the parameters from safetensors.
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.varmap.load(&path)?;
        info!("Load actor from {:?}", path.as_ref());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mlp::{Mlp2, MlpConfig};

    #[test]
    fn test_log_prob_at_origin() -> Result<()> {
        let dev = Device::Cpu;
        let z = Tensor::zeros((1, 1), DType::F32, &dev)?;
        let log_std = Tensor::zeros((1, 1), DType::F32, &dev)?;
        let a = Tensor::zeros((1, 1), DType::F32, &dev)?;
        let log_p = tanh_normal_log_prob(&z, &log_std, &a, 1e-6)?.to_vec1::<f32>()?;
        assert!((log_p[0] + 0.918939).abs() < 1e-4);

        // A wider distribution has a lower density at its mean.
        let log_std = Tensor::ones((1, 1), DType::F32, &dev)?;
        let log_p_wide = tanh_normal_log_prob(&z, &log_std, &a, 1e-6)?.to_vec1::<f32>()?;
        assert!((log_p_wide[0] - (log_p[0] - 1.0)).abs() < 1e-4);
        Ok(())
    }

    #[test]
    fn test_sample_and_mode() -> Result<()> {
        let config = GaussianActorConfig::default()
            .pi_config(MlpConfig::new(3, vec![16, 16], 2, false))
            .log_std_range(-5.0, 2.0);
        let actor = GaussianActor::<Mlp2>::build(config, &Device::Cpu)?;
        let obs = Tensor::randn(0f32, 1f32, (8, 3), &Device::Cpu)?;

        let sample = actor.sample(&obs)?;
        assert_eq!(sample.action.dims(), &[8, 2]);
        assert_eq!(sample.log_p.dims(), &[8]);
        let a = sample.action.flatten_all()?.to_vec1::<f32>()?;
        assert!(a.iter().all(|v| (-1.0..=1.0).contains(v)));
        let log_std = sample.log_std.flatten_all()?.to_vec1::<f32>()?;
        assert!(log_std.iter().all(|v| (-5.0..=2.0).contains(v)));

        let mode = actor.mode(&obs)?;
        assert_eq!(mode.dims(), &[8, 2]);
        Ok(())
    }
}

//! Critics of SAC agent with their target networks.
use crate::{
    model::SubModel2,
    opt::{Optimizer, OptimizerConfig},
    util::{ensure_finite_varmap, track_with_replace_substring},
};
use anyhow::{Context, Result};
use candle_core::{DType::F32, Device, Tensor, D};
use candle_nn::{VarBuilder, VarMap};
use drla_core::error::DrlaError;
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`MultiCritic`].
pub struct MultiCriticConfig<Q> {
    /// The number of critic networks.
    pub n_nets: usize,

    /// Configuration of critic networks.
    pub q_config: Option<Q>,

    /// Configuration of the optimizer.
    pub opt_config: OptimizerConfig,

    /// Soft update coefficient.
    pub tau: f64,
}

impl<Q> Default for MultiCriticConfig<Q> {
    fn default() -> Self {
        Self {
            n_nets: 2,
            q_config: None,
            opt_config: OptimizerConfig::Adam { lr: 0.0003 },
            tau: 0.005,
        }
    }
}

impl<Q> MultiCriticConfig<Q>
where
    Q: DeserializeOwned + Serialize,
{
    /// Sets the number of critic networks.
    pub fn n_nets(mut self, v: usize) -> Self {
        self.n_nets = v;
        self
    }

    /// Sets configurations for action-value function.
    pub fn q_config(mut self, v: Q) -> Self {
        self.q_config = Some(v);
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Sets soft update parameter tau.
    pub fn tau(mut self, v: f64) -> Self {
        self.tau = v;
        self
    }

    /// Checks the ranges of the values.
    pub fn validate(&self) -> Result<(), DrlaError> {
        if !(self.tau > 0.0 && self.tau <= 1.0) {
            return Err(DrlaError::InvalidConfig(format!(
                "tau must be in (0, 1], got {}",
                self.tau
            )));
        }
        if self.n_nets == 0 {
            return Err(DrlaError::InvalidConfig("n_nets must be >= 1".into()));
        }
        Ok(())
    }

    /// Constructs [`MultiCriticConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`MultiCriticConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Critics for agents with continuous action.
///
/// It takes observations and actions as inputs and outputs action values.
///
/// This struct has multiple q functions and corresponding target networks.
/// Target networks are never updated by gradients; [`MultiCritic::soft_update`]
/// is the only operation modifying them.
pub struct MultiCritic<Q>
where
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
{
    n_nets: usize,
    tau: f64,
    varmap: VarMap,
    varmap_tgt: VarMap,
    qs: Vec<Q>,
    qs_tgt: Vec<Q>,

    // Shared by all critics, none for target networks
    opt: Optimizer,
}

impl<Q> MultiCritic<Q>
where
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + Clone,
{
    /// Constructs [`MultiCritic`].
    ///
    /// Target networks start as copies of the critics.
    pub fn build(config: MultiCriticConfig<Q::Config>, device: &Device) -> Result<Self> {
        config.validate()?;
        let q_config = config.q_config.context("q_config is not set.")?;

        let (varmap, qs) = Self::build_critic_networks(&q_config, device, config.n_nets, "critic")?;
        let (varmap_tgt, qs_tgt) =
            Self::build_critic_networks(&q_config, device, config.n_nets, "critic_tgt")?;
        let opt = config.opt_config.build(varmap.all_vars())?;

        track_with_replace_substring(&varmap_tgt, &varmap, 1.0, ("critic", "critic_tgt"))?;

        Ok(Self {
            n_nets: config.n_nets,
            tau: config.tau,
            varmap,
            varmap_tgt,
            qs,
            qs_tgt,
            opt,
        })
    }

    fn build_critic_networks(
        q_config: &Q::Config,
        device: &Device,
        n_nets: usize,
        prefix: &str,
    ) -> Result<(VarMap, Vec<Q>)> {
        let varmap = VarMap::new();
        let qs = (0..n_nets)
            .map(|ix| {
                if device.is_cuda() {
                    device.set_seed((ix + 10) as _)?;
                }
                let vb = VarBuilder::from_varmap(&varmap, F32, device)
                    .set_prefix(format!("{}{}", prefix, ix));
                Q::build(vb, q_config.clone())
            })
            .collect::<Result<Vec<_>>>()?;

        Ok((varmap, qs))
    }

    /// The number of critics.
    pub fn n_nets(&self) -> usize {
        self.n_nets
    }

    /// Polyak averaging of the target networks,
    /// `target = (1 - tau) * target + tau * critic`.
    ///
    /// Fails with [`DrlaError::NumericDivergence`] without touching the
    /// targets if any critic variable is not finite.
    pub fn soft_update(&mut self) -> Result<()> {
        ensure_finite_varmap("critic", &self.varmap)?;
        track_with_replace_substring(
            &self.varmap_tgt,
            &self.varmap,
            self.tau,
            ("critic", "critic_tgt"),
        )
    }

    fn forward_all(qs: &[Q], obs: &Tensor, act: &Tensor) -> Result<Vec<Tensor>> {
        qs.iter()
            .map(|q| Ok(q.forward(obs, act)?.squeeze(D::Minus1)?))
            .collect()
    }

    fn min(qvals: &[Tensor]) -> Result<Tensor> {
        Ok(Tensor::stack(qvals, 0)?.min(0)?)
    }

    /// Returns action values of all critics, each `[batch_size]`.
    pub fn qvals(&self, obs: &Tensor, act: &Tensor) -> Result<Vec<Tensor>> {
        Self::forward_all(&self.qs, obs, act)
    }

    /// Returns minimum action values over the critics, `[batch_size]`.
    pub fn qvals_min(&self, obs: &Tensor, act: &Tensor) -> Result<Tensor> {
        Self::min(&self.qvals(obs, act)?)
    }

    /// Returns minimum action values over the target networks, `[batch_size]`.
    pub fn qvals_min_tgt(&self, obs: &Tensor, act: &Tensor) -> Result<Tensor> {
        Self::min(&Self::forward_all(&self.qs_tgt, obs, act)?)
    }

    /// Variables of the critics.
    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// Variables of the target networks.
    pub fn varmap_tgt(&self) -> &VarMap {
        &self.varmap_tgt
    }

    /// Backward step for all variables in critic networks.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.opt.backward_step(loss)
    }

    /// Saves the critics to `prefix.safetensors` and the target networks
    /// to `prefix.tgt.safetensors`.
    pub fn save<T: AsRef<Path>>(&self, prefix: T) -> Result<(PathBuf, PathBuf)> {
        let mut path = PathBuf::from(prefix.as_ref());
        path.set_extension("safetensors");
        self.varmap.save(&path)?;
        info!("Save critics to {:?}", path);

        let mut path_tgt = PathBuf::from(prefix.as_ref());
        path_tgt.set_extension("tgt.safetensors");
        self.varmap_tgt.save(&path_tgt)?;
        info!("Save target critics to {:?}", path_tgt);

        Ok((path, path_tgt))
    }

    /// Loads variables saved with [`MultiCritic::save`].
    pub fn load<T: AsRef<Path>>(&mut self, prefix: T) -> Result<()> {
        let mut path = PathBuf::from(prefix.as_ref());
        path.set_extension("safetensors");
        self.varmap.load(&path)?;
        info!("Load critics from {:?}", path);

        let mut path_tgt = PathBuf::from(prefix.as_ref());
        path_tgt.set_extension("tgt.safetensors");
        self.varmap_tgt.load(&path_tgt)?;
        info!("Load target critics from {:?}", path_tgt);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mlp::{Mlp, MlpConfig};

    fn critic(tau: f64) -> Result<MultiCritic<Mlp>> {
        let config = MultiCriticConfig::default()
            .q_config(MlpConfig::new(4, vec![8], 1, false))
            .tau(tau);
        MultiCritic::build(config, &Device::Cpu)
    }

    fn inputs() -> Result<(Tensor, Tensor)> {
        let obs = Tensor::randn(0f32, 1f32, (6, 3), &Device::Cpu)?;
        let act = Tensor::randn(0f32, 1f32, (6, 1), &Device::Cpu)?;
        Ok((obs, act))
    }

    #[test]
    fn test_targets_start_as_copies() -> Result<()> {
        let critic = critic(0.01)?;
        let (obs, act) = inputs()?;
        let q = critic.qvals_min(&obs, &act)?;
        let q_tgt = critic.qvals_min_tgt(&obs, &act)?;
        assert_eq!(q.dims(), &[6]);
        let diff = q.sub(&q_tgt)?.abs()?.max(0)?.to_scalar::<f32>()?;
        assert!(diff < 1e-6);
        Ok(())
    }

    #[test]
    fn test_min_over_critics() -> Result<()> {
        let critic = critic(0.01)?;
        let (obs, act) = inputs()?;
        let qvals = critic.qvals(&obs, &act)?;
        assert_eq!(qvals.len(), 2);
        let q_min = critic.qvals_min(&obs, &act)?.to_vec1::<f32>()?;
        let q1 = qvals[0].to_vec1::<f32>()?;
        let q2 = qvals[1].to_vec1::<f32>()?;
        for i in 0..6 {
            assert_eq!(q_min[i], q1[i].min(q2[i]));
        }
        Ok(())
    }

    #[test]
    fn test_targets_change_only_by_soft_update() -> Result<()> {
        let mut critic = critic(1.0)?;
        let (obs, act) = inputs()?;
        let q_tgt0 = critic.qvals_min_tgt(&obs, &act)?.to_vec1::<f32>()?;

        let loss = critic.qvals_min(&obs, &act)?.sqr()?.mean_all()?;
        critic.backward_step(&loss)?;
        assert_eq!(critic.qvals_min_tgt(&obs, &act)?.to_vec1::<f32>()?, q_tgt0);

        // tau = 1 is a hard copy.
        critic.soft_update()?;
        let q = critic.qvals_min(&obs, &act)?.to_vec1::<f32>()?;
        let q_tgt = critic.qvals_min_tgt(&obs, &act)?.to_vec1::<f32>()?;
        for (a, b) in q.iter().zip(q_tgt.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
        Ok(())
    }

    #[test]
    fn test_soft_update_rejects_non_finite_critic() -> Result<()> {
        let mut critic = critic(0.5)?;
        let (obs, act) = inputs()?;
        let q_tgt0 = critic.qvals_min_tgt(&obs, &act)?.to_vec1::<f32>()?;

        {
            let data = critic.varmap().data().lock().unwrap();
            let (_, var) = data.iter().next().unwrap();
            let nan = var.as_tensor().affine(0.0, f64::NAN)?;
            var.set(&nan)?;
        }

        let err = critic.soft_update().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DrlaError>(),
            Some(DrlaError::NumericDivergence(_))
        ));
        assert_eq!(critic.qvals_min_tgt(&obs, &act)?.to_vec1::<f32>()?, q_tgt0);
        Ok(())
    }

    #[test]
    fn test_validate() {
        let config = MultiCriticConfig::<MlpConfig>::default();
        assert!(config.validate().is_ok());
        assert!(config.clone().tau(0.0).validate().is_err());
        assert!(config.n_nets(0).validate().is_err());
    }
}

//! Configuration of SAC agent.
use super::{ent_coef::EntCoefMode, GaussianActorConfig, MultiCriticConfig};
use crate::{util::OutDim, Device};
use anyhow::Result;
use drla_core::error::DrlaError;
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fmt::Debug,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Constructs [`Sac`](super::Sac).
///
/// `Q` and `P` are the configurations of the critic and policy networks.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct SacConfig<Q, P> {
    /// Configuration of the policy.
    pub actor_config: GaussianActorConfig<P>,

    /// Configuration of the critics.
    pub critic_config: MultiCriticConfig<Q>,

    /// Discount factor.
    pub gamma: f64,

    /// Entropy coefficient.
    pub ent_coef_mode: EntCoefMode,

    /// Scale of rewards in the bootstrap target.
    pub reward_scale: f64,

    /// Device on which the networks are placed.
    pub device: Option<Device>,
}

impl<Q, P> Default for SacConfig<Q, P> {
    fn default() -> Self {
        Self {
            actor_config: Default::default(),
            critic_config: Default::default(),
            gamma: 0.99,
            ent_coef_mode: EntCoefMode::default(),
            reward_scale: 1.0,
            device: None,
        }
    }
}

impl<Q, P> SacConfig<Q, P>
where
    Q: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
    P: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone,
{
    /// Sets the configuration of the policy.
    pub fn actor_config(mut self, v: GaussianActorConfig<P>) -> Self {
        self.actor_config = v;
        self
    }

    /// Sets the configuration of the critics.
    pub fn critic_config(mut self, v: MultiCriticConfig<Q>) -> Self {
        self.critic_config = v;
        self
    }

    /// Discount factor.
    pub fn discount(mut self, v: f64) -> Self {
        self.gamma = v;
        self
    }

    /// Soft update coefficient of the target critics.
    pub fn tau(mut self, v: f64) -> Self {
        self.critic_config.tau = v;
        self
    }

    /// The number of critics.
    pub fn n_critics(mut self, v: usize) -> Self {
        self.critic_config.n_nets = v;
        self
    }

    /// Sets the entropy coefficient.
    pub fn ent_coef_mode(mut self, v: EntCoefMode) -> Self {
        self.ent_coef_mode = v;
        self
    }

    /// Reward scale.
    pub fn reward_scale(mut self, v: f64) -> Self {
        self.reward_scale = v;
        self
    }

    /// Device.
    pub fn device(mut self, device: Device) -> Self {
        self.device = Some(device);
        self
    }

    /// Checks the ranges of the values.
    pub fn validate(&self) -> Result<(), DrlaError> {
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(DrlaError::InvalidConfig(format!(
                "gamma must be in [0, 1], got {}",
                self.gamma
            )));
        }
        if !self.reward_scale.is_finite() {
            return Err(DrlaError::InvalidConfig(format!(
                "reward_scale must be finite, got {}",
                self.reward_scale
            )));
        }
        if self.actor_config.min_log_std >= self.actor_config.max_log_std {
            return Err(DrlaError::InvalidConfig(format!(
                "min_log_std ({}) must be less than max_log_std ({})",
                self.actor_config.min_log_std, self.actor_config.max_log_std
            )));
        }
        if let EntCoefMode::Fix(alpha) = self.ent_coef_mode {
            if alpha.is_nan() || alpha <= 0.0 {
                return Err(DrlaError::InvalidConfig(format!(
                    "fixed alpha must be positive, got {}",
                    alpha
                )));
            }
        }
        self.critic_config.validate()
    }

    /// Constructs [`SacConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of SAC agent from {}", path_.to_str().unwrap_or("?"));
        Ok(b)
    }

    /// Saves [`SacConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of SAC agent into {}", path_.to_str().unwrap_or("?"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mlp::MlpConfig, opt::OptimizerConfig};
    use tempdir::TempDir;

    fn config() -> SacConfig<MlpConfig, MlpConfig> {
        SacConfig::default()
            .actor_config(
                GaussianActorConfig::default()
                    .pi_config(MlpConfig::new(3, vec![64, 64], 1, false))
                    .opt_config(OptimizerConfig::Adam { lr: 3e-4 }),
            )
            .critic_config(
                MultiCriticConfig::default().q_config(MlpConfig::new(4, vec![64, 64], 1, false)),
            )
            .tau(0.01)
            .device(Device::Cpu)
    }

    #[test]
    fn test_serde_sac_config() -> Result<()> {
        let config = config().reward_scale(5.0);
        let dir = TempDir::new("sac_config")?;
        let path = dir.path().join("sac_config.yaml");

        config.save(&path)?;
        let config_ = SacConfig::<MlpConfig, MlpConfig>::load(&path)?;
        assert_eq!(config, config_);
        assert_eq!(config_.critic_config.tau, 0.01);
        Ok(())
    }

    #[test]
    fn test_validate() {
        assert!(config().validate().is_ok());
        assert!(config().discount(1.5).validate().is_err());
        assert!(config().tau(0.0).validate().is_err());
        assert!(config().n_critics(0).validate().is_err());
        assert!(config().reward_scale(f64::NAN).validate().is_err());
        assert!(config().ent_coef_mode(EntCoefMode::Fix(0.0)).validate().is_err());

        let mut c = config();
        c.actor_config = c.actor_config.log_std_range(2.0, -20.0);
        assert!(matches!(c.validate(), Err(DrlaError::InvalidConfig(_))));
    }
}

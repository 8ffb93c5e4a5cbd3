//! Hyperparameters and wiring of a SAC run.
use anyhow::Result;
use drla_candle_agent::{
    mlp::{Mlp, Mlp2, MlpConfig},
    opt::OptimizerConfig,
    sac::{EntCoefMode, GaussianActorConfig, MultiCriticConfig, Sac, SacConfig},
    Device,
};
use drla_core::{
    record::Recorder, replay_buffer::SimpleReplayBufferConfig, Env, RunState, Trainer,
    TrainerConfig,
};
use log::info;
use serde::{Deserialize, Serialize};

/// SAC agent with MLP critics and policy.
pub type MlpSac<E> = Sac<E, Mlp, Mlp2>;

/// Hyperparameters of a SAC run.
///
/// It is serialized into the variant of the run.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct SacVariant {
    /// Name of the algorithm.
    pub algorithm: String,

    /// Seed of the exploration environment and the replay buffer.
    /// The evaluation environment uses `seed + 1`.
    pub seed: i64,

    /// Capacity of the replay buffer.
    pub replay_buffer_size: usize,

    /// Hidden layer sizes of the policy and critic networks.
    pub hidden_sizes: Vec<usize>,

    /// Discount factor.
    pub discount: f64,

    /// Soft update coefficient of the target critics.
    pub soft_target_tau: f64,

    /// Learning rate of the policy.
    pub policy_lr: f64,

    /// Learning rate of the critics.
    pub qf_lr: f64,

    /// Scale of rewards.
    pub reward_scale: f64,

    /// Tunes the entropy coefficient if `true`, otherwise fixes it at `1.0`.
    pub use_automatic_entropy_tuning: bool,

    /// Device of the networks.
    pub device: Device,

    /// Schedule of the training loop.
    pub trainer: TrainerConfig,
}

impl Default for SacVariant {
    fn default() -> Self {
        Self {
            algorithm: "SAC".to_string(),
            seed: 0,
            replay_buffer_size: 50_000,
            hidden_sizes: vec![64, 64],
            discount: 0.99,
            soft_target_tau: 0.01,
            policy_lr: 3e-4,
            qf_lr: 3e-4,
            reward_scale: 1.0,
            use_automatic_entropy_tuning: true,
            device: Device::Cpu,
            trainer: TrainerConfig::default(),
        }
    }
}

impl SacVariant {
    /// Configuration of the agent for the given dimensions.
    pub fn sac_config(&self, obs_dim: usize, act_dim: usize) -> SacConfig<MlpConfig, MlpConfig> {
        let actor_config = GaussianActorConfig::default()
            .opt_config(OptimizerConfig::Adam { lr: self.policy_lr })
            .pi_config(MlpConfig::new(
                obs_dim,
                self.hidden_sizes.clone(),
                act_dim,
                false,
            ));
        let critic_config = MultiCriticConfig::default()
            .opt_config(OptimizerConfig::Adam { lr: self.qf_lr })
            .q_config(MlpConfig::new(
                obs_dim + act_dim,
                self.hidden_sizes.clone(),
                1,
                false,
            ))
            .tau(self.soft_target_tau);
        let ent_coef_mode = match self.use_automatic_entropy_tuning {
            true => EntCoefMode::Auto {
                target_entropy: None,
                lr: self.policy_lr,
            },
            false => EntCoefMode::Fix(1.0),
        };

        SacConfig::default()
            .actor_config(actor_config)
            .critic_config(critic_config)
            .discount(self.discount)
            .reward_scale(self.reward_scale)
            .ent_coef_mode(ent_coef_mode)
            .device(self.device)
    }

    /// Configuration of the replay buffer for the given dimensions.
    pub fn replay_buffer_config(&self, obs_dim: usize, act_dim: usize) -> SimpleReplayBufferConfig {
        SimpleReplayBufferConfig::default()
            .capacity(self.replay_buffer_size)
            .obs_dim(obs_dim)
            .act_dim(act_dim)
            .seed(self.seed as u64)
    }
}

/// Trains a SAC agent on environment `E` and returns the agent with the final counters.
pub fn train_sac<E, R>(
    variant: &SacVariant,
    env_config: &E::Config,
    recorder: &mut R,
) -> Result<(MlpSac<E>, RunState)>
where
    E: Env,
    R: Recorder + ?Sized,
{
    let (obs_dim, act_dim) = {
        let env = E::build(env_config, variant.seed)?;
        (env.observation_space().dim(), env.action_space().dim())
    };
    info!("obs_dim = {}, act_dim = {}", obs_dim, act_dim);

    let mut agent = MlpSac::<E>::build(variant.sac_config(obs_dim, act_dim))?;
    let mut trainer = Trainer::<E>::build(
        variant.trainer.clone(),
        env_config,
        &variant.replay_buffer_config(obs_dim, act_dim),
        variant.seed,
    )?
    .variant(serde_json::to_value(variant)?);
    let state = trainer.train(&mut agent, recorder)?;

    Ok((agent, state))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_variant() -> Result<()> {
        let variant = SacVariant::default();
        let config = variant.sac_config(3, 1);
        config.validate()?;
        assert_eq!(config.critic_config.tau, 0.01);
        assert_eq!(config.critic_config.n_nets, 2);
        assert_eq!(variant.replay_buffer_config(3, 1).capacity, 50_000);

        let json = serde_json::to_value(&variant)?;
        assert_eq!(json["trainer"]["batch_size"], 512);
        assert_eq!(json["hidden_sizes"], serde_json::json!([64, 64]));
        Ok(())
    }
}

use super::{EntCoef, GaussianActor, MultiCritic, SacConfig};
use crate::{
    model::{SubModel1, SubModel2},
    util::{ensure_finite_varmap, finite_scalar, matrix, mean, OutDim},
};
use anyhow::Result;
use candle_core::{Device, Tensor};
use candle_nn::loss::mse;
use drla_core::{
    record::{Record, RecordValue},
    replay_buffer::TransitionBatch,
    Agent, Env, Obs, Policy, ReplayBufferBase, StochasticPolicy,
};
use log::trace;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    marker::PhantomData,
    path::{Path, PathBuf},
};

/// Soft actor critic (SAC) agent.
///
/// Observations and actions of `E` are fed to the networks as `f32` rows.
pub struct Sac<E, Q, P>
where
    E: Env,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    P: SubModel1<Input = Tensor, Output = (Tensor, Tensor)>,
{
    critic: MultiCritic<Q>,
    pi: GaussianActor<P>,
    ent_coef: EntCoef,
    gamma: f64,
    reward_scale: f64,
    train: bool,
    n_updates: usize,
    device: Device,
    phantom: PhantomData<E>,
}

impl<E, Q, P> Sac<E, Q, P>
where
    E: Env,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    P: SubModel1<Input = Tensor, Output = (Tensor, Tensor)>,
    Q::Config: DeserializeOwned + Serialize + std::fmt::Debug + PartialEq + Clone,
    P::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
{
    /// Constructs [`Sac`] agent in training mode.
    pub fn build(config: SacConfig<Q::Config, P::Config>) -> Result<Self> {
        config.validate()?;
        let device = config.device.unwrap_or_default().to_candle()?;
        let pi = GaussianActor::build(config.actor_config, &device)?;
        let critic = MultiCritic::build(config.critic_config, &device)?;
        let ent_coef = EntCoef::new(config.ent_coef_mode, pi.out_dim(), &device)?;

        Ok(Sac {
            critic,
            pi,
            ent_coef,
            gamma: config.gamma,
            reward_scale: config.reward_scale,
            train: true,
            n_updates: 0,
            device,
            phantom: PhantomData,
        })
    }

    /// The number of parameter updates done so far.
    pub fn n_updates(&self) -> usize {
        self.n_updates
    }

    /// Critics of the agent.
    pub fn critic(&self) -> &MultiCritic<Q> {
        &self.critic
    }

    /// Policy network of the agent.
    pub fn actor(&self) -> &GaussianActor<P> {
        &self.pi
    }

    /// Current entropy coefficient.
    pub fn alpha(&self) -> Result<f32> {
        Ok(self.ent_coef.alpha()?.to_vec1::<f32>()?[0])
    }

    fn obs_row(&self, obs: &E::Obs) -> Result<Tensor> {
        Ok(Tensor::from_slice(obs.as_ref(), (1, obs.len()), &self.device)?)
    }

    fn to_act(a: &Tensor) -> Result<E::Act> {
        Ok(a.squeeze(0)?.to_vec1::<f32>()?.into())
    }

    fn info(mean: &Tensor, log_std: &Tensor) -> Result<Record> {
        Ok(Record::from_slice(&[
            ("mean", RecordValue::Array1(mean.squeeze(0)?.to_vec1::<f32>()?)),
            ("log_std", RecordValue::Array1(log_std.squeeze(0)?.to_vec1::<f32>()?)),
        ]))
    }

    fn update_(&mut self, batch: TransitionBatch) -> Result<Record> {
        let n = batch.len();
        let obs = matrix(&batch.obs, batch.obs_dim, &self.device)?;
        let act = matrix(&batch.act, batch.act_dim, &self.device)?;
        let next_obs = matrix(&batch.next_obs, batch.obs_dim, &self.device)?;
        let reward = Tensor::from_slice(&batch.reward, (n,), &self.device)?;
        let not_terminated = {
            let v = batch
                .is_terminated
                .iter()
                .map(|&t| 1f32 - t as f32)
                .collect::<Vec<_>>();
            Tensor::from_vec(v, (n,), &self.device)?
        };
        let alpha = self.ent_coef.alpha()?;

        trace!("sample actions at obs");
        let new = self.pi.sample(&obs)?;
        let alpha_loss = self.ent_coef.loss(&new.log_p)?;

        trace!("compute target");
        let q_target = {
            let next = self.pi.sample(&next_obs)?;
            let next_q = self.critic.qvals_min_tgt(&next_obs, &next.action)?;
            let next_v = next_q.sub(&alpha.broadcast_mul(&next.log_p)?)?;
            reward
                .affine(self.reward_scale, 0.0)?
                .add(&not_terminated.mul(&next_v)?.affine(self.gamma, 0.0)?)?
                .detach()
        };

        trace!("compute losses");
        let policy_loss = {
            let q_new = self.critic.qvals_min(&obs, &new.action)?;
            alpha.broadcast_mul(&new.log_p)?.sub(&q_new)?.mean_all()?
        };
        let preds = self.critic.qvals(&obs, &act)?;
        let qf_losses = preds
            .iter()
            .map(|pred| Ok(mse(pred, &q_target)?))
            .collect::<Result<Vec<_>>>()?;

        // All losses are checked before any parameter moves.
        let mut record = Record::empty();
        for (i, loss) in qf_losses.iter().enumerate() {
            let key = format!("QF{} Loss", i + 1);
            let v = finite_scalar(&key, loss)?;
            record.insert(key, RecordValue::Scalar(v));
        }
        let v = finite_scalar("Policy Loss", &policy_loss)?;
        record.insert("Policy Loss", RecordValue::Scalar(v));
        if let Some(alpha_loss) = &alpha_loss {
            let v = finite_scalar("Alpha Loss", alpha_loss)?;
            record.insert("Alpha Loss", RecordValue::Scalar(v));
        }

        trace!("optimization steps");
        if let Some(alpha_loss) = &alpha_loss {
            self.ent_coef.backward_step(alpha_loss)?;
        }
        self.pi.backward_step(&policy_loss)?;
        let qf_loss = qf_losses
            .iter()
            .skip(1)
            .try_fold(qf_losses[0].clone(), |acc, l| acc.add(l))?;
        self.critic.backward_step(&qf_loss)?;
        ensure_finite_varmap("actor", self.pi.varmap())?;
        ensure_finite_varmap("critic", self.critic.varmap())?;

        trace!("soft update");
        self.critic.soft_update()?;
        self.n_updates += 1;

        for (i, pred) in preds.iter().enumerate() {
            record.insert(
                format!("Q{} Predictions", i + 1),
                RecordValue::Scalar(mean(pred)?),
            );
        }
        record.insert("Q Targets", RecordValue::Scalar(mean(&q_target)?));
        record.insert("Log Pis", RecordValue::Scalar(mean(&new.log_p)?));
        record.insert("Policy mu", RecordValue::Scalar(mean(&new.mean)?));
        record.insert("Policy log std", RecordValue::Scalar(mean(&new.log_std)?));
        record.insert("Alpha", RecordValue::Scalar(alpha.to_vec1::<f32>()?[0]));

        Ok(record)
    }
}

impl<E, Q, P> Policy<E> for Sac<E, Q, P>
where
    E: Env,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    P: SubModel1<Input = Tensor, Output = (Tensor, Tensor)>,
    Q::Config: DeserializeOwned + Serialize + std::fmt::Debug + PartialEq + Clone,
    P::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
{
    /// Samples from the policy in training mode and returns the mode otherwise.
    fn sample(&mut self, obs: &E::Obs) -> Result<E::Act> {
        Ok(self.sample_with_record(obs)?.0)
    }

    fn sample_with_record(&mut self, obs: &E::Obs) -> Result<(E::Act, Record)> {
        if !self.train {
            return StochasticPolicy::<E>::mode_with_record(self, obs);
        }
        let s = self.pi.sample(&self.obs_row(obs)?)?;
        Ok((Self::to_act(&s.action)?, Self::info(&s.mean, &s.log_std)?))
    }
}

impl<E, Q, P> StochasticPolicy<E> for Sac<E, Q, P>
where
    E: Env,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    P: SubModel1<Input = Tensor, Output = (Tensor, Tensor)>,
    Q::Config: DeserializeOwned + Serialize + std::fmt::Debug + PartialEq + Clone,
    P::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
{
    fn mode(&mut self, obs: &E::Obs) -> Result<E::Act> {
        let obs = self.obs_row(obs)?;
        Self::to_act(&self.pi.mode(&obs)?)
    }

    fn mode_with_record(&mut self, obs: &E::Obs) -> Result<(E::Act, Record)> {
        let (mean, log_std) = self.pi.forward(&self.obs_row(obs)?)?;
        Ok((Self::to_act(&mean.tanh()?)?, Self::info(&mean, &log_std)?))
    }
}

impl<E, Q, P, R> Agent<E, R> for Sac<E, Q, P>
where
    E: Env,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    P: SubModel1<Input = Tensor, Output = (Tensor, Tensor)>,
    Q::Config: DeserializeOwned + Serialize + std::fmt::Debug + PartialEq + Clone,
    P::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
    R: ReplayBufferBase<Batch = TransitionBatch>,
{
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn update(&mut self, batch: TransitionBatch) -> Result<Record> {
        self.update_(batch)
    }

    fn save_params(&self, path: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(path)?;
        let path_pi = path.join("pi.safetensors");
        let path_ent_coef = path.join("ent_coef.safetensors");
        self.pi.save(&path_pi)?;
        let (path_critic, path_critic_tgt) = self.critic.save(path.join("critic"))?;
        self.ent_coef.save(&path_ent_coef)?;
        Ok(vec![path_pi, path_critic, path_critic_tgt, path_ent_coef])
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.pi.load(path.join("pi.safetensors"))?;
        self.critic.load(path.join("critic"))?;
        self.ent_coef.load(path.join("ent_coef.safetensors"))?;
        Ok(())
    }
}

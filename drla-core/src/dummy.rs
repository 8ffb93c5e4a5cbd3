//! Environments and agents used for tests.
use crate::{
    error::DrlaError,
    record::{Record, RecordValue},
    space::BoxSpace,
    Agent, Env, Policy, ReplayBufferBase, Step, StochasticPolicy, VecAct, VecObs,
};
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Configuration of [`DummyEnv`].
#[derive(Clone, Debug)]
pub struct DummyEnvConfig {
    /// Dimension of observations.
    pub obs_dim: usize,

    /// Dimension of actions.
    pub act_dim: usize,

    /// The episode terminates at this step, if given.
    pub terminate_at: Option<usize>,

    /// [`Env::step`] fails when the step counter of the episode reaches this value.
    pub fail_at: Option<usize>,
}

impl Default for DummyEnvConfig {
    fn default() -> Self {
        Self {
            obs_dim: 2,
            act_dim: 1,
            terminate_at: None,
            fail_at: None,
        }
    }
}

/// A counter environment.
///
/// Every coordinate of the observation holds the step count in the current
/// episode and the reward is always `1.0`.
pub struct DummyEnv {
    config: DummyEnvConfig,
    t: usize,
    n_resets: usize,
}

impl DummyEnv {
    /// The number of calls to [`Env::reset`].
    pub fn n_resets(&self) -> usize {
        self.n_resets
    }

    fn obs(&self) -> VecObs {
        VecObs(vec![self.t as f32; self.config.obs_dim])
    }
}

impl Env for DummyEnv {
    type Config = DummyEnvConfig;
    type Obs = VecObs;
    type Act = VecAct;

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            t: 0,
            n_resets: 0,
        })
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        self.t = 0;
        self.n_resets += 1;
        Ok(self.obs())
    }

    fn step(&mut self, a: &Self::Act) -> Result<Step<Self>> {
        self.t += 1;
        if Some(self.t) == self.config.fail_at {
            anyhow::bail!("dummy env failed at step {}", self.t);
        }
        let is_terminated = Some(self.t) == self.config.terminate_at;
        let info = Record::from_scalar("t", self.t as f32);
        Ok(Step::new(self.obs(), a.clone(), 1.0, is_terminated, info))
    }

    fn observation_space(&self) -> BoxSpace {
        BoxSpace::uniform(self.config.obs_dim, 0.0, f32::MAX)
    }

    fn action_space(&self) -> BoxSpace {
        BoxSpace::uniform(self.config.act_dim, -1.0, 1.0)
    }
}

/// An agent counting calls to [`Agent::update`].
///
/// Sampled actions are `0.5` in every coordinate, the mode is `0.0`.
pub struct DummyAgent {
    act_dim: usize,
    train: bool,
    n_updates: usize,
    diverge_at: Option<usize>,
}

impl DummyAgent {
    /// Creates an agent for actions of dimension `act_dim`.
    pub fn new(act_dim: usize) -> Self {
        Self {
            act_dim,
            train: true,
            n_updates: 0,
            diverge_at: None,
        }
    }

    /// The update with this (1-based) index fails with a non-finite loss.
    pub fn diverge_at(mut self, n: usize) -> Self {
        self.diverge_at = Some(n);
        self
    }

    /// The number of successful updates.
    pub fn n_updates(&self) -> usize {
        self.n_updates
    }
}

impl Policy<DummyEnv> for DummyAgent {
    fn sample(&mut self, _obs: &VecObs) -> Result<VecAct> {
        Ok(VecAct(vec![0.5; self.act_dim]))
    }

    fn sample_with_record(&mut self, obs: &VecObs) -> Result<(VecAct, Record)> {
        let act = self.sample(obs)?;
        let record = Record::from_slice(&[("mean", RecordValue::Array1(act.0.clone()))]);
        Ok((act, record))
    }
}

impl StochasticPolicy<DummyEnv> for DummyAgent {
    fn mode(&mut self, _obs: &VecObs) -> Result<VecAct> {
        Ok(VecAct(vec![0.0; self.act_dim]))
    }

    fn mode_with_record(&mut self, obs: &VecObs) -> Result<(VecAct, Record)> {
        let act = self.mode(obs)?;
        let record = Record::from_slice(&[("mean", RecordValue::Array1(act.0.clone()))]);
        Ok((act, record))
    }
}

impl<R: ReplayBufferBase> Agent<DummyEnv, R> for DummyAgent {
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn update(&mut self, _batch: R::Batch) -> Result<Record> {
        if Some(self.n_updates + 1) == self.diverge_at {
            return Err(DrlaError::NumericDivergence("Loss is NaN".into()).into());
        }
        self.n_updates += 1;
        Ok(Record::from_scalar("Loss", self.n_updates as f32))
    }

    fn save_params(&self, path: &Path) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(path)?;
        let file = path.join("dummy_agent.yaml");
        std::fs::write(&file, serde_yaml::to_string(&self.n_updates)?)?;
        Ok(vec![file])
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        let s = std::fs::read_to_string(path.join("dummy_agent.yaml"))?;
        self.n_updates = serde_yaml::from_str(&s)?;
        Ok(())
    }
}

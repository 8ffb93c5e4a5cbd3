//! Train [`Agent`].
mod config;
use crate::{
    collector::{Path, PathCollector},
    error::DrlaError,
    record::{Record, RecordStorage, RecordValue::Scalar, Recorder},
    replay_buffer::{SimpleReplayBuffer, SimpleReplayBufferConfig},
    Agent, Env, MakeDeterministic, Policy, ReplayBufferBase, UniformRandomPolicy,
};
use anyhow::Result;
pub use config::TrainerConfig;
use log::{info, warn};
use serde::Serialize;
use std::{path::PathBuf, time::SystemTime};

/// Counters of a run.
///
/// They start at zero and only increase during a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunState {
    /// The number of completed epochs.
    pub epoch: usize,

    /// Exploration steps taken, including warm-up.
    pub env_steps: usize,

    /// Updates performed.
    pub opt_steps: usize,

    /// Warm-up rounds performed.
    pub warmup_rounds: usize,
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages the off-policy training loop.
///
/// # Training loop
///
/// 0. Given an agent implementing [`Agent`] and a recorder implementing [`Recorder`],
///    the variant of the run, if given, is passed to [`Recorder::log_variant`].
/// 1. Warm-up: while the replay buffer holds fewer than
///    `min_num_steps_before_training` transitions, collect
///    `num_expl_steps_per_train_loop` exploration steps and insert them.
///    No update is performed during warm-up.
/// 2. For every epoch:
///     1. Repeat `num_train_loops_per_epoch` times:
///         * Collect `num_expl_steps_per_train_loop` exploration steps with the agent
///           and insert the paths into the replay buffer.
///         * Perform `num_trains_per_train_loop` updates, each on a batch of
///           `batch_size` transitions sampled from the buffer.
///     2. Collect `num_eval_steps_per_epoch` evaluation steps with the mode of the
///        agent. Evaluation paths are never inserted into the buffer.
///     3. Aggregate the update diagnostics and the statistics of both collectors
///        and write them to the recorder.
///     4. Save the parameters in `(model_dir)/(epoch)` every `save_interval` epochs
///        and in `(model_dir)/best` when the average evaluation return improves.
///
/// # Interaction of objects
///
/// ```mermaid
/// graph LR
///     A[Agent]-->|Env::Act|B[Env]
///     B -->|Env::Obs|A
///     B -->|Step|C[PathCollector]
///     C -->|Path|D[SimpleReplayBuffer]
///     D -->|TransitionBatch|A
/// ```
///
/// Errors of the environment, the replay buffer or the agent are not retried;
/// they end the run.
pub struct Trainer<E: Env> {
    config: TrainerConfig,
    expl_collector: PathCollector<E>,
    eval_collector: PathCollector<E>,
    buffer: SimpleReplayBuffer,
    state: RunState,
    seed: u64,
    variant: Option<serde_json::Value>,
    max_eval_return: f32,
}

impl<E: Env> Trainer<E> {
    /// Constructs a trainer from environments built by the caller.
    pub fn new(
        config: TrainerConfig,
        expl_env: E,
        eval_env: E,
        buffer: SimpleReplayBuffer,
        seed: u64,
    ) -> Result<Self> {
        config.validate()?;
        if config.min_num_steps_before_training > buffer.capacity() {
            return Err(DrlaError::InvalidConfig(format!(
                "min_num_steps_before_training ({}) exceeds the replay buffer capacity ({})",
                config.min_num_steps_before_training,
                buffer.capacity()
            ))
            .into());
        }

        let (mut expl_collector, mut eval_collector) =
            (PathCollector::new(expl_env), PathCollector::new(eval_env));
        if let Some(n) = config.max_num_epoch_paths_saved {
            expl_collector = expl_collector.max_num_epoch_paths_saved(n);
            eval_collector = eval_collector.max_num_epoch_paths_saved(n);
        }

        Ok(Self {
            config,
            expl_collector,
            eval_collector,
            buffer,
            state: RunState::default(),
            seed,
            variant: None,
            max_eval_return: f32::MIN,
        })
    }

    /// Constructs a trainer.
    ///
    /// The exploration environment is built with `seed` and the evaluation
    /// environment with `seed + 1`.
    pub fn build(
        config: TrainerConfig,
        env_config: &E::Config,
        replay_buffer_config: &SimpleReplayBufferConfig,
        seed: i64,
    ) -> Result<Self> {
        let expl_env = E::build(env_config, seed)?;
        let eval_env = E::build(env_config, seed + 1)?;
        let buffer = SimpleReplayBuffer::build(replay_buffer_config)?;
        Self::new(config, expl_env, eval_env, buffer, seed as u64)
    }

    /// Sets the snapshot of hyperparameters given to the recorder at the start of training.
    pub fn variant(mut self, variant: serde_json::Value) -> Self {
        self.variant = Some(variant);
        self
    }

    /// Counters of the run.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// The replay buffer.
    pub fn buffer(&self) -> &SimpleReplayBuffer {
        &self.buffer
    }

    /// The collector of exploration paths.
    pub fn expl_collector(&self) -> &PathCollector<E> {
        &self.expl_collector
    }

    /// The collector of evaluation paths.
    pub fn eval_collector(&self) -> &PathCollector<E> {
        &self.eval_collector
    }

    fn collect_and_insert<P: Policy<E>>(&mut self, policy: &mut P) -> Result<Vec<Path>> {
        let paths = self.expl_collector.collect_new_paths(
            policy,
            self.config.max_path_length,
            self.config.num_expl_steps_per_train_loop,
            self.config.discard_incomplete_expl_paths,
        )?;
        self.buffer.insert_paths(&paths)?;
        self.state.env_steps = self.expl_collector.num_steps_total();
        Ok(paths)
    }

    fn warm_up_with<P: Policy<E>>(&mut self, policy: &mut P) -> Result<()> {
        while self.buffer.size() < self.config.min_num_steps_before_training {
            let paths = self.collect_and_insert(policy)?;
            self.state.warmup_rounds += 1;
            if paths.iter().all(|p| p.is_empty()) {
                return Err(DrlaError::InvalidConfig(
                    "warm-up round collected no transition".into(),
                )
                .into());
            }
            info!(
                "Warm-up round {}: {} transitions in the replay buffer",
                self.state.warmup_rounds,
                self.buffer.size()
            );
        }
        self.expl_collector.end_epoch();
        Ok(())
    }

    /// Fills the replay buffer up to `min_num_steps_before_training` transitions.
    ///
    /// Data is collected in rounds of `num_expl_steps_per_train_loop` steps, with
    /// the agent or, if `random_warmup` is set, with a uniformly random policy.
    pub fn warm_up<A: Agent<E, SimpleReplayBuffer>>(&mut self, agent: &mut A) -> Result<()> {
        if self.config.random_warmup {
            let space = self.expl_collector.env().action_space();
            let mut policy = UniformRandomPolicy::new(space, self.seed);
            self.warm_up_with(&mut policy)
        } else {
            agent.train();
            self.warm_up_with(agent)
        }
    }

    /// Collects exploration data once and performs `num_trains_per_train_loop` updates.
    ///
    /// The diagnostics of the updates are stored in `storage`.
    pub fn train_loop<A: Agent<E, SimpleReplayBuffer>>(
        &mut self,
        agent: &mut A,
        storage: &mut RecordStorage,
    ) -> Result<()> {
        agent.train();
        self.collect_and_insert(agent)?;

        for _ in 0..self.config.num_trains_per_train_loop {
            let batch = self.buffer.batch(self.config.batch_size)?;
            let record = agent.update(batch)?;
            self.state.opt_steps += 1;
            storage.store(record);
        }
        Ok(())
    }

    /// Collects evaluation paths with the mode of the agent.
    ///
    /// The replay buffer is not modified.
    pub fn evaluate<A: Agent<E, SimpleReplayBuffer>>(&mut self, agent: &mut A) -> Result<Vec<Path>> {
        agent.eval();
        let paths = self.eval_collector.collect_new_paths(
            &mut MakeDeterministic::new(agent),
            self.config.max_path_length,
            self.config.num_eval_steps_per_epoch,
            self.config.discard_incomplete_eval_paths,
        );
        agent.train();
        paths
    }

    fn save_params<A: Agent<E, SimpleReplayBuffer>>(agent: &A, path: PathBuf) -> Result<()> {
        let files = agent.save_params(&path)?;
        info!("Saved the model in {:?} ({} files)", &path, files.len());
        Ok(())
    }

    fn save_checkpoints<A: Agent<E, SimpleReplayBuffer>>(
        &mut self,
        agent: &A,
        epoch: usize,
        eval_return: f32,
    ) -> Result<()> {
        let model_dir = match self.config.model_dir.as_ref() {
            Some(dir) => PathBuf::from(dir),
            None => return Ok(()),
        };

        if self.config.save_interval > 0 && (epoch + 1) % self.config.save_interval == 0 {
            Self::save_params(agent, model_dir.join(format!("{}", epoch)))?;
        }

        if eval_return.is_finite() && eval_return > self.max_eval_return {
            self.max_eval_return = eval_return;
            Self::save_params(agent, model_dir.join("best"))?;
        }
        Ok(())
    }

    /// Runs warm-up, then all remaining epochs.
    pub fn train<A, R>(&mut self, agent: &mut A, recorder: &mut R) -> Result<RunState>
    where
        A: Agent<E, SimpleReplayBuffer>,
        R: Recorder + ?Sized,
    {
        if let Some(variant) = self.variant.as_ref() {
            recorder.log_variant(variant)?;
        }

        let timer_total = SystemTime::now();
        self.warm_up(agent)?;

        let mut storage = RecordStorage::new();

        while self.state.epoch < self.config.num_epochs {
            let epoch = self.state.epoch;
            let timer_epoch = SystemTime::now();
            info!("Epoch {} starts", epoch);

            for _ in 0..self.config.num_train_loops_per_epoch {
                self.train_loop(agent, &mut storage)?;
            }
            self.evaluate(agent)?;

            let expl_record = self.expl_collector.diagnostics();
            let eval_record = self.eval_collector.diagnostics();
            let eval_return = eval_record.get_scalar("Average Returns")?;

            let mut record = Record::from_scalar("Epoch", epoch as f32);
            record.merge_inplace(self.buffer.diagnostics());
            record.merge_inplace(storage.aggregate().with_prefix("trainer/"));
            record.merge_inplace(expl_record.with_prefix("exploration/"));
            record.merge_inplace(eval_record.with_prefix("evaluation/"));
            record.insert("time/epoch (s)", Scalar(timer_epoch.elapsed()?.as_secs_f32()));
            record.insert("time/total (s)", Scalar(timer_total.elapsed()?.as_secs_f32()));
            record.insert("time/env steps", Scalar(self.state.env_steps as f32));
            record.insert("time/training steps", Scalar(self.state.opt_steps as f32));
            record.insert("time/warmup rounds", Scalar(self.state.warmup_rounds as f32));
            recorder.write(record)?;

            self.save_checkpoints(agent, epoch, eval_return)?;

            if !eval_return.is_finite() {
                warn!("Epoch {}: no complete evaluation path", epoch);
            }
            info!(
                "Epoch {} done, eval return = {}, env steps = {}, opt steps = {}",
                epoch, eval_return, self.state.env_steps, self.state.opt_steps
            );

            self.expl_collector.end_epoch();
            self.eval_collector.end_epoch();
            self.state.epoch += 1;
        }

        Ok(self.state)
    }
}

//! Configuration of [`Trainer`](super::Trainer).
use crate::error::DrlaError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Trainer`](super::Trainer).
///
/// The default values are those of the pendulum swing-up demo.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrainerConfig {
    /// The number of epochs.
    pub num_epochs: usize,

    /// The number of transitions in a batch given to an update.
    pub batch_size: usize,

    /// The maximum length of a path in both exploration and evaluation.
    pub max_path_length: usize,

    /// Evaluation steps collected at the end of every epoch.
    pub num_eval_steps_per_epoch: usize,

    /// Exploration steps collected in every train loop, and in every warm-up round.
    pub num_expl_steps_per_train_loop: usize,

    /// Updates performed in every train loop.
    pub num_trains_per_train_loop: usize,

    /// Train loops in an epoch.
    pub num_train_loops_per_epoch: usize,

    /// Transitions the replay buffer must hold before the first update.
    pub min_num_steps_before_training: usize,

    /// Drops exploration paths cut short by the step budget.
    pub discard_incomplete_expl_paths: bool,

    /// Drops evaluation paths cut short by the step budget.
    pub discard_incomplete_eval_paths: bool,

    /// Collects warm-up data with a uniformly random policy instead of the agent.
    pub random_warmup: bool,

    /// The number of recent paths of an epoch used for diagnostics.
    pub max_num_epoch_paths_saved: Option<usize>,

    /// Where to save the parameters of the agent.
    pub model_dir: Option<String>,

    /// Interval of saving the parameters in epochs. `0` disables it.
    pub save_interval: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            num_epochs: 20,
            batch_size: 512,
            max_path_length: 200,
            num_eval_steps_per_epoch: 1000,
            num_expl_steps_per_train_loop: 200,
            num_trains_per_train_loop: 200,
            num_train_loops_per_epoch: 50,
            min_num_steps_before_training: 1000,
            discard_incomplete_expl_paths: false,
            discard_incomplete_eval_paths: true,
            random_warmup: false,
            max_num_epoch_paths_saved: None,
            model_dir: None,
            save_interval: 0,
        }
    }
}

impl TrainerConfig {
    /// Sets the number of epochs.
    pub fn num_epochs(mut self, v: usize) -> Self {
        self.num_epochs = v;
        self
    }

    /// Sets the batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the maximum length of paths.
    pub fn max_path_length(mut self, v: usize) -> Self {
        self.max_path_length = v;
        self
    }

    /// Sets the number of evaluation steps per epoch.
    pub fn num_eval_steps_per_epoch(mut self, v: usize) -> Self {
        self.num_eval_steps_per_epoch = v;
        self
    }

    /// Sets the number of exploration steps per train loop.
    pub fn num_expl_steps_per_train_loop(mut self, v: usize) -> Self {
        self.num_expl_steps_per_train_loop = v;
        self
    }

    /// Sets the number of updates per train loop.
    pub fn num_trains_per_train_loop(mut self, v: usize) -> Self {
        self.num_trains_per_train_loop = v;
        self
    }

    /// Sets the number of train loops per epoch.
    pub fn num_train_loops_per_epoch(mut self, v: usize) -> Self {
        self.num_train_loops_per_epoch = v;
        self
    }

    /// Sets the warm-up size in transitions.
    pub fn min_num_steps_before_training(mut self, v: usize) -> Self {
        self.min_num_steps_before_training = v;
        self
    }

    /// Drops incomplete exploration paths.
    pub fn discard_incomplete_expl_paths(mut self, v: bool) -> Self {
        self.discard_incomplete_expl_paths = v;
        self
    }

    /// Drops incomplete evaluation paths.
    pub fn discard_incomplete_eval_paths(mut self, v: bool) -> Self {
        self.discard_incomplete_eval_paths = v;
        self
    }

    /// Uses a uniformly random policy for warm-up.
    pub fn random_warmup(mut self, v: bool) -> Self {
        self.random_warmup = v;
        self
    }

    /// Sets the number of paths kept for diagnostics.
    pub fn max_num_epoch_paths_saved(mut self, v: usize) -> Self {
        self.max_num_epoch_paths_saved = Some(v);
        self
    }

    /// Sets the directory where parameters are saved.
    pub fn model_dir(mut self, v: impl Into<String>) -> Self {
        self.model_dir = Some(v.into());
        self
    }

    /// Sets the interval of saving parameters in epochs.
    pub fn save_interval(mut self, v: usize) -> Self {
        self.save_interval = v;
        self
    }

    /// Checks the ranges of the values.
    pub fn validate(&self) -> Result<(), DrlaError> {
        let check = |ok: bool, msg: &str| match ok {
            true => Ok(()),
            false => Err(DrlaError::InvalidConfig(msg.to_string())),
        };
        check(self.batch_size > 0, "batch_size must be > 0")?;
        check(self.max_path_length > 0, "max_path_length must be > 0")?;
        check(
            self.min_num_steps_before_training == 0 || self.num_expl_steps_per_train_loop > 0,
            "warm-up requires num_expl_steps_per_train_loop > 0",
        )?;
        check(
            self.save_interval == 0 || self.model_dir.is_some(),
            "save_interval requires model_dir",
        )?;
        Ok(())
    }

    /// Constructs [`TrainerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`TrainerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_trainer_config() -> Result<()> {
        let config = TrainerConfig::default()
            .num_epochs(3)
            .batch_size(64)
            .model_dir("some/directory")
            .save_interval(1);

        let dir = TempDir::new("trainer_config")?;
        let path = dir.path().join("trainer_config.yaml");
        config.save(&path)?;
        let config_ = TrainerConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }

    #[test]
    fn test_validate() {
        assert!(TrainerConfig::default().validate().is_ok());
        assert!(TrainerConfig::default().batch_size(0).validate().is_err());
        assert!(TrainerConfig::default().max_path_length(0).validate().is_err());
        assert!(TrainerConfig::default().save_interval(5).validate().is_err());
    }
}

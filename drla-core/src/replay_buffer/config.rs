//! Configuration of [SimpleReplayBuffer](super::SimpleReplayBuffer).
use crate::error::DrlaError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [SimpleReplayBuffer](super::SimpleReplayBuffer).
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct SimpleReplayBufferConfig {
    /// The maximum number of transitions held by the buffer.
    pub capacity: usize,

    /// Dimension of observations.
    pub obs_dim: usize,

    /// Dimension of actions.
    pub act_dim: usize,

    /// Seed of the random number generator used for sampling.
    pub seed: u64,

    /// If `true`, the environment info map of every transition is kept.
    pub store_env_infos: bool,
}

impl Default for SimpleReplayBufferConfig {
    fn default() -> Self {
        Self {
            capacity: 10000,
            obs_dim: 1,
            act_dim: 1,
            seed: 42,
            store_env_infos: false,
        }
    }
}

impl SimpleReplayBufferConfig {
    /// Sets the capacity of the replay buffer.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the dimension of observations.
    pub fn obs_dim(mut self, obs_dim: usize) -> Self {
        self.obs_dim = obs_dim;
        self
    }

    /// Sets the dimension of actions.
    pub fn act_dim(mut self, act_dim: usize) -> Self {
        self.act_dim = act_dim;
        self
    }

    /// Sets the random seed for sampling.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Keeps environment info maps in the buffer.
    pub fn store_env_infos(mut self, v: bool) -> Self {
        self.store_env_infos = v;
        self
    }

    /// Checks the ranges of the values.
    pub fn validate(&self) -> Result<(), DrlaError> {
        if self.capacity == 0 {
            return Err(DrlaError::InvalidConfig("capacity must be > 0".into()));
        }
        if self.obs_dim == 0 || self.act_dim == 0 {
            return Err(DrlaError::InvalidConfig(
                "obs_dim and act_dim must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Constructs [SimpleReplayBufferConfig] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [SimpleReplayBufferConfig].
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
    fn test_serde_simple_replay_buffer_config() -> Result<()> {
        let config = SimpleReplayBufferConfig::default()
            .capacity(50_000)
            .obs_dim(3)
            .act_dim(1)
            .seed(7);

        let dir = TempDir::new("simple_replay_buffer_config")?;
        let path = dir.path().join("simple_replay_buffer_config.yaml");
        config.save(&path)?;
        let config_ = SimpleReplayBufferConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }

    #[test]
    fn test_validate() {
        assert!(SimpleReplayBufferConfig::default().validate().is_ok());
        assert!(matches!(
            SimpleReplayBufferConfig::default().capacity(0).validate(),
            Err(DrlaError::InvalidConfig(_))
        ));
    }
}

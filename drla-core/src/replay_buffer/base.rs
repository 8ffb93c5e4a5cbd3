//! Simple ring replay buffer.
use super::{SimpleReplayBufferConfig, Transition, TransitionBatch};
use crate::{
    collector::Path,
    error::DrlaError,
    record::{Record, RecordValue},
    ExperienceBufferBase, ReplayBufferBase,
};
use anyhow::Result;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// A fixed-capacity ring buffer of transitions.
///
/// The buffer owns copies of all transitions it holds. Writes advance a cursor
/// that wraps at capacity; once the buffer is full every insertion evicts the
/// oldest resident transition.
pub struct SimpleReplayBuffer {
    capacity: usize,
    obs_dim: usize,
    act_dim: usize,
    i: usize,
    size: usize,
    obs: Vec<f32>,
    act: Vec<f32>,
    next_obs: Vec<f32>,
    reward: Vec<f32>,
    is_terminated: Vec<i8>,
    env_infos: Option<Vec<Record>>,
    rng: StdRng,
}

impl SimpleReplayBuffer {
    /// Capacity of the buffer.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The number of valid transitions, `min(capacity, total inserted)`.
    pub fn size(&self) -> usize {
        self.size
    }

    fn check_shape(&self, tr: &Transition) -> Result<(), DrlaError> {
        if tr.obs.len() != self.obs_dim {
            return Err(DrlaError::shape_mismatch("obs", self.obs_dim, tr.obs.len()));
        }
        if tr.next_obs.len() != self.obs_dim {
            return Err(DrlaError::shape_mismatch(
                "next_obs",
                self.obs_dim,
                tr.next_obs.len(),
            ));
        }
        if tr.act.len() != self.act_dim {
            return Err(DrlaError::shape_mismatch("act", self.act_dim, tr.act.len()));
        }
        Ok(())
    }

    #[inline]
    fn write(&mut self, tr: &Transition) {
        let (i, od, ad) = (self.i, self.obs_dim, self.act_dim);
        self.obs[i * od..(i + 1) * od].copy_from_slice(&tr.obs);
        self.next_obs[i * od..(i + 1) * od].copy_from_slice(&tr.next_obs);
        self.act[i * ad..(i + 1) * ad].copy_from_slice(&tr.act);
        self.reward[i] = tr.reward;
        self.is_terminated[i] = tr.is_terminated as i8;
        if let Some(env_infos) = self.env_infos.as_mut() {
            env_infos[i] = tr.env_info.clone();
        }

        self.i = (self.i + 1) % self.capacity;
        self.size = (self.size + 1).min(self.capacity);
    }

    /// Appends every transition of `path`, in order.
    ///
    /// The whole path is checked against the configured dimensions before
    /// anything is written, so a path with a malformed transition leaves the
    /// buffer untouched. Inserting an empty path is a no-op.
    pub fn insert(&mut self, path: &Path) -> Result<()> {
        for tr in path.transitions.iter() {
            self.check_shape(tr)?;
        }
        for tr in path.transitions.iter() {
            self.write(tr);
        }
        Ok(())
    }

    /// Inserts paths in order.
    pub fn insert_paths(&mut self, paths: &[Path]) -> Result<()> {
        for path in paths.iter() {
            self.insert(path)?;
        }
        Ok(())
    }

    /// Returns the `i`-th oldest resident transition.
    ///
    /// The agent info map is not stored and is always empty. The environment
    /// info map is empty unless `store_env_infos` is set.
    pub fn get(&self, i: usize) -> Option<Transition> {
        if i >= self.size {
            return None;
        }
        let start = if self.size < self.capacity { 0 } else { self.i };
        let j = (start + i) % self.capacity;
        let (od, ad) = (self.obs_dim, self.act_dim);

        Some(Transition {
            obs: self.obs[j * od..(j + 1) * od].to_vec(),
            act: self.act[j * ad..(j + 1) * ad].to_vec(),
            reward: self.reward[j],
            next_obs: self.next_obs[j * od..(j + 1) * od].to_vec(),
            is_terminated: self.is_terminated[j] == 1,
            env_info: self
                .env_infos
                .as_ref()
                .map(|infos| infos[j].clone())
                .unwrap_or_default(),
            agent_info: Record::empty(),
        })
    }

    /// Returns `replay_buffer/size`.
    pub fn diagnostics(&self) -> Record {
        Record::from_slice(&[(
            "replay_buffer/size",
            RecordValue::Scalar(self.size as f32),
        )])
    }

    fn gather(src: &[f32], dim: usize, ixs: &[usize]) -> Vec<f32> {
        let mut out = Vec::with_capacity(ixs.len() * dim);
        for &ix in ixs.iter() {
            out.extend_from_slice(&src[ix * dim..(ix + 1) * dim]);
        }
        out
    }
}

impl ExperienceBufferBase for SimpleReplayBuffer {
    type Item = Transition;

    fn push(&mut self, tr: Self::Item) -> Result<()> {
        self.check_shape(&tr)?;
        self.write(&tr);
        Ok(())
    }

    fn len(&self) -> usize {
        self.size
    }
}

impl ReplayBufferBase for SimpleReplayBuffer {
    type Config = SimpleReplayBufferConfig;
    type Batch = TransitionBatch;

    fn build(config: &Self::Config) -> Result<Self> {
        config.validate()?;
        let capacity = config.capacity;

        Ok(Self {
            capacity,
            obs_dim: config.obs_dim,
            act_dim: config.act_dim,
            i: 0,
            size: 0,
            obs: vec![0.; capacity * config.obs_dim],
            act: vec![0.; capacity * config.act_dim],
            next_obs: vec![0.; capacity * config.obs_dim],
            reward: vec![0.; capacity],
            is_terminated: vec![0; capacity],
            env_infos: match config.store_env_infos {
                true => Some(vec![Record::empty(); capacity]),
                false => None,
            },
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    /// Samples `size` transitions uniformly with replacement.
    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        if self.size == 0 {
            return Err(DrlaError::InsufficientData {
                requested: size,
                size: 0,
            }
            .into());
        }

        let ixs = (0..size)
            .map(|_| self.rng.gen_range(0..self.size))
            .collect::<Vec<_>>();

        Ok(TransitionBatch {
            obs: Self::gather(&self.obs, self.obs_dim, &ixs),
            act: Self::gather(&self.act, self.act_dim, &ixs),
            next_obs: Self::gather(&self.next_obs, self.obs_dim, &ixs),
            reward: ixs.iter().map(|&ix| self.reward[ix]).collect(),
            is_terminated: ixs.iter().map(|&ix| self.is_terminated[ix]).collect(),
            obs_dim: self.obs_dim,
            act_dim: self.act_dim,
            ix_sample: ixs,
        })
    }
}

//! Soft actor-critic implemented with [candle](https://crates.io/crates/candle-core).
//!
//! The agent [`sac::Sac`] implements [`drla_core::Agent`] and consumes
//! [`TransitionBatch`](drla_core::replay_buffer::TransitionBatch)es sampled
//! from [`SimpleReplayBuffer`](drla_core::replay_buffer::SimpleReplayBuffer).
pub mod mlp;
pub mod model;
pub mod opt;
pub mod sac;
pub mod util;
use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
/// Device for using candle.
///
/// This enum is added because [`candle_core::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    Cpu,

    /// The main GPU device.
    Cuda(usize),
}

impl Device {
    /// Returns the candle device.
    ///
    /// Fails if the CUDA device cannot be opened, e.g., when the crate is
    /// built without the `cuda` feature.
    pub fn to_candle(self) -> Result<candle_core::Device> {
        match self {
            Self::Cpu => Ok(candle_core::Device::Cpu),
            Self::Cuda(n) => Ok(candle_core::Device::new_cuda(n)?),
        }
    }
}

impl Default for Device {
    fn default() -> Self {
        Self::Cpu
    }
}

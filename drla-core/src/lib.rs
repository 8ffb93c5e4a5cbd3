#![warn(missing_docs)]
//! Core of an off-policy reinforcement learning harness.
//!
//! This crate defines the collaborators of the training loop, [`Env`],
//! [`Policy`] and [`Agent`], together with the data flowing between them:
//!
//! * [`replay_buffer`] - a fixed-capacity ring buffer of transitions,
//! * [`collector`] - rollouts producing paths from an environment and a policy,
//! * [`Trainer`] - the scheduler interleaving warm-up, exploration, updates
//!   and evaluation over epochs,
//! * [`record`] - metrics and their sinks.
pub mod collector;
pub mod dummy;
pub mod error;
pub mod record;
pub mod replay_buffer;
pub mod space;
pub mod util;

mod base;
pub use base::{
    Act, Agent, Env, ExperienceBufferBase, MakeDeterministic, Obs, Policy, ReplayBufferBase,
    Step, StochasticPolicy, UniformRandomPolicy, VecAct, VecObs,
};

mod trainer;
pub use trainer::{RunState, Trainer, TrainerConfig};

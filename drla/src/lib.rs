//! An off-policy deep reinforcement learning harness in Rust.
//!
//! drla consists of the following crates:
//!
//! * [`drla_core`] provides the traits of environments, policies and agents,
//!   the replay buffer, the path collector, records and the trainer running
//!   the batch off-policy training loop.
//! * [`drla_candle_agent`] implements soft actor-critic (SAC) with
//!   [candle](https://crates.io/crates/candle-core).
//! * [`drla_logger`] has sinks of epoch records: CSV, plain text and
//!   TensorBoard, combined under an experiment log directory.
//! * [`drla_classic_env`] has the pendulum swing-up task.
//!
//! This crate ties them together in [`util`], used by the `sac_pendulum` example.
pub use drla_candle_agent as candle_agent;
pub use drla_classic_env as classic_env;
pub use drla_core as core;
pub use drla_logger as logger;
pub mod util;

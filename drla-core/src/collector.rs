//! Rollout collection.
//!
//! A [`PathCollector`] drives an environment with a policy and produces
//! [`Path`]s, ordered sequences of transitions from one reset to either
//! termination or a length cap.
mod path;
mod path_collector;
pub use path::Path;
pub use path_collector::{rollout, PathCollector};

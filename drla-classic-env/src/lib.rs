//! Classic continuous-control environments implementing [`drla_core::Env`].
mod pendulum;
pub use pendulum::{Pendulum, PendulumConfig};

//! Soft actor-critic (SAC) agent.
//!
//! One call of [`Agent::update`](drla_core::Agent::update) performs:
//!
//! 1. Reparameterized sampling of actions at the observations of the batch and,
//!    with [`EntCoefMode::Auto`], the loss of the entropy coefficient.
//! 2. The bootstrap target shared by all critics,
//!    `reward_scale * r + (1 - terminal) * gamma * (min_i Q_tgt_i(o', a') - alpha * log pi(a'|o'))`,
//!    with `a'` sampled fresh from the current policy at the next observations.
//! 3. The policy loss `mean(alpha * log pi(a|o) - min_i Q_i(o, a))` and the
//!    squared errors of the critics.
//! 4. Gradient steps of the entropy coefficient, the policy and the critics,
//!    taken only if every loss is finite.
//! 5. Polyak averaging of the target critics.
mod actor;
mod base;
mod config;
mod critic;
mod ent_coef;
pub use actor::{GaussianActor, GaussianActorConfig};
pub use base::Sac;
pub use config::SacConfig;
pub use critic::{MultiCritic, MultiCriticConfig};
pub use ent_coef::{EntCoef, EntCoefMode};

//! Policy.
use super::Env;
use crate::{record::Record, space::BoxSpace};
use anyhow::Result;
use rand::{rngs::StdRng, SeedableRng};

/// A policy on an environment.
///
/// Policy is a mapping from an observation to an action.
/// The mapping can be either of deterministic or stochastic.
pub trait Policy<E: Env> {
    /// Samples an action given an observation.
    fn sample(&mut self, obs: &E::Obs) -> Result<E::Act>;

    /// Samples an action and returns auxiliary values of the policy, e.g.
    /// parameters of the action distribution, as an agent info map.
    ///
    /// The default implementation returns an empty record.
    fn sample_with_record(&mut self, obs: &E::Obs) -> Result<(E::Act, Record)> {
        Ok((self.sample(obs)?, Record::empty()))
    }

    /// Called by the rollout collector at the beginning of every path.
    fn reset(&mut self) {}
}

/// A policy defining an action distribution whose mode can be queried.
pub trait StochasticPolicy<E: Env>: Policy<E> {
    /// Returns the mode of the action distribution given an observation.
    fn mode(&mut self, obs: &E::Obs) -> Result<E::Act>;

    /// Returns the mode together with the same agent info map as
    /// [`Policy::sample_with_record`].
    ///
    /// The default implementation returns an empty record.
    fn mode_with_record(&mut self, obs: &E::Obs) -> Result<(E::Act, Record)> {
        Ok((self.mode(obs)?, Record::empty()))
    }
}

/// Borrows a [`StochasticPolicy`] and always answers with its mode.
///
/// This is the policy used for evaluation rollouts.
pub struct MakeDeterministic<'a, P> {
    policy: &'a mut P,
}

impl<'a, P> MakeDeterministic<'a, P> {
    /// Wraps a stochastic policy.
    pub fn new(policy: &'a mut P) -> Self {
        Self { policy }
    }
}

impl<'a, E, P> Policy<E> for MakeDeterministic<'a, P>
where
    E: Env,
    P: StochasticPolicy<E>,
{
    fn sample(&mut self, obs: &E::Obs) -> Result<E::Act> {
        self.policy.mode(obs)
    }

    fn sample_with_record(&mut self, obs: &E::Obs) -> Result<(E::Act, Record)> {
        self.policy.mode_with_record(obs)
    }

    fn reset(&mut self) {
        self.policy.reset()
    }
}

/// Samples actions uniformly inside an action space.
pub struct UniformRandomPolicy {
    space: BoxSpace,
    rng: StdRng,
}

impl UniformRandomPolicy {
    /// Creates a policy sampling from `space`.
    pub fn new(space: BoxSpace, seed: u64) -> Self {
        Self {
            space,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<E: Env> Policy<E> for UniformRandomPolicy {
    fn sample(&mut self, _obs: &E::Obs) -> Result<E::Act> {
        Ok(self.space.sample(&mut self.rng).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dummy::{DummyAgent, DummyEnv},
        VecObs,
    };

    #[test]
    fn test_deterministic_keeps_agent_info() -> Result<()> {
        let mut agent = DummyAgent::new(2);
        let obs = VecObs(vec![0.0, 0.0]);
        let mut policy = MakeDeterministic::new(&mut agent);

        let (act, info) = Policy::<DummyEnv>::sample_with_record(&mut policy, &obs)?;
        assert_eq!(act.0, vec![0.0, 0.0]);
        assert_eq!(info.get_array1("mean")?, vec![0.0, 0.0]);
        Ok(())
    }
}

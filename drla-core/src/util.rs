//! Utilities for interaction of agents and environments.
use crate::{
    collector::rollout,
    error::DrlaError,
    record::{Record, RecordValue, Recorder},
    Env, Policy,
};
use anyhow::Result;
use log::info;

/// Returns [`DrlaError::NumericDivergence`] if `value` is not finite.
pub fn ensure_finite(name: &str, value: f32) -> Result<f32, DrlaError> {
    match value.is_finite() {
        true => Ok(value),
        false => Err(DrlaError::NumericDivergence(format!(
            "{} is {}",
            name, value
        ))),
    }
}

/// Runs `n_episodes` rollouts with a policy and returns their returns.
///
/// The return and the length of every episode are written to `recorder`.
pub fn eval_with_recorder<E, P, R>(
    env: &mut E,
    policy: &mut P,
    n_episodes: usize,
    max_path_length: usize,
    recorder: &mut R,
) -> Result<Vec<f32>>
where
    E: Env,
    P: Policy<E>,
    R: Recorder + ?Sized,
{
    let mut rs = Vec::with_capacity(n_episodes);

    for episode in 0..n_episodes {
        let path = rollout(env, policy, max_path_length)?;
        let r_total = path.returns();
        info!(
            "Episode {:?}, {:?} steps, return = {:?}",
            episode,
            path.len(),
            r_total
        );
        recorder.write(Record::from_slice(&[
            ("episode", RecordValue::Scalar(episode as _)),
            ("return", RecordValue::Scalar(r_total)),
            ("path length", RecordValue::Scalar(path.len() as _)),
        ]))?;
        rs.push(r_total);
    }

    Ok(rs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dummy::{DummyAgent, DummyEnv, DummyEnvConfig},
        record::BufferedRecorder,
    };

    #[test]
    fn test_ensure_finite() {
        assert_eq!(ensure_finite("loss", 1.5), Ok(1.5));
        assert!(matches!(
            ensure_finite("loss", f32::NAN),
            Err(DrlaError::NumericDivergence(_))
        ));
        assert!(ensure_finite("loss", f32::INFINITY).is_err());
    }

    #[test]
    fn test_eval_with_recorder() -> Result<()> {
        let config = DummyEnvConfig {
            terminate_at: Some(4),
            ..Default::default()
        };
        let mut env = DummyEnv::build(&config, 0)?;
        let mut agent = DummyAgent::new(1);
        let mut recorder = BufferedRecorder::new();

        let rs = eval_with_recorder(&mut env, &mut agent, 3, 10, &mut recorder)?;
        assert_eq!(rs, vec![4.0, 4.0, 4.0]);
        assert_eq!(recorder.records().len(), 3);
        assert_eq!(env.n_resets(), 3);
        Ok(())
    }
}

//! Collection of paths from an environment.
use super::Path;
use crate::{
    error::DrlaError,
    record::{stats, Record, RecordValue},
    replay_buffer::Transition,
    Env, Policy,
};
use anyhow::Result;
use log::{debug, trace};
use std::collections::VecDeque;

/// Rolls out `policy` from a fresh reset until termination or `max_path_length` steps.
///
/// Errors of the environment are not retried; they are returned as
/// [`DrlaError::EnvironmentFault`].
pub fn rollout<E, P>(env: &mut E, policy: &mut P, max_path_length: usize) -> Result<Path>
where
    E: Env,
    P: Policy<E>,
{
    let mut transitions = Vec::with_capacity(max_path_length);
    let mut obs = env
        .reset()
        .map_err(|e| DrlaError::EnvironmentFault(format!("reset: {:#}", e)))?;
    policy.reset();

    while transitions.len() < max_path_length {
        let (act, agent_info) = policy.sample_with_record(&obs)?;
        let step = env
            .step(&act)
            .map_err(|e| DrlaError::EnvironmentFault(format!("step: {:#}", e)))?;

        transitions.push(Transition {
            obs: obs.as_ref().to_vec(),
            act: step.act.as_ref().to_vec(),
            reward: step.reward,
            next_obs: step.obs.as_ref().to_vec(),
            is_terminated: step.is_terminated,
            env_info: step.info,
            agent_info,
        });

        if step.is_terminated {
            break;
        }
        obs = step.obs;
    }

    trace!("Rolled out a path of length {}", transitions.len());
    Ok(Path::from(transitions))
}

/// Drives one environment and keeps the statistics of the collected paths.
///
/// Exploration and evaluation each own a collector with their own environment.
pub struct PathCollector<E: Env> {
    env: E,
    max_num_epoch_paths_saved: Option<usize>,
    epoch_paths: VecDeque<Path>,
    num_steps_total: usize,
    num_paths_total: usize,
}

impl<E: Env> PathCollector<E> {
    /// Creates a collector driving `env`.
    pub fn new(env: E) -> Self {
        Self {
            env,
            max_num_epoch_paths_saved: None,
            epoch_paths: VecDeque::new(),
            num_steps_total: 0,
            num_paths_total: 0,
        }
    }

    /// Keeps at most `n` of the most recent paths of an epoch for diagnostics.
    pub fn max_num_epoch_paths_saved(mut self, n: usize) -> Self {
        self.max_num_epoch_paths_saved = Some(n);
        self
    }

    /// Collects paths until `num_steps` steps have been taken in total.
    ///
    /// Each path is capped at `max_path_length` steps, and the last one at the
    /// remaining step budget. If `discard_incomplete_paths` is set, a last path
    /// cut short by the budget, rather than by termination or the length cap,
    /// is dropped and the collection ends.
    pub fn collect_new_paths<P: Policy<E>>(
        &mut self,
        policy: &mut P,
        max_path_length: usize,
        num_steps: usize,
        discard_incomplete_paths: bool,
    ) -> Result<Vec<Path>> {
        if max_path_length == 0 {
            return Err(DrlaError::InvalidConfig("max_path_length must be > 0".into()).into());
        }

        let mut paths = vec![];
        let mut num_steps_collected = 0;

        while num_steps_collected < num_steps {
            let max_len_this_loop = max_path_length.min(num_steps - num_steps_collected);
            let path = rollout(&mut self.env, policy, max_len_this_loop)?;
            let path_len = path.len();

            if path_len != max_path_length && !path.is_terminated() && discard_incomplete_paths
            {
                debug!("Discarded an incomplete path of length {}", path_len);
                break;
            }

            num_steps_collected += path_len;
            paths.push(path);
        }

        self.num_paths_total += paths.len();
        self.num_steps_total += num_steps_collected;
        for path in paths.iter() {
            self.epoch_paths.push_back(path.clone());
        }
        if let Some(n) = self.max_num_epoch_paths_saved {
            while self.epoch_paths.len() > n {
                self.epoch_paths.pop_front();
            }
        }

        Ok(paths)
    }

    /// Paths collected since the last call of [`PathCollector::end_epoch`].
    pub fn epoch_paths(&self) -> impl Iterator<Item = &Path> {
        self.epoch_paths.iter()
    }

    /// Clears the paths of the epoch.
    pub fn end_epoch(&mut self) {
        self.epoch_paths.clear();
    }

    /// Total number of steps collected over the run.
    pub fn num_steps_total(&self) -> usize {
        self.num_steps_total
    }

    /// Total number of paths collected over the run.
    pub fn num_paths_total(&self) -> usize {
        self.num_paths_total
    }

    /// The environment driven by the collector.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Statistics of the run and of the paths of the current epoch.
    pub fn diagnostics(&self) -> Record {
        let lengths = self
            .epoch_paths
            .iter()
            .map(|p| p.len() as f32)
            .collect::<Vec<_>>();
        let returns = self
            .epoch_paths
            .iter()
            .map(|p| p.returns())
            .collect::<Vec<_>>();
        let rewards = self
            .epoch_paths
            .iter()
            .flat_map(|p| p.rewards())
            .collect::<Vec<_>>();
        let actions = self
            .epoch_paths
            .iter()
            .flat_map(|p| p.actions())
            .collect::<Vec<_>>();
        let average_returns = match returns.is_empty() {
            true => f32::NAN,
            false => returns.iter().sum::<f32>() / returns.len() as f32,
        };

        let mut record = Record::from_slice(&[
            (
                "num steps total",
                RecordValue::Scalar(self.num_steps_total as f32),
            ),
            (
                "num paths total",
                RecordValue::Scalar(self.num_paths_total as f32),
            ),
            (
                "Num Paths",
                RecordValue::Scalar(self.epoch_paths.len() as f32),
            ),
            ("Average Returns", RecordValue::Scalar(average_returns)),
        ]);
        record.merge_inplace(stats("path length", &lengths));
        record.merge_inplace(stats("Rewards", &rewards));
        record.merge_inplace(stats("Returns", &returns));
        record.merge_inplace(stats("Actions", &actions));
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dummy::{DummyAgent, DummyEnv, DummyEnvConfig},
        MakeDeterministic,
    };

    fn collector(terminate_at: Option<usize>) -> PathCollector<DummyEnv> {
        let config = DummyEnvConfig {
            terminate_at,
            ..Default::default()
        };
        PathCollector::new(DummyEnv::build(&config, 0).unwrap())
    }

    #[test]
    fn test_rollout_respects_length_cap() -> Result<()> {
        let mut env = DummyEnv::build(&DummyEnvConfig::default(), 0)?;
        let mut agent = DummyAgent::new(1);
        let path = rollout(&mut env, &mut agent, 7)?;
        assert_eq!(path.len(), 7);
        assert!(!path.is_terminated());
        assert_eq!(path.transitions[0].obs, vec![0.0, 0.0]);
        assert_eq!(path.transitions[6].next_obs, vec![7.0, 7.0]);
        assert!(path.transitions[0].agent_info.get_array1("mean").is_ok());
        Ok(())
    }

    #[test]
    fn test_terminal_only_on_last_transition() -> Result<()> {
        let mut collector = collector(Some(3));
        let mut agent = DummyAgent::new(1);
        let paths = collector.collect_new_paths(&mut agent, 10, 9, false)?;
        assert_eq!(paths.len(), 3);
        for path in paths.iter() {
            assert!(path.len() <= 10);
            assert!(path.is_terminated());
            let n = path.len();
            assert!(path.transitions[..n - 1].iter().all(|tr| !tr.is_terminated));
        }
        Ok(())
    }

    #[test]
    fn test_last_path_is_cut_by_budget() -> Result<()> {
        let mut collector = collector(None);
        let mut agent = DummyAgent::new(1);
        let paths = collector.collect_new_paths(&mut agent, 4, 10, false)?;
        let lengths = paths.iter().map(|p| p.len()).collect::<Vec<_>>();
        assert_eq!(lengths, vec![4, 4, 2]);
        assert_eq!(collector.num_steps_total(), 10);
        Ok(())
    }

    #[test]
    fn test_discard_incomplete_path() -> Result<()> {
        let mut collector = collector(None);
        let mut agent = DummyAgent::new(1);
        let paths = collector.collect_new_paths(&mut agent, 4, 10, true)?;
        let lengths = paths.iter().map(|p| p.len()).collect::<Vec<_>>();
        assert_eq!(lengths, vec![4, 4]);
        assert_eq!(collector.num_steps_total(), 8);
        assert_eq!(collector.num_paths_total(), 2);
        Ok(())
    }

    #[test]
    fn test_terminated_short_path_is_kept_when_discarding() -> Result<()> {
        let mut collector = collector(Some(2));
        let mut agent = DummyAgent::new(1);
        let paths = collector.collect_new_paths(&mut agent, 4, 5, true)?;
        let lengths = paths.iter().map(|p| p.len()).collect::<Vec<_>>();
        // The third path is cut at one step by the budget and dropped.
        assert_eq!(lengths, vec![2, 2]);
        Ok(())
    }

    #[test]
    fn test_deterministic_policy() -> Result<()> {
        let mut collector = collector(None);
        let mut agent = DummyAgent::new(1);
        let mut policy = MakeDeterministic::new(&mut agent);
        let paths = collector.collect_new_paths(&mut policy, 3, 3, true)?;
        assert!(paths[0].transitions.iter().all(|tr| tr.act == vec![0.0]));
        Ok(())
    }

    #[test]
    fn test_environment_fault() {
        let config = DummyEnvConfig {
            fail_at: Some(2),
            ..Default::default()
        };
        let mut collector = PathCollector::new(DummyEnv::build(&config, 0).unwrap());
        let mut agent = DummyAgent::new(1);
        let err = collector
            .collect_new_paths(&mut agent, 5, 5, false)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DrlaError>(),
            Some(DrlaError::EnvironmentFault(_))
        ));
    }

    #[test]
    fn test_diagnostics_and_end_epoch() -> Result<()> {
        let mut collector = collector(None).max_num_epoch_paths_saved(2);
        let mut agent = DummyAgent::new(1);
        collector.collect_new_paths(&mut agent, 3, 9, false)?;
        assert_eq!(collector.epoch_paths().count(), 2);

        let record = collector.diagnostics();
        assert_eq!(record.get_scalar("num steps total")?, 9.0);
        assert_eq!(record.get_scalar("num paths total")?, 3.0);
        assert_eq!(record.get_scalar("Num Paths")?, 2.0);
        assert_eq!(record.get_scalar("Returns Mean")?, 3.0);
        assert_eq!(record.get_scalar("Average Returns")?, 3.0);
        assert_eq!(record.get_scalar("path length Max")?, 3.0);
        assert_eq!(record.get_scalar("Actions Mean")?, 0.5);

        collector.end_epoch();
        assert_eq!(collector.epoch_paths().count(), 0);
        assert_eq!(collector.diagnostics().get_scalar("Num Paths")?, 0.0);
        Ok(())
    }
}

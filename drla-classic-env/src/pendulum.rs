use anyhow::Result;
use drla_core::{
    error::DrlaError,
    record::{Record, RecordValue},
    space::BoxSpace,
    Act, Env, Step, VecAct, VecObs,
};
use log::trace;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{
    f32::consts::PI,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Pendulum`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct PendulumConfig {
    /// Bound of the angular velocity.
    pub max_speed: f32,

    /// Torque applied for the action `1.0`.
    pub max_torque: f32,

    /// Time step of the integration.
    pub dt: f32,

    /// Gravity.
    pub g: f32,

    /// Mass.
    pub m: f32,

    /// Length.
    pub l: f32,
}

impl Default for PendulumConfig {
    fn default() -> Self {
        Self {
            max_speed: 8.0,
            max_torque: 2.0,
            dt: 0.05,
            g: 10.0,
            m: 1.0,
            l: 1.0,
        }
    }
}

impl PendulumConfig {
    /// Sets gravity.
    pub fn g(mut self, v: f32) -> Self {
        self.g = v;
        self
    }

    /// Sets the maximum torque.
    pub fn max_torque(mut self, v: f32) -> Self {
        self.max_torque = v;
        self
    }

    /// Checks the ranges of the values.
    pub fn validate(&self) -> Result<(), DrlaError> {
        let positive = [
            ("max_speed", self.max_speed),
            ("max_torque", self.max_torque),
            ("dt", self.dt),
            ("m", self.m),
            ("l", self.l),
        ];
        for (name, v) in positive.iter() {
            if v.is_nan() || *v <= 0.0 {
                return Err(DrlaError::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, v
                )));
            }
        }
        Ok(())
    }

    /// Constructs [`PendulumConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`PendulumConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

fn angle_normalize(x: f32) -> f32 {
    (x + PI).rem_euclid(2.0 * PI) - PI
}

/// The inverted pendulum swing-up task.
///
/// The observation is `[cos(theta), sin(theta), theta_dot]`. An action in
/// `[-1, 1]` is scaled by `max_torque`; actions out of the range are clipped.
/// The reward is `-(theta^2 + 0.1 * theta_dot^2 + 0.001 * u^2)` with `theta`
/// normalized into `[-pi, pi)` and `u` the applied torque. Episodes never
/// terminate.
pub struct Pendulum {
    config: PendulumConfig,
    rng: StdRng,
    th: f32,
    thdot: f32,
}

impl Pendulum {
    fn obs(&self) -> VecObs {
        VecObs(vec![self.th.cos(), self.th.sin(), self.thdot])
    }

    /// Angle and angular velocity.
    pub fn state(&self) -> (f32, f32) {
        (self.th, self.thdot)
    }
}

impl Env for Pendulum {
    type Config = PendulumConfig;
    type Obs = VecObs;
    type Act = VecAct;

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: config.clone(),
            rng: StdRng::seed_from_u64(seed as u64),
            th: 0.0,
            thdot: 0.0,
        })
    }

    fn reset(&mut self) -> Result<VecObs> {
        self.th = self.rng.gen_range(-PI..PI);
        self.thdot = self.rng.gen_range(-1.0..1.0);
        Ok(self.obs())
    }

    fn step(&mut self, a: &VecAct) -> Result<Step<Self>> {
        if a.len() != 1 {
            return Err(DrlaError::shape_mismatch("action", 1, a.len()).into());
        }
        let PendulumConfig {
            max_speed,
            max_torque,
            dt,
            g,
            m,
            l,
        } = self.config;
        let u = (a.0[0] * max_torque).clamp(-max_torque, max_torque);
        let th = self.th;
        let thdot = self.thdot;

        let cost = angle_normalize(th).powi(2) + 0.1 * thdot.powi(2) + 0.001 * u.powi(2);
        let thdot = thdot + (3.0 * g / (2.0 * l) * th.sin() + 3.0 / (m * l * l) * u) * dt;
        self.thdot = thdot.clamp(-max_speed, max_speed);
        self.th = th + self.thdot * dt;
        trace!("th = {}, thdot = {}, u = {}", self.th, self.thdot, u);

        let info = Record::from_slice(&[("torque", RecordValue::Scalar(u))]);
        Ok(Step::new(self.obs(), a.clone(), -cost, false, info))
    }

    fn observation_space(&self) -> BoxSpace {
        let s = self.config.max_speed;
        BoxSpace::new(vec![-1.0, -1.0, -s], vec![1.0, 1.0, s])
    }

    fn action_space(&self) -> BoxSpace {
        BoxSpace::uniform(1, -1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_seeded_reset() -> Result<()> {
        let config = PendulumConfig::default();
        let mut env1 = Pendulum::build(&config, 42)?;
        let mut env2 = Pendulum::build(&config, 42)?;
        let mut env3 = Pendulum::build(&config, 43)?;
        let o1 = env1.reset()?;
        assert_eq!(o1, env2.reset()?);
        assert_ne!(o1, env3.reset()?);
        assert!(env1.observation_space().contains(&o1.0));
        Ok(())
    }

    #[test]
    fn test_upright_at_rest() -> Result<()> {
        let mut env = Pendulum::build(&PendulumConfig::default(), 0)?;
        env.reset()?;
        env.th = 0.0;
        env.thdot = 0.0;
        let step = env.step(&VecAct(vec![0.0]))?;
        assert_eq!(step.reward, 0.0);
        assert!(!step.is_terminated);
        assert_eq!(step.obs.0, vec![1.0, 0.0, 0.0]);
        Ok(())
    }

    #[test]
    fn test_reward_and_clipping() -> Result<()> {
        let mut env = Pendulum::build(&PendulumConfig::default(), 0)?;
        env.reset()?;
        env.th = PI / 2.0;
        env.thdot = 1.0;
        // Clipped to the maximum torque 2.0.
        let step = env.step(&VecAct(vec![5.0]))?;
        let expected = (PI / 2.0).powi(2) + 0.1 + 0.001 * 4.0;
        assert!((step.reward + expected).abs() < 1e-5);
        assert_eq!(step.info.get_scalar("torque")?, 2.0);

        let thdot = 1.0 + (15.0 + 6.0) * 0.05;
        let (th, thdot_) = env.state();
        assert!((thdot_ - thdot).abs() < 1e-5);
        assert!((th - (PI / 2.0 + thdot * 0.05)).abs() < 1e-5);
        Ok(())
    }

    #[test]
    fn test_speed_bound() -> Result<()> {
        let mut env = Pendulum::build(&PendulumConfig::default(), 0)?;
        env.reset()?;
        env.thdot = 7.9;
        env.th = PI / 2.0;
        env.step(&VecAct(vec![1.0]))?;
        assert_eq!(env.state().1, 8.0);
        Ok(())
    }

    #[test]
    fn test_wrong_action_dim() -> Result<()> {
        let mut env = Pendulum::build(&PendulumConfig::default(), 0)?;
        env.reset()?;
        let err = env.step(&VecAct(vec![0.0, 0.0])).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DrlaError>(),
            Some(DrlaError::ShapeMismatch { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_config_yaml() -> Result<()> {
        let dir = TempDir::new("pendulum")?;
        let path = dir.path().join("pendulum.yaml");
        let config = PendulumConfig::default().g(9.8);
        config.save(&path)?;
        assert_eq!(PendulumConfig::load(&path)?, config);
        assert!(PendulumConfig::default().max_torque(0.0).validate().is_err());
        Ok(())
    }
}

use anyhow::Result;
use drla::{
    classic_env::{Pendulum, PendulumConfig},
    core::{
        record::BufferedRecorder, replay_buffer::SimpleReplayBuffer, util::eval_with_recorder,
        Agent, Env as _, MakeDeterministic, RunState, TrainerConfig,
    },
    logger::{create_log_dir, ExperimentRecorder},
    util::{train_sac, MlpSac, SacVariant},
};
use std::fs;
use tempdir::TempDir;

fn variant(model_dir: &str) -> SacVariant {
    let trainer = TrainerConfig::default()
        .num_epochs(2)
        .max_path_length(20)
        .batch_size(16)
        .num_eval_steps_per_epoch(40)
        .num_expl_steps_per_train_loop(20)
        .num_trains_per_train_loop(5)
        .num_train_loops_per_epoch(2)
        .min_num_steps_before_training(40)
        .model_dir(model_dir)
        .save_interval(1);

    SacVariant {
        seed: 7,
        replay_buffer_size: 1000,
        hidden_sizes: vec![16],
        trainer,
        ..SacVariant::default()
    }
}

#[test]
fn test_sac_pendulum() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let model_dir = TempDir::new("sac_pendulum")?;
    let model_dir_str = model_dir.path().to_string_lossy().into_owned();
    let variant = variant(&model_dir_str);
    let mut recorder = BufferedRecorder::new();

    let (mut agent, state) =
        train_sac::<Pendulum, _>(&variant, &PendulumConfig::default(), &mut recorder)?;

    assert_eq!(
        state,
        RunState {
            epoch: 2,
            env_steps: 40 + 2 * 2 * 20,
            opt_steps: 2 * 2 * 5,
            warmup_rounds: 2,
        }
    );
    assert_eq!(recorder.variant().map(|v| v["algorithm"].clone()), Some("SAC".into()));

    let records = recorder.records();
    assert_eq!(records.len(), 2);
    for (epoch, record) in records.iter().enumerate() {
        assert_eq!(record.get_scalar("Epoch")?, epoch as f32);
        assert_eq!(
            record.get_scalar("replay_buffer/size")?,
            (40 + (epoch + 1) * 2 * 20) as f32
        );
        assert!(record.get_scalar("trainer/QF1 Loss Mean")?.is_finite());
        assert!(record.get_scalar("trainer/Policy Loss Mean")?.is_finite());
        assert!(record.get_scalar("evaluation/Average Returns")?.is_finite());
        assert_eq!(record.get_scalar("evaluation/Num Paths")?, 2.0);
    }

    for dir in ["0", "1", "best"] {
        assert!(model_dir.path().join(dir).join("pi.safetensors").exists());
    }

    // Parameters of the best evaluation are loadable into a fresh agent.
    let mut agent_ = MlpSac::<Pendulum>::build(variant.sac_config(3, 1))?;
    Agent::<Pendulum, SimpleReplayBuffer>::load_params(&mut agent_, &model_dir.path().join("best"))?;
    let mut env = Pendulum::build(&PendulumConfig::default(), 0)?;
    let mut recorder = BufferedRecorder::new();
    let returns = eval_with_recorder(
        &mut env,
        &mut MakeDeterministic::new(&mut agent_),
        2,
        20,
        &mut recorder,
    )?;
    assert_eq!(returns.len(), 2);
    assert!(returns.iter().all(|r| r.is_finite() && *r <= 0.0));

    // Training mode is restored after evaluation.
    assert!(Agent::<Pendulum, SimpleReplayBuffer>::is_train(&agent));
    Agent::<Pendulum, SimpleReplayBuffer>::eval(&mut agent);
    Ok(())
}

#[test]
fn test_sac_pendulum_experiment_logs() -> Result<()> {
    let base = TempDir::new("sac_pendulum_logs")?;
    let log_dir = create_log_dir("sac_pendulum", 0, 7, base.path())?;
    let model_dir = log_dir.join("model").to_string_lossy().into_owned();
    let mut variant = variant(&model_dir);
    variant.trainer = variant.trainer.num_epochs(1);
    let mut recorder = ExperimentRecorder::new(&log_dir)?;

    train_sac::<Pendulum, _>(&variant, &PendulumConfig::default(), &mut recorder)?;

    let csv = fs::read_to_string(log_dir.join("progress.csv"))?;
    assert_eq!(csv.lines().count(), 2);
    assert!(csv.lines().next().unwrap_or_default().contains("evaluation/Average Returns"));

    let variant_json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(log_dir.join("variant.json"))?)?;
    assert_eq!(variant_json["seed"], 7);
    assert!(fs::read_to_string(log_dir.join("debug.log"))?.contains("Epoch"));
    Ok(())
}

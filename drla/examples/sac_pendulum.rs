use anyhow::Result;
use clap::Parser;
use drla::{
    candle_agent::Device,
    classic_env::{Pendulum, PendulumConfig},
    core::{
        record::{Record, Recorder},
        replay_buffer::SimpleReplayBuffer,
        util::eval_with_recorder,
        Agent, Env as _, MakeDeterministic, TrainerConfig,
    },
    logger::{create_log_dir, ExperimentRecorder},
    util::{train_sac, MlpSac, SacVariant},
};
use log::info;
use std::path::Path;

const MAX_PATH_LENGTH: usize = 200;
const N_EPISODES_PER_EVAL: usize = 5;

/// Train/eval SAC agent in pendulum environment
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// The number of epochs
    #[arg(long, default_value_t = 20)]
    epochs: usize,

    /// Random seed
    #[arg(long, default_value_t = 0)]
    seed: i64,

    /// Base directory of logs
    #[arg(long, default_value = "./data")]
    log_dir: String,

    /// Directory of model parameters, defaults to `<log dir of the run>/model`
    #[arg(long)]
    model_dir: Option<String>,

    /// Also write TensorBoard events
    #[arg(long, default_value_t = false)]
    tensorboard: bool,

    /// Evaluate parameters in the model directory instead of training
    #[arg(short, long, default_value_t = false)]
    eval: bool,

    /// Use the CUDA device
    #[arg(long, default_value_t = false)]
    cuda: bool,
}

fn variant(args: &Args, model_dir: &str) -> SacVariant {
    let trainer = TrainerConfig::default()
        .num_epochs(args.epochs)
        .max_path_length(MAX_PATH_LENGTH)
        .batch_size(512)
        .num_eval_steps_per_epoch(N_EPISODES_PER_EVAL * MAX_PATH_LENGTH)
        .num_train_loops_per_epoch(50)
        .num_trains_per_train_loop(200)
        .num_expl_steps_per_train_loop(200)
        .min_num_steps_before_training(1000)
        .model_dir(model_dir)
        .save_interval(5);

    SacVariant {
        seed: args.seed,
        device: match args.cuda {
            true => Device::Cuda(0),
            false => Device::Cpu,
        },
        trainer,
        ..SacVariant::default()
    }
}

fn train(args: &Args) -> Result<()> {
    let log_dir = create_log_dir("sac_pendulum", 0, args.seed, &args.log_dir)?;
    let model_dir = match &args.model_dir {
        Some(model_dir) => model_dir.clone(),
        None => log_dir.join("model").to_string_lossy().into_owned(),
    };
    let variant = variant(args, &model_dir);

    let mut recorder = ExperimentRecorder::new(&log_dir)?;
    if args.tensorboard {
        recorder = recorder.with_tensorboard();
    }
    let (_, state) = train_sac::<Pendulum, _>(&variant, &PendulumConfig::default(), &mut recorder)?;
    info!("Finished: {:?}", state);

    Ok(())
}

fn eval(args: &Args) -> Result<()> {
    let model_dir = args
        .model_dir
        .clone()
        .unwrap_or_else(|| "./data/model/best".to_string());
    let variant = variant(args, &model_dir);
    let mut env = Pendulum::build(&PendulumConfig::default(), args.seed + 1)?;
    let mut agent = MlpSac::<Pendulum>::build(variant.sac_config(3, 1))?;
    Agent::<Pendulum, SimpleReplayBuffer>::load_params(&mut agent, Path::new(&model_dir))?;

    let mut recorder = StdoutRecorder;
    let mut policy = MakeDeterministic::new(&mut agent);
    let returns = eval_with_recorder(
        &mut env,
        &mut policy,
        N_EPISODES_PER_EVAL,
        MAX_PATH_LENGTH,
        &mut recorder,
    )?;
    let mean = returns.iter().sum::<f32>() / returns.len() as f32;
    println!("Average return over {} episodes: {}", returns.len(), mean);

    Ok(())
}

struct StdoutRecorder;

impl Recorder for StdoutRecorder {
    fn write(&mut self, record: Record) -> Result<()> {
        let mut items = record
            .iter()
            .map(|(k, v)| format!("{} = {:?}", k, v))
            .collect::<Vec<_>>();
        items.sort();
        println!("{}", items.join(", "));
        Ok(())
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    match args.eval {
        true => eval(&args),
        false => train(&args),
    }
}

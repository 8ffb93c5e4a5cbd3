use crate::{CsvRecorder, TensorboardRecorder, TextRecorder};
use anyhow::Result;
use chrono::Local;
use drla_core::record::{Record, Recorder};
use log::info;
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

/// Creates the log directory of a run and returns its path.
///
/// The directory is
/// `<base_dir>/<exp-prefix>/<exp-prefix>_<YYYY_MM_DD_HH_MM_SS>_<exp_id:04>--s-<seed>`,
/// where underscores of `exp_prefix` are replaced with hyphens.
pub fn create_log_dir(
    exp_prefix: &str,
    exp_id: usize,
    seed: i64,
    base_dir: impl AsRef<Path>,
) -> Result<PathBuf> {
    let exp_prefix = exp_prefix.replace('_', "-");
    let timestamp = Local::now().format("%Y_%m_%d_%H_%M_%S");
    let exp_name = format!("{}_{}_{:04}--s-{}", exp_prefix, timestamp, exp_id, seed);
    let log_dir = base_dir.as_ref().join(&exp_prefix).join(exp_name);
    fs::create_dir_all(&log_dir)?;
    info!("Log directory: {:?}", log_dir);
    Ok(log_dir)
}

/// Records of a run in a log directory.
///
/// Epoch records go to `progress.csv` and `debug.log`, and optionally to
/// TensorBoard. The variant is stored in `variant.json`.
pub struct ExperimentRecorder {
    log_dir: PathBuf,
    csv: CsvRecorder,
    text: TextRecorder,
    tensorboard: Option<TensorboardRecorder>,
}

impl ExperimentRecorder {
    /// Creates sinks in an existing directory.
    pub fn new(log_dir: impl AsRef<Path>) -> Result<Self> {
        let log_dir = log_dir.as_ref().to_path_buf();
        Ok(Self {
            csv: CsvRecorder::new(log_dir.join("progress.csv"))?,
            text: TextRecorder::new(log_dir.join("debug.log"))?,
            tensorboard: None,
            log_dir,
        })
    }

    /// Also writes scalar values as TensorBoard events in the log directory.
    pub fn with_tensorboard(mut self) -> Self {
        self.tensorboard = Some(TensorboardRecorder::new(&self.log_dir));
        self
    }

    /// The log directory.
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}

impl Recorder for ExperimentRecorder {
    fn write(&mut self, record: Record) -> Result<()> {
        if let Some(tb) = &mut self.tensorboard {
            tb.write(record.clone())?;
        }
        self.text.write(record.clone())?;
        self.csv.write(record)
    }

    fn log_variant(&mut self, variant: &serde_json::Value) -> Result<()> {
        let path = self.log_dir.join("variant.json");
        let mut file = File::create(&path)?;
        file.write_all(serde_json::to_string_pretty(variant)?.as_bytes())?;
        info!("Save variant to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drla_core::record::RecordValue;
    use tempdir::TempDir;

    #[test]
    fn test_create_log_dir() -> Result<()> {
        let base = TempDir::new("log_dir")?;
        let log_dir = create_log_dir("sac_pendulum", 3, 42, base.path())?;
        assert!(log_dir.is_dir());
        assert_eq!(log_dir.parent(), Some(base.path().join("sac-pendulum").as_path()));

        let name = log_dir.file_name().and_then(|s| s.to_str()).unwrap();
        assert!(name.starts_with("sac-pendulum_"));
        assert!(name.ends_with("_0003--s-42"));
        Ok(())
    }

    #[test]
    fn test_experiment_recorder() -> Result<()> {
        let dir = TempDir::new("experiment")?;
        let mut recorder = ExperimentRecorder::new(dir.path())?;
        recorder.log_variant(&serde_json::json!({"seed": 42, "algorithm": "SAC"}))?;
        recorder.write(Record::from_slice(&[
            ("Epoch", RecordValue::Scalar(0.0)),
            ("evaluation/Average Returns", RecordValue::Scalar(-1.5)),
        ]))?;

        let variant: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("variant.json"))?)?;
        assert_eq!(variant["seed"], 42);

        let csv = fs::read_to_string(dir.path().join("progress.csv"))?;
        assert_eq!(csv, "Epoch,evaluation/Average Returns\n0,-1.5\n");
        assert!(dir.path().join("debug.log").exists());
        Ok(())
    }
}

//! Sinks of epoch records.
//!
//! * [`CsvRecorder`] writes one row per epoch into `progress.csv`.
//! * [`TextRecorder`] appends a key-value table per epoch to `debug.log`.
//! * [`TensorboardRecorder`] writes scalar values as TFRecord events.
//! * [`ExperimentRecorder`] combines the above under a directory created by
//!   [`create_log_dir`] and stores the variant of the run in `variant.json`.
mod csv_recorder;
mod experiment;
mod tensorboard;
mod text;
use drla_core::record::RecordValue;

pub use csv_recorder::CsvRecorder;
pub use experiment::{create_log_dir, ExperimentRecorder};
pub use tensorboard::TensorboardRecorder;
pub use text::TextRecorder;

/// Formats a value as a single cell of a table.
pub(crate) fn format_value(v: &RecordValue) -> String {
    fn join(xs: &[f32]) -> String {
        let xs = xs.iter().map(|x| x.to_string()).collect::<Vec<_>>();
        format!("[{}]", xs.join(" "))
    }

    match v {
        RecordValue::Scalar(v) => v.to_string(),
        RecordValue::DateTime(t) => t.to_rfc3339(),
        RecordValue::Array1(xs) => join(xs),
        RecordValue::Array2(xs, _) => join(xs),
        RecordValue::Array3(xs, _) => join(xs),
        RecordValue::String(s) => s.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&RecordValue::Scalar(1.5)), "1.5");
        assert_eq!(format_value(&RecordValue::Array1(vec![1.0, -2.0])), "[1 -2]");
        assert_eq!(format_value(&RecordValue::String("a".into())), "a");
    }
}

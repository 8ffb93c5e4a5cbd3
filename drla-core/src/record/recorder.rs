use super::Record;
use anyhow::Result;

/// A sink for per-epoch records.
///
/// The [`Trainer`](crate::Trainer) calls [`Recorder::log_variant`] once with
/// the hyperparameter snapshot of the run, then [`Recorder::write`] once at
/// the end of every epoch.
pub trait Recorder {
    /// Writes a record.
    fn write(&mut self, record: Record) -> Result<()>;

    /// Stores the hyperparameters of the run.
    ///
    /// The default implementation ignores the variant.
    #[allow(unused_variables)]
    fn log_variant(&mut self, variant: &serde_json::Value) -> Result<()> {
        Ok(())
    }
}

impl<T: Recorder + ?Sized> Recorder for Box<T> {
    fn write(&mut self, record: Record) -> Result<()> {
        (**self).write(record)
    }

    fn log_variant(&mut self, variant: &serde_json::Value) -> Result<()> {
        (**self).log_variant(variant)
    }
}

/// Keeps every written record in memory.
#[derive(Default)]
pub struct BufferedRecorder {
    records: Vec<Record>,
    variant: Option<serde_json::Value>,
}

impl BufferedRecorder {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records written so far, oldest first.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// The variant given to [`Recorder::log_variant`], if any.
    pub fn variant(&self) -> Option<&serde_json::Value> {
        self.variant.as_ref()
    }
}

impl Recorder for BufferedRecorder {
    fn write(&mut self, record: Record) -> Result<()> {
        self.records.push(record);
        Ok(())
    }

    fn log_variant(&mut self, variant: &serde_json::Value) -> Result<()> {
        self.variant = Some(variant.clone());
        Ok(())
    }
}

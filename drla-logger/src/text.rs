use crate::format_value;
use anyhow::Result;
use drla_core::record::{Record, Recorder};
use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::Path,
};

/// Appends records to a text file as key-value tables.
pub struct TextRecorder {
    file: File,
}

impl TextRecorder {
    /// Opens `path` in append mode.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file })
    }
}

/// Renders a record as a two-column table with sorted keys.
pub(crate) fn table(record: &Record) -> String {
    let mut rows = record
        .iter()
        .map(|(k, v)| (k.as_str(), format_value(v)))
        .collect::<Vec<_>>();
    rows.sort_by(|a, b| a.0.cmp(b.0));

    let w_key = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    let w_val = rows.iter().map(|(_, v)| v.len()).max().unwrap_or(0);
    let rule = format!("{}  {}\n", "-".repeat(w_key), "-".repeat(w_val));

    let mut s = rule.clone();
    for (k, v) in rows.iter() {
        s += &format!("{:<w_key$}  {}\n", k, v, w_key = w_key);
    }
    s += &rule;
    s
}

impl Recorder for TextRecorder {
    fn write(&mut self, record: Record) -> Result<()> {
        self.file.write_all(table(&record).as_bytes())?;
        self.file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drla_core::record::RecordValue;
    use tempdir::TempDir;

    #[test]
    fn test_table() {
        let record = Record::from_slice(&[
            ("Epoch", RecordValue::Scalar(0.0)),
            ("a", RecordValue::Scalar(1.5)),
        ]);
        assert_eq!(table(&record), "-----  ---\nEpoch  0\na      1.5\n-----  ---\n");
    }

    #[test]
    fn test_append() -> Result<()> {
        let dir = TempDir::new("text_recorder")?;
        let path = dir.path().join("debug.log");
        let mut recorder = TextRecorder::new(&path)?;
        recorder.write(Record::from_scalar("x", 1.0))?;
        recorder.write(Record::from_scalar("x", 2.0))?;
        let text = std::fs::read_to_string(&path)?;
        assert_eq!(text.lines().count(), 6);
        assert!(text.contains("x  2"));
        Ok(())
    }
}

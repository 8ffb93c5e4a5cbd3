use crate::format_value;
use anyhow::Result;
use csv::Writer;
use drla_core::record::{Record, Recorder};
use log::warn;
use std::{collections::HashSet, fs::File, path::Path};

/// Writes records as rows of a CSV file.
///
/// The header is fixed by the keys of the first record, sorted.
/// Later keys not in the header are dropped with a warning and missing
/// keys are written as empty cells.
pub struct CsvRecorder {
    writer: Writer<File>,
    header: Option<Vec<String>>,
    warned: HashSet<String>,
}

impl CsvRecorder {
    /// Creates a CSV file at `path`, truncating it if it exists.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            writer: Writer::from_path(path)?,
            header: None,
            warned: HashSet::new(),
        })
    }
}

impl Recorder for CsvRecorder {
    fn write(&mut self, record: Record) -> Result<()> {
        let Self {
            writer,
            header,
            warned,
        } = self;

        if header.is_none() {
            let mut keys = record.keys().cloned().collect::<Vec<_>>();
            keys.sort();
            writer.write_record(&keys)?;
            *header = Some(keys);
        }
        let header = header.as_deref().unwrap_or_default();

        for k in record.keys() {
            if !header.contains(k) && warned.insert(k.clone()) {
                warn!("Key {} is not in the header of progress.csv, dropped", k);
            }
        }

        let row = header
            .iter()
            .map(|k| record.get(k).map(format_value).unwrap_or_default());
        writer.write_record(row)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drla_core::record::RecordValue;
    use tempdir::TempDir;

    #[test]
    fn test_header_fixed_by_first_record() -> Result<()> {
        let dir = TempDir::new("csv_recorder")?;
        let path = dir.path().join("progress.csv");
        let mut recorder = CsvRecorder::new(&path)?;

        recorder.write(Record::from_slice(&[
            ("b", RecordValue::Scalar(2.0)),
            ("a", RecordValue::Scalar(1.0)),
        ]))?;
        recorder.write(Record::from_slice(&[
            ("a", RecordValue::Scalar(3.0)),
            ("c", RecordValue::Scalar(4.0)),
        ]))?;

        let text = std::fs::read_to_string(&path)?;
        assert_eq!(text, "a,b\n1,2\n3,\n");
        Ok(())
    }
}

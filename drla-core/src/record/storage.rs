//! Record storage and aggregation.
//!
//! The training loop stores one record per gradient step and per collected
//! path, then aggregates them once per epoch. Scalars are summarised as
//! `"<key> Mean"`, `"<key> Std"`, `"<key> Max"` and `"<key> Min"`, so that
//! every epoch yields the same set of columns.
use super::{Record, RecordValue};
use std::collections::HashSet;
use xxhash_rust::xxh3::Xxh3Builder;

/// Summary statistics of a slice of values.
///
/// Returns a record with the keys `"<name> Mean"`, `"<name> Std"`,
/// `"<name> Max"` and `"<name> Min"`. The standard deviation is the
/// population one. All four statistics are `NaN` when `values` is empty.
pub fn stats(name: &str, values: &[f32]) -> Record {
    let (mean, std, max, min) = if values.is_empty() {
        (f32::NAN, f32::NAN, f32::NAN, f32::NAN)
    } else {
        let n = values.len() as f64;
        let mean = values.iter().map(|v| *v as f64).sum::<f64>() / n;
        let var = values
            .iter()
            .map(|v| (*v as f64 - mean).powi(2))
            .sum::<f64>()
            / n;
        let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let min = values.iter().copied().fold(f32::INFINITY, f32::min);
        (mean as f32, var.sqrt() as f32, max, min)
    };

    Record::from_slice(&[
        (format!("{} Mean", name), RecordValue::Scalar(mean)),
        (format!("{} Std", name), RecordValue::Scalar(std)),
        (format!("{} Max", name), RecordValue::Scalar(max)),
        (format!("{} Min", name), RecordValue::Scalar(min)),
    ])
}

/// Accumulates records and aggregates them.
///
/// Scalars are reduced with [`stats`], except a key stored exactly once,
/// which is reported unchanged. For every other value type the most recently
/// stored value is kept.
#[derive(Default)]
pub struct RecordStorage {
    data: Vec<Record>,
}

impl RecordStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self { data: vec![] }
    }

    /// Stores a record.
    pub fn store(&mut self, record: Record) {
        self.data.push(record);
    }

    /// Number of records stored since the last aggregation.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if nothing has been stored since the last aggregation.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn keys(&self) -> HashSet<String, Xxh3Builder> {
        let mut keys = HashSet::<String, Xxh3Builder>::default();
        for record in self.data.iter() {
            keys.extend(record.keys().cloned());
        }
        keys
    }

    fn latest(&self, key: &str) -> Option<&RecordValue> {
        self.data.iter().rev().find_map(|record| record.get(key))
    }

    fn scalars(&self, key: &str) -> Vec<f32> {
        self.data
            .iter()
            .filter_map(|record| match record.get(key) {
                Some(RecordValue::Scalar(v)) => Some(*v),
                _ => None,
            })
            .collect()
    }

    /// Aggregates all stored records and clears the storage.
    pub fn aggregate(&mut self) -> Record {
        let mut record = Record::empty();

        for key in self.keys().iter() {
            match self.latest(key) {
                Some(RecordValue::Scalar(_)) => {
                    let vs = self.scalars(key);
                    if vs.len() == 1 {
                        record.insert(key.clone(), RecordValue::Scalar(vs[0]));
                    } else {
                        record.merge_inplace(stats(key, &vs));
                    }
                }
                Some(value) => record.insert(key.clone(), value.clone()),
                None => {}
            }
        }

        self.data.clear();
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats() {
        let r = stats("Returns", &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(r.get_scalar("Returns Mean").unwrap(), 2.5);
        assert_eq!(r.get_scalar("Returns Max").unwrap(), 4.0);
        assert_eq!(r.get_scalar("Returns Min").unwrap(), 1.0);
        let std = r.get_scalar("Returns Std").unwrap();
        assert!((std - 1.118034).abs() < 1e-5);
    }

    #[test]
    fn test_stats_empty_is_nan() {
        let r = stats("Returns", &[]);
        assert!(r.get_scalar("Returns Mean").unwrap().is_nan());
        assert_eq!(r.len(), 4);
    }

    #[test]
    fn test_aggregate_clears_storage() {
        let mut storage = RecordStorage::new();
        storage.store(Record::from_scalar("QF1 Loss", 1.0));
        storage.store(Record::from_scalar("QF1 Loss", 3.0));
        storage.store(Record::from_slice(&[(
            "Phase",
            RecordValue::String("train".into()),
        )]));

        let r = storage.aggregate();
        assert_eq!(r.get_scalar("QF1 Loss Mean").unwrap(), 2.0);
        assert_eq!(r.get_scalar("QF1 Loss Min").unwrap(), 1.0);
        assert_eq!(r.get_string("Phase").unwrap(), "train");
        assert!(storage.is_empty());
    }

    #[test]
    fn test_single_value_is_kept() {
        let mut storage = RecordStorage::new();
        storage.store(Record::from_scalar("Epoch", 4.0));
        let r = storage.aggregate();
        assert_eq!(r.get_scalar("Epoch").unwrap(), 4.0);
        assert_eq!(r.len(), 1);
    }
}

//! Aggregation of stored records.
use super::{Record, RecordValue};
use std::collections::HashSet;
use xxhash_rust::xxh3::Xxh3Builder;

/// A storage of records with aggregation.
///
/// Scalars stored under the same key are reduced to `{key}_min`, `{key}_max`,
/// `{key}_mean` and `{key}_median`; a key with a single scalar keeps its name.
/// For other value types the latest value is kept.
#[derive(Debug, Default)]
pub struct RecordStorage {
    data: Vec<Record>,
}

fn min(vs: &[f32]) -> RecordValue {
    RecordValue::Scalar(vs.iter().copied().fold(f32::INFINITY, f32::min))
}

fn max(vs: &[f32]) -> RecordValue {
    RecordValue::Scalar(vs.iter().copied().fold(f32::NEG_INFINITY, f32::max))
}

fn mean(vs: &[f32]) -> RecordValue {
    RecordValue::Scalar(vs.iter().sum::<f32>() / vs.len() as f32)
}

fn median(mut vs: Vec<f32>) -> RecordValue {
    vs.sort_by(|x, y| x.total_cmp(y));
    RecordValue::Scalar(vs[vs.len() / 2])
}

impl RecordStorage {
    /// Creates a new empty record storage.
    pub fn new() -> Self {
        Self { data: vec![] }
    }

    /// Stores a record in the storage.
    pub fn store(&mut self, record: Record) {
        self.data.push(record);
    }

    /// Returns `true` if no record is stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn get_keys(&self) -> HashSet<String, Xxh3Builder> {
        let mut keys = HashSet::<String, Xxh3Builder>::default();
        for record in self.data.iter() {
            for k in record.keys() {
                keys.insert(k.clone());
            }
        }
        keys
    }

    /// The latest value of `key`, or the scalars of `key` if the latest value is a scalar.
    fn reduce(&self, key: &str) -> Record {
        let Some(latest) = self.data.iter().rev().find_map(|record| record.get(key)) else {
            return Record::empty();
        };

        match latest {
            RecordValue::Scalar(_) => {
                let vs: Vec<f32> = self
                    .data
                    .iter()
                    .filter_map(|record| match record.get(key) {
                        Some(RecordValue::Scalar(v)) => Some(*v),
                        _ => None,
                    })
                    .collect();

                if vs.len() == 1 {
                    Record::from_scalar(key, vs[0])
                } else {
                    Record::from_slice(&[
                        (format!("{}_min", key), min(&vs)),
                        (format!("{}_max", key), max(&vs)),
                        (format!("{}_mean", key), mean(&vs)),
                        (format!("{}_median", key), median(vs)),
                    ])
                }
            }
            value => Record::from_slice(&[(key, value.clone())]),
        }
    }

    /// Aggregates all stored records and clears the storage.
    pub fn aggregate(&mut self) -> Record {
        let mut record = Record::empty();

        for key in self.get_keys().iter() {
            record.merge_inplace(self.reduce(key));
        }

        self.data.clear();

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_are_reduced_to_statistics() {
        let mut storage = RecordStorage::new();
        for v in [3.0, 1.0, 2.0] {
            storage.store(Record::from_scalar("loss", v));
        }
        storage.store(Record::from_scalar("eval_mean_return", -12.0));

        let record = storage.aggregate();
        assert_eq!(record.get_scalar("loss_min").unwrap(), 1.0);
        assert_eq!(record.get_scalar("loss_max").unwrap(), 3.0);
        assert_eq!(record.get_scalar("loss_mean").unwrap(), 2.0);
        assert_eq!(record.get_scalar("loss_median").unwrap(), 2.0);
        assert_eq!(record.get_scalar("eval_mean_return").unwrap(), -12.0);
        assert!(storage.is_empty());
    }

    #[test]
    fn latest_non_scalar_value_is_kept() {
        let mut storage = RecordStorage::new();
        storage.store(Record::from_slice(&[("phase", RecordValue::String("train".into()))]));
        storage.store(Record::from_slice(&[("phase", RecordValue::String("eval".into()))]));
        assert_eq!(storage.aggregate().get_string("phase").unwrap(), "eval");
    }
}

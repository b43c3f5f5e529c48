use super::{AggregateRecorder, Record};

/// Buffered recorder.
///
/// Keeps every stored record in memory. Used for inspecting
/// the records of a training run, e.g., in tests.
#[derive(Debug, Default)]
pub struct BufferedRecorder {
    buf: Vec<Record>,
    n_flushes: usize,
}

impl BufferedRecorder {
    /// Construct the recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an iterator over the records.
    pub fn iter(&self) -> std::slice::Iter<Record> {
        self.buf.iter()
    }

    /// Returns the records having the given key.
    pub fn records_with(&self, key: &str) -> Vec<&Record> {
        self.buf.iter().filter(|r| r.get(key).is_some()).collect()
    }

    /// The number of times [`AggregateRecorder::flush`] was called.
    pub fn n_flushes(&self) -> usize {
        self.n_flushes
    }
}

impl AggregateRecorder for BufferedRecorder {
    fn store(&mut self, record: Record) {
        self.buf.push(record);
    }

    fn flush(&mut self, _step: i64) {
        self.n_flushes += 1;
    }
}

use super::{AggregateRecorder, Record, RecordStorage, RecordValue};
use log::info;

/// Writes aggregated records through the `log` facade.
///
/// Each flush emits a single `info` line with the keys in alphabetical order.
#[derive(Debug, Default)]
pub struct LogRecorder {
    storage: RecordStorage,
}

impl LogRecorder {
    /// Constructs the recorder.
    pub fn new() -> Self {
        Self::default()
    }

    fn format(record: &Record) -> String {
        let mut items: Vec<_> = record.iter().collect();
        items.sort_by(|a, b| a.0.cmp(b.0));
        items
            .into_iter()
            .map(|(k, v)| match v {
                RecordValue::Scalar(v) => format!("{}={:.4}", k, v),
                RecordValue::DateTime(v) => format!("{}={}", k, v.format("%Y-%m-%d %H:%M:%S")),
                RecordValue::Array1(v) => format!("{}={:?}", k, v),
                RecordValue::String(v) => format!("{}={}", k, v),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl AggregateRecorder for LogRecorder {
    fn store(&mut self, record: Record) {
        self.storage.store(record);
    }

    fn flush(&mut self, step: i64) {
        if self.storage.is_empty() {
            return;
        }
        let record = self.storage.aggregate();
        info!("[step {}] {}", step, Self::format(&record));
    }
}

//! Types and traits for recording values obtained in training and evaluation.
//!
//! * [`Record`] - key-value pairs of various data types
//! * [`AggregateRecorder`] - destination of records
//! * [`RecordStorage`] - aggregation of stored records
//! * [`BufferedRecorder`] - keeps records in memory
//! * [`LogRecorder`] - writes aggregated records through the `log` facade
//! * [`NullRecorder`] - discards records
//!
//! ```rust
//! use deepq_core::record::{Record, RecordValue};
//!
//! let mut record = Record::empty();
//! record.insert("env_steps", RecordValue::Scalar(1.0));
//! record.insert("loss", RecordValue::Scalar(0.25));
//! assert_eq!(record.get_scalar("loss").unwrap(), 0.25);
//! ```
mod base;
mod buffered_recorder;
mod log_recorder;
mod null_recorder;
mod recorder;
mod storage;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use log_recorder::LogRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::AggregateRecorder;
pub use storage::RecordStorage;

//! Types and traits for recording training metrics.
//!
//! * [`Record`] - a string-keyed map of [`RecordValue`]s, used both for the
//!   per-step metadata reported by environments and policies and for the
//!   per-epoch summary emitted by the [`Trainer`](crate::Trainer).
//! * [`RecordStorage`] - accumulates records and aggregates them into
//!   Mean/Std/Max/Min statistics.
//! * [`Recorder`] - the sink receiving epoch summaries and the run variant.
//!
//! ```rust
//! use drla_core::record::{Record, RecordValue};
//!
//! let mut record = Record::empty();
//! record.insert("Epoch", RecordValue::Scalar(3.0));
//! record.insert("Policy mu", RecordValue::Array1(vec![0.1, -0.2]));
//! assert_eq!(record.get_scalar("Epoch").unwrap(), 3.0);
//! ```
mod base;
mod recorder;
mod storage;

pub use base::{Record, RecordValue};
pub use recorder::{BufferedRecorder, Recorder};
pub use storage::{stats, RecordStorage};

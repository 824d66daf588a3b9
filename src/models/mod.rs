pub mod record;
pub mod service;

pub use record::{parse_sample_value, Record, RecordError, Sample, RESERVED_KEYS};
pub use service::Service;

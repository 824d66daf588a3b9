//! Ingestion pipeline
//!
//! Write path: the HTTP handler validates and parses synchronously, then calls
//! [`IngestPipeline::submit`] and answers right away. Storage happens later on
//! a background task.
//!
//! Read path: point reads go straight to the store; windowed reads over the
//! ranged store go through [`paginate`].

pub mod query;
pub mod writer;

pub use query::{paginate, LogPage, PageParams};
pub use writer::{IngestPipeline, PipelineError};

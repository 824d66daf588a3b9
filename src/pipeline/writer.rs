//! Fire-and-forget background storage
//!
//! [`IngestPipeline::submit`] hands a record to an unbounded queue and returns
//! at once. A dispatcher task drains the queue and runs every record as its
//! own tokio task, at most `workers` at a time:
//!
//! ```text
//! submit ──► mpsc queue ──► dispatcher ──► job: [transform] → sink.write
//! ```
//!
//! Jobs finish in no particular order. A failed job is logged and counted,
//! never retried, and never reported to whoever submitted it. There is no
//! timeout: a job stuck in its transform holds its worker slot forever.

use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinError;

use crate::metrics;
use crate::models::{Record, RecordError};
use crate::store::{RecordSink, StoreError};
use crate::transform::{Transform, TransformError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("transform task panicked: {0}")]
    TransformPanicked(#[from] JoinError),

    #[error("transform output is not a valid log: {0}")]
    TransformOutput(#[from] RecordError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PipelineError {
    fn stage(&self) -> &'static str {
        match self {
            Self::Transform(_) | Self::TransformPanicked(_) | Self::TransformOutput(_) => "transform",
            Self::Store(_) => "store",
        }
    }
}

/// Pipeline handle
///
/// Cheap to clone; every clone feeds the same dispatcher. The dispatcher
/// stops once all handles are dropped and the queue is drained.
#[derive(Clone)]
pub struct IngestPipeline {
    sender: mpsc::UnboundedSender<Record>,
}

impl IngestPipeline {
    /// Spawn the dispatcher task
    ///
    /// # Arguments
    ///
    /// * `sink` - Where records end up
    /// * `transform` - Optional step applied to the flattened form first
    /// * `workers` - Max jobs running at once (0 is treated as 1)
    pub fn spawn(
        sink: Arc<dyn RecordSink>,
        transform: Option<Arc<dyn Transform>>,
        workers: usize,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            dispatcher_task(rx, sink, transform, workers.max(1)).await;
        });

        Self { sender: tx }
    }

    /// Queue a record for storage (non-blocking)
    pub fn submit(&self, record: Record) {
        let log_id = record.id();
        if self.sender.send(record).is_err() {
            tracing::error!(%log_id, "Ingest dispatcher is gone, dropping log");
            metrics::record_background_failure("queue");
        }
    }
}

async fn dispatcher_task(
    mut rx: mpsc::UnboundedReceiver<Record>,
    sink: Arc<dyn RecordSink>,
    transform: Option<Arc<dyn Transform>>,
    workers: usize,
) {
    let slots = Arc::new(Semaphore::new(workers));

    while let Some(record) = rx.recv().await {
        let Ok(permit) = slots.clone().acquire_owned().await else {
            break;
        };
        let sink = sink.clone();
        let transform = transform.clone();

        tokio::spawn(async move {
            let _permit = permit;
            run_job(record, sink.as_ref(), transform).await;
        });
    }

    tracing::info!("Ingest dispatcher shutting down");
}

async fn run_job(record: Record, sink: &dyn RecordSink, transform: Option<Arc<dyn Transform>>) {
    let log_id = record.id();
    let started = Instant::now();

    match store_record(record, sink, transform).await {
        Ok(()) => {
            let elapsed = started.elapsed();
            tracing::debug!(
                %log_id,
                backend = sink.name(),
                duration_ms = elapsed.as_millis(),
                "Stored log"
            );
            metrics::record_stored(sink.name(), elapsed);
        }
        Err(e) => {
            tracing::error!(
                %log_id,
                stage = e.stage(),
                error = %e,
                "Background job failed, log dropped"
            );
            metrics::record_background_failure(e.stage());
        }
    }
}

async fn store_record(
    record: Record,
    sink: &dyn RecordSink,
    transform: Option<Arc<dyn Transform>>,
) -> Result<(), PipelineError> {
    let record = match transform {
        Some(transform) => apply_transform(transform, record).await?,
        None => record,
    };
    sink.write(&record).await?;
    Ok(())
}

async fn apply_transform(transform: Arc<dyn Transform>, record: Record) -> Result<Record, PipelineError> {
    let flat = record.to_flattened();
    let derived = tokio::task::spawn_blocking(move || transform.apply(flat)).await??;
    Ok(Record::from_flattened(&derived)?)
}

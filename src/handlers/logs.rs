use axum::{
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::metrics;
use crate::models::Record;
use crate::parser;
use crate::pipeline::{paginate, IngestPipeline, PageParams};
use crate::store::Backend;

/// Shared state for the log routes
#[derive(Clone)]
pub struct AppState {
    pub backend: Backend,
    pub pipeline: IngestPipeline,
}

/// Body of `POST /`
#[derive(Debug, Deserialize, Serialize)]
pub struct LogInput {
    /// Raw line, e.g. `id=<UUID> service_name=api process=api.233 sample#load_avg_1m=0.849`
    pub log: String,
}

/// GET / - stored ids (keyed) or one page of logs (ranged)
///
/// Example: GET /?start=0&end=10
///
/// The query string is only read on the ranged variant.
pub async fn read_logs(State(state): State<AppState>, uri: Uri) -> Result<Response, AppError> {
    match &state.backend {
        Backend::Keyed(store) => {
            let ids = store.list_ids().await?;
            Ok(Json(ids).into_response())
        }
        Backend::Ranged(store) => {
            let params = match Query::<PageParams>::try_from_uri(&uri) {
                Ok(Query(params)) => params,
                Err(rejection) => return Ok(rejection.into_response()),
            };
            let page = paginate(store.as_ref(), params).await?;
            Ok(Json(page).into_response())
        }
    }
}

/// POST / - validate and parse the line, then store it in the background
///
/// Answers 201 before the record is stored.
pub async fn create_log(
    State(state): State<AppState>,
    Json(input): Json<LogInput>,
) -> Result<StatusCode, AppError> {
    let record = parser::parse_line(&input.log).map_err(|e| {
        tracing::debug!(kind = e.kind(), error = %e, "Rejected log");
        metrics::record_rejected(e.kind());
        e
    })?;

    metrics::record_received(record.service_name());
    state.pipeline.submit(record);

    Ok(StatusCode::CREATED)
}

/// GET /logs/{log_id} - one record in its flattened form
pub async fn read_log(
    State(state): State<AppState>,
    Path(log_id): Path<String>,
) -> Result<Json<Record>, AppError> {
    let id = Uuid::parse_str(&log_id).map_err(|_| AppError::NotFound)?;

    state
        .backend
        .get(id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_input_deserialize() {
        let input: LogInput = serde_json::from_str(r#"{"log": "id=x service_name=api process=api.1"}"#).unwrap();
        assert_eq!(input.log, "id=x service_name=api process=api.1");

        assert!(serde_json::from_str::<LogInput>(r#"{"line": "x"}"#).is_err());
    }
}

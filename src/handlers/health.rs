use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::sync::Arc;

use crate::handlers::logs::AppState;
use crate::store::RecordSink;

/// Liveness probe. Reports which store shape this instance serves.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "storage": state.backend.name(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Prometheus text exposition
pub async fn metrics(State(handle): State<Arc<PrometheusHandle>>) -> impl IntoResponse {
    (StatusCode::OK, handle.render())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::server::build_pipeline;
    use crate::store::{Backend, MemoryLogList};

    #[tokio::test]
    async fn test_health_reports_storage_shape() {
        let backend = Backend::Ranged(Arc::new(MemoryLogList::new()));
        let pipeline = build_pipeline(&Config::default(), backend.clone());

        let response = health_check(State(AppState { backend, pipeline }))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["storage"], "ranged");
    }

    #[tokio::test]
    async fn test_metrics_renders_without_global_recorder() {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let state = Arc::new(recorder.handle());

        let response = metrics(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

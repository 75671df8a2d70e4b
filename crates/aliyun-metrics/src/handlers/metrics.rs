use std::{sync::Arc, time::Instant};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::router::ExporterState;

pub const TEXT_FORMAT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub async fn prometheus_metrics(State(state): State<Arc<ExporterState>>) -> impl IntoResponse {
    let started_at = Instant::now();
    let payload = state.registry.render_prometheus().await;
    debug!(
        bytes = payload.len(),
        elapsed_ms = started_at.elapsed().as_millis() as u64,
        "rendered metrics"
    );

    let mut response = Response::new(Body::from(payload));
    *response.status_mut() = StatusCode::OK;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(TEXT_FORMAT_CONTENT_TYPE),
    );

    response
}

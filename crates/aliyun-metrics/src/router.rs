use std::sync::Arc;

use aliyun_common::error::{ExporterError, Result};
use axum::{Router, routing::get};

use crate::{handlers, metrics::MetricsRegistry};

pub const DEFAULT_TELEMETRY_PATH: &str = "/metrics";
const LANDING_PATH: &str = "/";
const HEALTH_LIVE_PATH: &str = "/health/live";

pub struct ExporterState {
    pub registry: Arc<MetricsRegistry>,
    pub telemetry_path: String,
}

impl ExporterState {
    pub fn new(registry: Arc<MetricsRegistry>, telemetry_path: impl Into<String>) -> Result<Self> {
        let telemetry_path = telemetry_path.into();
        if !telemetry_path.starts_with('/') {
            return Err(ExporterError::InvalidArgument(format!(
                "telemetry path must be absolute: {telemetry_path}"
            )));
        }
        if [LANDING_PATH, HEALTH_LIVE_PATH].contains(&telemetry_path.as_str()) {
            return Err(ExporterError::InvalidArgument(format!(
                "telemetry path collides with a built-in route: {telemetry_path}"
            )));
        }

        Ok(Self {
            registry,
            telemetry_path,
        })
    }
}

pub fn exporter_router(state: Arc<ExporterState>) -> Router {
    Router::new()
        .route(LANDING_PATH, get(handlers::index::landing_page))
        .route(HEALTH_LIVE_PATH, get(handlers::health::health_live))
        .route(
            &state.telemetry_path,
            get(handlers::metrics::prometheus_metrics),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::{
        handlers::metrics::TEXT_FORMAT_CONTENT_TYPE,
        metrics::{CollectStatus, Collector, ConstSample, MetricDescriptor, SampleSink},
    };

    struct NatGatewayStub {
        descriptor: Arc<MetricDescriptor>,
    }

    #[async_trait]
    impl Collector for NatGatewayStub {
        fn name(&self) -> &str {
            "nat"
        }

        fn describe(&self) -> Vec<Arc<MetricDescriptor>> {
            vec![Arc::clone(&self.descriptor)]
        }

        async fn collect(&self, sink: &mut dyn SampleSink) -> CollectStatus {
            if let Ok(sample) = ConstSample::new(
                &self.descriptor,
                vec!["1234".to_string(), "ngw-1".to_string()],
                42.0,
            ) {
                sink.emit(sample);
            }
            CollectStatus::Complete
        }
    }

    fn router(path: &str) -> Router {
        let registry = Arc::new(MetricsRegistry::new());
        registry
            .register_collector(Arc::new(NatGatewayStub {
                descriptor: Arc::new(MetricDescriptor::gauge(
                    "aliyun_nat_session_active_connection",
                    "Concurrent connections, Count",
                    &["user_id", "instance_id"],
                )),
            }))
            .unwrap();
        exporter_router(Arc::new(ExporterState::new(registry, path).unwrap()))
    }

    #[tokio::test]
    async fn serves_text_exposition_on_telemetry_path() {
        let response = router("/metrics")
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            TEXT_FORMAT_CONTENT_TYPE
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains(
            "aliyun_nat_session_active_connection{user_id=\"1234\",instance_id=\"ngw-1\"} 42\n"
        ));
    }

    #[tokio::test]
    async fn landing_page_links_custom_path() {
        let response = router("/scrape")
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("href='/scrape'"));
    }

    #[tokio::test]
    async fn liveness_is_ok() {
        let response = router("/metrics")
            .oneshot(Request::get("/health/live").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn rejects_relative_telemetry_path() {
        let registry = Arc::new(MetricsRegistry::new());
        assert!(ExporterState::new(Arc::clone(&registry), "metrics").is_err());
        assert!(ExporterState::new(registry, "/").is_err());
    }

    #[test]
    fn rejects_telemetry_path_on_builtin_route() {
        let registry = Arc::new(MetricsRegistry::new());
        let err = ExporterState::new(Arc::clone(&registry), "/health/live")
            .err()
            .unwrap();
        assert!(matches!(err, ExporterError::InvalidArgument(_)));
        assert!(ExporterState::new(registry, "/health").is_ok());
    }
}

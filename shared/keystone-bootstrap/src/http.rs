//! Runtime HTTP surface
//!
//! `/health` returns the evaluated report (503 when overall Unhealthy),
//! `/health-ui` the aggregated dashboard view, `/metrics` the Prometheus
//! text exposition. Each endpoint is mounted only when its capability was
//! requested at bootstrap.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use keystone_core::Capability;
use keystone_health::{HealthRegistry, ProbeStatus};
use keystone_telemetry::{MetricSet, ResourceDescriptor};
use serde_json::json;

use crate::facade::BootstrapHandle;

#[derive(Clone)]
struct HttpState {
    resource: Arc<ResourceDescriptor>,
    health: Arc<HealthRegistry>,
    metrics: MetricSet,
}

/// Build the platform router for a bootstrapped service.
pub fn router(handle: &BootstrapHandle) -> Router {
    let state = HttpState {
        resource: Arc::clone(handle.resource()),
        health: Arc::clone(handle.health()),
        metrics: handle.metrics().clone(),
    };

    let mut router = Router::new();
    if handle.has_capability(Capability::Health) {
        router = router
            .route("/health", get(health))
            .route("/health-ui", get(health_ui));
    }
    if handle.has_capability(Capability::ScrapeEndpoint) {
        router = router.route("/metrics", get(metrics));
    }
    router.with_state(state)
}

async fn health(State(state): State<HttpState>) -> impl IntoResponse {
    let report = state.health.evaluate().await;
    let code = if report.status == ProbeStatus::Unhealthy {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (code, Json(report))
}

async fn health_ui(State(state): State<HttpState>) -> impl IntoResponse {
    let report = state.health.evaluate().await;
    let count =
        |status: ProbeStatus| report.probes.iter().filter(|p| p.status == status).count();
    let (healthy, degraded, unhealthy) = (
        count(ProbeStatus::Healthy),
        count(ProbeStatus::Degraded),
        count(ProbeStatus::Unhealthy),
    );
    Json(json!({
        "service": state.resource.service_name(),
        "version": state.resource.service_version(),
        "status": report.status,
        "totals": {
            "probes": report.probes.len(),
            "healthy": healthy,
            "degraded": degraded,
            "unhealthy": unhealthy,
        },
        "probes": report.probes,
        "generated_at": report.generated_at,
    }))
}

async fn metrics(State(state): State<HttpState>) -> impl IntoResponse {
    let prefix = state.resource.service_name().replace('-', "_");
    let body = state.metrics.render_prometheus(&prefix);
    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
}

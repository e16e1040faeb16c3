//! Orders API
//!
//! Reference service on the keystone bootstrap stack: full capability set,
//! datastore + custom health probes, platform endpoints next to a business
//! route.

use std::sync::Arc;

use axum::routing::get;
use axum::Json;
use keystone_bootstrap::{BootstrapBuilder, DatastoreConfig, PgConnectivity, ServiceRuntime};
use keystone_core::BootstrapConfig;
use keystone_health::{FnProbe, ProbeOutcome};
use keystone_telemetry::{sources, ExporterSpec, SignalKind};
use serde_json::json;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> keystone_core::Result<()> {
    let config = BootstrapConfig::from_env();
    let otlp_endpoint = config.otlp_endpoint.clone();

    let handle = BootstrapBuilder::new(config).with_all_capabilities().build();

    // A second init path touching the same pipeline is harmless: both the
    // source and the exporter pass through the dedup gates.
    if let Some(pipeline) = handle.pipeline(SignalKind::Trace) {
        pipeline.add_source(sources::HTTP_SERVER);
        if let Some(endpoint) = otlp_endpoint {
            pipeline.add_exporter(ExporterSpec::push(endpoint));
        }
    }

    match PgConnectivity::connect(&DatastoreConfig::from_env()) {
        Ok(connectivity) => {
            if let Err(e) = handle.register_datastore(connectivity) {
                warn!(error = %e, "datastore probe not registered");
            }
        }
        Err(e) => warn!(error = %e, "datastore pool unavailable; probe skipped"),
    }

    if let Err(e) = handle.register_probe(Arc::new(FnProbe::new("order-queue", || async {
        ProbeOutcome::healthy("queue drained")
    }))) {
        warn!(error = %e, "order-queue probe not registered");
    }

    let requests = handle
        .metrics()
        .counter("requests_total", "Total HTTP requests");

    let app = keystone_bootstrap::router(&handle).route(
        "/orders",
        get(move || {
            let requests = requests.clone();
            async move {
                requests.inc();
                Json(json!({ "orders": [] }))
            }
        }),
    );

    let bind = std::env::var("HTTP_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    info!(bind = %bind, "starting orders-api");
    ServiceRuntime::run(handle, app, &bind).await
}

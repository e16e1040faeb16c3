//! Process-wide logger lifecycle
//!
//! One structured-logging subscriber per process, installed exactly once by
//! the bootstrap facade. Re-initialization degrades to a warning and an
//! inert handle. When a push endpoint is configured the OTLP tracing layer
//! is stacked onto the same subscriber.

use std::sync::atomic::{AtomicBool, Ordering};

use keystone_core::{BootstrapConfig, KeystoneError, Result};
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::resource::ResourceDescriptor;

static LOGGER_INSTALLED: AtomicBool = AtomicBool::new(false);

/// Guard for the process-wide logging pipeline.
///
/// Dropping an active handle shuts the OTLP tracer provider down. Inert
/// handles (returned on re-initialization) do nothing on drop.
pub struct LoggerHandle {
    active: bool,
    otlp: bool,
}

impl LoggerHandle {
    pub fn is_active(&self) -> bool {
        self.active
    }

    fn inert() -> Self {
        Self {
            active: false,
            otlp: false,
        }
    }
}

impl Drop for LoggerHandle {
    fn drop(&mut self) {
        if self.active && self.otlp {
            opentelemetry::global::shutdown_tracer_provider();
        }
    }
}

/// Install the process-wide subscriber: env-filtered fmt layer (json or
/// plain per config) plus the OTLP layer when an endpoint is configured.
pub fn init_logging(
    config: &BootstrapConfig,
    resource: &ResourceDescriptor,
) -> Result<LoggerHandle> {
    if LOGGER_INSTALLED.swap(true, Ordering::SeqCst) {
        warn!("logging already initialized; ignoring re-initialization");
        return Ok(LoggerHandle::inert());
    }

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let otel_layer = match &config.otlp_endpoint {
        Some(endpoint) => Some(
            tracing_opentelemetry::layer().with_tracer(install_otlp_tracer(endpoint, resource)?),
        ),
        None => None,
    };
    let otlp = otel_layer.is_some();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(otel_layer);

    let init_result = if config.json_logs {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true);
        registry.with(fmt_layer).try_init()
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);
        registry.with(fmt_layer).try_init()
    };

    if let Err(e) = init_result {
        // A host-installed subscriber already exists; keep using it.
        warn!(error = %e, "subscriber already set; keeping existing logger");
        return Ok(LoggerHandle::inert());
    }

    info!(
        service = resource.service_name(),
        version = resource.service_version(),
        log_level = %config.log_level,
        json_logs = config.json_logs,
        otlp = otlp,
        "Logging initialized"
    );

    Ok(LoggerHandle { active: true, otlp })
}

fn install_otlp_tracer(
    endpoint: &str,
    resource: &ResourceDescriptor,
) -> Result<opentelemetry_sdk::trace::Tracer> {
    opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());

    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint.to_string()),
        )
        .with_trace_config(
            opentelemetry_sdk::trace::config()
                .with_resource(opentelemetry_sdk::Resource::new(otel_attributes(resource))),
        )
        .install_batch(opentelemetry_sdk::runtime::Tokio)
        .map_err(|e| KeystoneError::Telemetry(e.to_string()))
}

fn otel_attributes(resource: &ResourceDescriptor) -> Vec<KeyValue> {
    let mut attributes = vec![
        KeyValue::new("service.name", resource.service_name().to_string()),
        KeyValue::new("service.version", resource.service_version().to_string()),
    ];
    for (key, value) in resource.attributes() {
        attributes.push(KeyValue::new(key.clone(), value.clone()));
    }
    attributes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otel_attributes_carry_identity_first() {
        let config = BootstrapConfig::default().with_attribute("region", "eu-west-1");
        let resource = ResourceDescriptor::build(&config);
        let attributes = otel_attributes(&resource);
        assert_eq!(attributes[0].key.as_str(), "service.name");
        assert_eq!(attributes[1].key.as_str(), "service.version");
        assert_eq!(attributes[2].key.as_str(), "region");
    }

    #[test]
    fn second_init_returns_inert_handle() {
        let config = BootstrapConfig::default();
        let resource = ResourceDescriptor::build(&config);
        let _first = init_logging(&config, &resource).unwrap();
        let second = init_logging(&config, &resource).unwrap();
        assert!(!second.is_active());
    }
}

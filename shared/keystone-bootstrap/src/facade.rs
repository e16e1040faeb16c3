//! Bootstrap facade
//!
//! One composable builder replaces the per-concern setup functions: it takes
//! the explicit capability list, composes exactly that subset, and returns a
//! handle bundling the pipelines, metric set, health registry, and logger.
//! Composition is non-throwing; configuration problems degrade to warnings.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use keystone_core::{BootstrapConfig, Capability};
use keystone_health::{
    ConnectivityCheck, DatastoreProbe, HealthError, HealthProbe, HealthRegistry,
};
use keystone_telemetry::{
    init_logging, sources, DrainOutcome, ExporterFlush, ExporterSpec, LoggerHandle, MetricSet,
    PipelineComposer, PipelineHandle, ResourceDescriptor, SignalKind,
};
use tracing::{info, warn};

pub struct BootstrapBuilder {
    config: BootstrapConfig,
    capabilities: BTreeSet<Capability>,
    flusher: Option<Arc<dyn ExporterFlush>>,
}

impl BootstrapBuilder {
    pub fn new(config: BootstrapConfig) -> Self {
        Self {
            config,
            capabilities: BTreeSet::new(),
            flusher: None,
        }
    }

    /// Request a capability. Requests form a set; repeats are no-ops.
    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.insert(capability);
        self
    }

    pub fn with_capabilities(mut self, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        self.capabilities.extend(capabilities);
        self
    }

    pub fn with_all_capabilities(self) -> Self {
        self.with_capabilities(Capability::all())
    }

    /// Replace the exporter flush implementation used at drain time.
    pub fn with_flusher(mut self, flusher: Arc<dyn ExporterFlush>) -> Self {
        self.flusher = Some(flusher);
        self
    }

    /// Compose the requested subset. Never fails: anything that cannot be
    /// wired (subscriber already set, exporter unreachable) is logged and
    /// skipped, because telemetry must not block the host.
    pub fn build(self) -> BootstrapHandle {
        let resource = Arc::new(ResourceDescriptor::build(&self.config));

        let logger = if self.capabilities.contains(&Capability::Logging) {
            match init_logging(&self.config, &resource) {
                Ok(handle) => Some(handle),
                Err(e) => {
                    warn!(error = %e, "logging initialization degraded; continuing");
                    None
                }
            }
        } else {
            None
        };

        let mut composer = PipelineComposer::new(Arc::clone(&resource));
        if let Some(flusher) = self.flusher {
            composer = composer.with_flusher(flusher);
        }

        if self.capabilities.contains(&Capability::Tracing) {
            let pipeline = composer.pipeline(SignalKind::Trace);
            pipeline.add_source(sources::HTTP_SERVER);
            pipeline.add_source(sources::HTTP_CLIENT);
            pipeline.add_source(sources::DATASTORE);
            match &self.config.otlp_endpoint {
                Some(endpoint) => pipeline.add_exporter(ExporterSpec::push(endpoint.clone())),
                None => pipeline.add_exporter(ExporterSpec::debug()),
            };
        }

        if self.capabilities.contains(&Capability::Metrics) {
            let pipeline = composer.pipeline(SignalKind::Metric);
            pipeline.add_source(sources::HTTP_SERVER);
            if self.capabilities.contains(&Capability::ScrapeEndpoint) {
                pipeline.add_exporter(ExporterSpec::pull());
            } else {
                pipeline.add_exporter(ExporterSpec::debug());
            }
        }

        if self.capabilities.contains(&Capability::Logging) {
            let pipeline = composer.pipeline(SignalKind::Log);
            pipeline.add_exporter(ExporterSpec::debug());
        }

        let health = Arc::new(HealthRegistry::new(self.config.probe_timeout));

        info!(
            service = resource.service_name(),
            capabilities = ?self.capabilities,
            "bootstrap composed"
        );

        BootstrapHandle {
            resource,
            capabilities: self.capabilities,
            composer,
            metrics: MetricSet::new(),
            health,
            logger,
            shutdown_timeout: self.config.shutdown_timeout,
        }
    }
}

/// Compose every capability. Documented precondition: once per process.
pub fn bootstrap(config: BootstrapConfig) -> BootstrapHandle {
    BootstrapBuilder::new(config).with_all_capabilities().build()
}

/// Everything a bootstrapped service owns, released together at shutdown.
pub struct BootstrapHandle {
    resource: Arc<ResourceDescriptor>,
    capabilities: BTreeSet<Capability>,
    composer: PipelineComposer,
    metrics: MetricSet,
    health: Arc<HealthRegistry>,
    logger: Option<LoggerHandle>,
    shutdown_timeout: Duration,
}

impl BootstrapHandle {
    pub fn resource(&self) -> &Arc<ResourceDescriptor> {
        &self.resource
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn composer(&self) -> &PipelineComposer {
        &self.composer
    }

    /// Pipeline for `signal` if that capability was composed.
    pub fn pipeline(&self, signal: SignalKind) -> Option<Arc<PipelineHandle>> {
        self.composer.get(signal)
    }

    pub fn metrics(&self) -> &MetricSet {
        &self.metrics
    }

    pub fn health(&self) -> &Arc<HealthRegistry> {
        &self.health
    }

    /// Register a named probe; duplicate names are rejected.
    pub fn register_probe(&self, probe: Arc<dyn HealthProbe>) -> Result<(), HealthError> {
        self.health.register(probe)
    }

    /// Register the datastore connectivity probe under its conventional
    /// name (`database-context`).
    pub fn register_datastore<C>(&self, connectivity: C) -> Result<(), HealthError>
    where
        C: ConnectivityCheck + 'static,
    {
        self.health.register(Arc::new(DatastoreProbe::new(connectivity)))
    }

    /// Freeze the pipelines; the process is about to accept traffic.
    pub fn start(&self) {
        self.composer.activate();
        info!(service = self.resource.service_name(), "pipelines active");
    }

    /// Drain and close every pipeline, then release the logger.
    pub async fn shutdown(self) -> DrainOutcome {
        let outcome = self.composer.shutdown(self.shutdown_timeout).await;
        if !outcome.abandoned.is_empty() {
            warn!(
                abandoned = outcome.abandoned.len(),
                "exporters abandoned at shutdown"
            );
        }
        info!(
            service = self.resource.service_name(),
            flushed = outcome.flushed.len(),
            "bootstrap shut down"
        );
        outcome
        // logger handle drops here, closing the tracer provider last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystone_health::DATASTORE_PROBE_NAME;
    use keystone_telemetry::ExporterKind;

    struct AlwaysDown;

    #[async_trait::async_trait]
    impl ConnectivityCheck for AlwaysDown {
        async fn check_connectivity(&self) -> bool {
            false
        }
    }

    fn orders_config() -> BootstrapConfig {
        let mut config = BootstrapConfig::default();
        config.service_name = "orders-api".to_string();
        config.otlp_endpoint = Some("https://collector:4317".to_string());
        config
    }

    #[test]
    fn repeated_capability_requests_compose_once() {
        let handle = BootstrapBuilder::new(orders_config())
            .with_capability(Capability::Tracing)
            .with_capability(Capability::Tracing)
            .with_capabilities([Capability::Tracing, Capability::Health])
            .build();

        let pipeline = handle.pipeline(SignalKind::Trace).unwrap();
        assert_eq!(pipeline.exporter_specs().len(), 1);
        assert_eq!(
            pipeline.instrument_keys(),
            vec!["http-server", "http-client", "datastore"]
        );
    }

    #[test]
    fn repeated_exporter_registration_is_merged() {
        let handle = BootstrapBuilder::new(orders_config())
            .with_capability(Capability::Tracing)
            .build();

        // A second configuration path registering the same exporter.
        let pipeline = handle.pipeline(SignalKind::Trace).unwrap();
        pipeline.add_exporter(ExporterSpec::push("https://collector:4317"));

        let specs = pipeline.exporter_specs();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].kind, ExporterKind::Push);
    }

    #[test]
    fn duplicate_datastore_probe_is_rejected() {
        let handle = BootstrapBuilder::new(orders_config())
            .with_capability(Capability::Health)
            .build();

        assert!(handle.register_datastore(AlwaysDown).is_ok());
        let err = handle.register_datastore(AlwaysDown).unwrap_err();
        assert!(
            matches!(err, HealthError::DuplicateProbeName(name) if name == DATASTORE_PROBE_NAME)
        );
        assert_eq!(handle.health().len(), 1);
    }

    #[test]
    fn two_bootstraps_stay_independent() {
        let first = BootstrapBuilder::new(orders_config())
            .with_capability(Capability::Tracing)
            .build();
        let second = BootstrapBuilder::new(orders_config())
            .with_capability(Capability::Tracing)
            .build();

        first
            .pipeline(SignalKind::Trace)
            .unwrap()
            .add_source("batch-worker");
        assert!(!second
            .pipeline(SignalKind::Trace)
            .unwrap()
            .instrument_keys()
            .contains(&"batch-worker".to_string()));
    }

    #[tokio::test]
    async fn shutdown_reports_drained_exporters() {
        let handle = BootstrapBuilder::new(orders_config())
            .with_capability(Capability::Tracing)
            .with_capability(Capability::Metrics)
            .build();
        handle.start();

        let outcome = handle.shutdown().await;
        assert!(outcome.abandoned.is_empty());
        assert_eq!(outcome.flushed.len(), 2);
    }
}

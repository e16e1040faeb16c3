//! Pipeline composer
//!
//! One logical pipeline per signal type, merged from potentially overlapping
//! configuration calls. Composition is commutative and idempotent: any
//! permutation or repetition of calls with the same distinct instrument keys
//! and exporter specs produces an observably identical pipeline.
//!
//! Per-signal lifecycle: Uninitialized -> Composing -> Active -> Draining
//! -> Closed. Additions after activation are a configuration warning, not a
//! failure; telemetry must never block business traffic.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::exporter::{DefaultFlush, ExporterChain, ExporterFlush, ExporterSpec};
use crate::registry::InstrumentationRegistry;
use crate::resource::ResourceDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    Trace,
    Metric,
    Log,
}

impl SignalKind {
    pub fn all() -> [SignalKind; 3] {
        [SignalKind::Trace, SignalKind::Metric, SignalKind::Log]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Trace => "trace",
            SignalKind::Metric => "metric",
            SignalKind::Log => "log",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Uninitialized,
    Composing,
    Active,
    Draining,
    Closed,
}

/// Per-signal aggregate owning its instrumentation sources and exporter
/// chain, bound to the shared resource descriptor.
pub struct PipelineHandle {
    signal: SignalKind,
    resource: Arc<ResourceDescriptor>,
    instruments: InstrumentationRegistry,
    exporters: ExporterChain,
    state: Mutex<PipelineState>,
}

impl PipelineHandle {
    fn new(signal: SignalKind, resource: Arc<ResourceDescriptor>) -> Self {
        Self {
            signal,
            resource,
            instruments: InstrumentationRegistry::new(),
            exporters: ExporterChain::new(),
            state: Mutex::new(PipelineState::Composing),
        }
    }

    pub fn signal(&self) -> SignalKind {
        self.signal
    }

    pub fn resource(&self) -> &ResourceDescriptor {
        &self.resource
    }

    pub fn state(&self) -> PipelineState {
        *self.state.lock()
    }

    /// Register an instrumentation source. Idempotent; returns whether this
    /// was the first registration. After activation the call is a warning
    /// no-op.
    pub fn add_source(&self, key: &str) -> bool {
        if !self.composing("instrumentation source", key) {
            return false;
        }
        let first = self.instruments.register(key);
        if !first {
            debug!(signal = self.signal.as_str(), key, "source already registered");
        }
        first
    }

    /// Append an exporter spec through the structural-equality dedup gate.
    /// After activation the call is a warning no-op.
    pub fn add_exporter(&self, spec: ExporterSpec) -> bool {
        if !self.composing("exporter", spec.kind.as_str()) {
            return false;
        }
        let appended = self.exporters.add(spec);
        if !appended {
            debug!(signal = self.signal.as_str(), "exporter already registered");
        }
        appended
    }

    pub fn instrument_keys(&self) -> Vec<String> {
        self.instruments.keys()
    }

    pub fn exporter_specs(&self) -> Vec<ExporterSpec> {
        self.exporters.specs()
    }

    fn composing(&self, what: &str, detail: &str) -> bool {
        let state = *self.state.lock();
        if state == PipelineState::Composing {
            return true;
        }
        warn!(
            signal = self.signal.as_str(),
            what,
            detail,
            state = ?state,
            "pipeline is frozen; registration ignored"
        );
        false
    }

    fn transition(&self, to: PipelineState) {
        *self.state.lock() = to;
    }
}

/// Result of draining the exporter chains at shutdown.
#[derive(Debug, Default)]
pub struct DrainOutcome {
    pub flushed: Vec<(SignalKind, ExporterSpec)>,
    pub abandoned: Vec<(SignalKind, ExporterSpec)>,
}

/// Merges repeated configuration calls into one pipeline per signal type.
pub struct PipelineComposer {
    resource: Arc<ResourceDescriptor>,
    pipelines: Mutex<BTreeMap<SignalKind, Arc<PipelineHandle>>>,
    flusher: Arc<dyn ExporterFlush>,
}

impl PipelineComposer {
    pub fn new(resource: Arc<ResourceDescriptor>) -> Self {
        Self {
            resource,
            pipelines: Mutex::new(BTreeMap::new()),
            flusher: Arc::new(DefaultFlush),
        }
    }

    /// Replace the flush implementation used at drain time.
    pub fn with_flusher(mut self, flusher: Arc<dyn ExporterFlush>) -> Self {
        self.flusher = flusher;
        self
    }

    pub fn resource(&self) -> &Arc<ResourceDescriptor> {
        &self.resource
    }

    /// Pipeline for `signal`, allocated on first touch
    /// (Uninitialized -> Composing).
    pub fn pipeline(&self, signal: SignalKind) -> Arc<PipelineHandle> {
        let mut pipelines = self.pipelines.lock();
        pipelines
            .entry(signal)
            .or_insert_with(|| {
                debug!(signal = signal.as_str(), "composing pipeline");
                Arc::new(PipelineHandle::new(signal, Arc::clone(&self.resource)))
            })
            .clone()
    }

    /// Pipeline for `signal` if it was ever composed.
    pub fn get(&self, signal: SignalKind) -> Option<Arc<PipelineHandle>> {
        self.pipelines.lock().get(&signal).cloned()
    }

    /// Freeze every composed pipeline (Composing -> Active). Called when the
    /// hosting process begins accepting traffic.
    pub fn activate(&self) {
        for handle in self.pipelines.lock().values() {
            handle.transition(PipelineState::Active);
            debug!(signal = handle.signal().as_str(), "pipeline active");
        }
    }

    /// Drain all exporter chains concurrently, each flush bounded by
    /// `deadline`. A slow or unresponsive exporter is abandoned after the
    /// deadline without blocking the others (Active -> Draining -> Closed).
    pub async fn shutdown(&self, deadline: Duration) -> DrainOutcome {
        let handles: Vec<Arc<PipelineHandle>> =
            self.pipelines.lock().values().cloned().collect();
        for handle in &handles {
            handle.transition(PipelineState::Draining);
        }

        let mut flushes = Vec::new();
        for handle in &handles {
            for spec in handle.exporter_specs() {
                let flusher = Arc::clone(&self.flusher);
                let signal = handle.signal();
                flushes.push(async move {
                    let result =
                        tokio::time::timeout(deadline, flusher.flush(&spec)).await;
                    (signal, spec, result)
                });
            }
        }

        let mut outcome = DrainOutcome::default();
        for (signal, spec, result) in join_all(flushes).await {
            match result {
                Ok(Ok(())) => outcome.flushed.push((signal, spec)),
                Ok(Err(e)) => {
                    warn!(signal = signal.as_str(), error = %e, "exporter flush failed");
                    outcome.abandoned.push((signal, spec));
                }
                Err(_) => {
                    warn!(
                        signal = signal.as_str(),
                        deadline_ms = deadline.as_millis() as u64,
                        "exporter flush exceeded deadline; abandoned"
                    );
                    outcome.abandoned.push((signal, spec));
                }
            }
        }

        for handle in &handles {
            handle.transition(PipelineState::Closed);
        }
        outcome
    }
}

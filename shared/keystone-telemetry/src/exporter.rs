//! Exporter chain
//!
//! Ordered list of sinks per signal type. Structural equality dedup: two
//! exporters with identical (kind, endpoint, protocol) collapse to one.
//! Order is preserved for deterministic assertions; each exporter receives
//! an independent copy of each signal at flush time.

use async_trait::async_trait;
use keystone_core::{KeystoneError, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExporterKind {
    /// Push-based network exporter (OTLP collector).
    Push,
    /// Pull-based scrape surface.
    Pull,
    /// Console/debug sink.
    Debug,
}

impl ExporterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExporterKind::Push => "push",
            ExporterKind::Pull => "pull",
            ExporterKind::Debug => "debug",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExporterProtocol {
    Binary,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExporterSpec {
    pub kind: ExporterKind,
    pub endpoint: Option<String>,
    pub protocol: ExporterProtocol,
}

impl ExporterSpec {
    pub fn push(endpoint: impl Into<String>) -> Self {
        Self {
            kind: ExporterKind::Push,
            endpoint: Some(endpoint.into()),
            protocol: ExporterProtocol::Binary,
        }
    }

    pub fn pull() -> Self {
        Self {
            kind: ExporterKind::Pull,
            endpoint: None,
            protocol: ExporterProtocol::Text,
        }
    }

    pub fn debug() -> Self {
        Self {
            kind: ExporterKind::Debug,
            endpoint: None,
            protocol: ExporterProtocol::Text,
        }
    }
}

/// Ordered exporter list for one signal type.
#[derive(Debug, Default)]
pub struct ExporterChain {
    entries: Mutex<Vec<ExporterSpec>>,
}

impl ExporterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `spec` unless a structurally-equal entry already exists.
    /// Returns whether the spec was appended.
    pub fn add(&self, spec: ExporterSpec) -> bool {
        let mut entries = self.entries.lock();
        if entries.contains(&spec) {
            return false;
        }
        entries.push(spec);
        true
    }

    /// Specs in registration order.
    pub fn specs(&self) -> Vec<ExporterSpec> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// Flush behavior for an exporter at drain time.
///
/// The composer drives every exporter through this trait so the OTLP
/// flusher and test doubles plug in identically.
#[async_trait]
pub trait ExporterFlush: Send + Sync {
    async fn flush(&self, spec: &ExporterSpec) -> Result<()>;
}

/// Default flusher: push exporters flush the global tracer provider;
/// pull and debug sinks hold no buffer.
#[derive(Debug, Default)]
pub struct DefaultFlush;

#[async_trait]
impl ExporterFlush for DefaultFlush {
    async fn flush(&self, spec: &ExporterSpec) -> Result<()> {
        match spec.kind {
            ExporterKind::Push => {
                // shutdown_tracer_provider blocks while batches drain
                tokio::task::spawn_blocking(opentelemetry::global::shutdown_tracer_provider)
                    .await
                    .map_err(|e| KeystoneError::Telemetry(e.to_string()))
            }
            ExporterKind::Pull | ExporterKind::Debug => Ok(()),
        }
    }
}

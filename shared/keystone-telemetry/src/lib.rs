//! Keystone Telemetry
//!
//! Composition engine for the service telemetry pipeline: resource identity,
//! instrumentation registration, exporter chains, and the per-signal pipeline
//! state machine. Repeated configuration calls are merged into one
//! deduplicated pipeline per signal type.

pub mod exporter;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod registry;
pub mod resource;

pub use exporter::{
    DefaultFlush, ExporterChain, ExporterFlush, ExporterKind, ExporterProtocol, ExporterSpec,
};
pub use logging::{init_logging, LoggerHandle};
pub use metrics::{Counter, Gauge, Histogram, MetricSet};
pub use pipeline::{DrainOutcome, PipelineComposer, PipelineHandle, PipelineState, SignalKind};
pub use registry::{sources, InstrumentationRegistry};
pub use resource::ResourceDescriptor;

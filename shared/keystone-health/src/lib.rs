//! Keystone Health
//!
//! Deduplicating registry of named health probes with one concurrent
//! evaluation entry point. Duplicate probe names are rejected, never
//! silently collapsed; a slow or failing probe degrades its own row in the
//! report without aborting the evaluation.

pub mod probe;
pub mod registry;
pub mod types;

pub use probe::{ConnectivityCheck, DatastoreProbe, FnProbe, HealthProbe, DATASTORE_PROBE_NAME};
pub use registry::HealthRegistry;
pub use types::{HealthError, HealthReport, ProbeKind, ProbeOutcome, ProbeRecord, ProbeStatus};

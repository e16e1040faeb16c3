//! Keystone Bootstrap
//!
//! The single entry point a service calls to join the platform telemetry
//! and health stack. Composes structured logging, tracing, metrics, and
//! health probes into one deduplicated pipeline set, and exposes the
//! runtime HTTP surface (`/health`, `/health-ui`, `/metrics`).
//!
//! Call [`bootstrap`] (or [`BootstrapBuilder`] for a subset of
//! capabilities) exactly once per process; repeated calls yield independent
//! pipelines that are never merged across calls.

pub mod datastore;
pub mod facade;
pub mod http;
pub mod runtime;

pub use datastore::{DatastoreConfig, PgConnectivity};
pub use facade::{bootstrap, BootstrapBuilder, BootstrapHandle};
pub use http::router;
pub use runtime::ServiceRuntime;

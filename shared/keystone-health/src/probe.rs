//! Probe contracts
//!
//! A probe is a named, side-effect-free check. The datastore contract is
//! deliberately narrow so the registry never depends on a specific storage
//! technology.

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use std::future::Future;

use crate::types::{ProbeKind, ProbeOutcome};

/// Conventional name for the datastore connectivity probe.
pub const DATASTORE_PROBE_NAME: &str = "database-context";

#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Unique probe name; the registry rejects duplicates.
    fn name(&self) -> &str;

    fn kind(&self) -> ProbeKind {
        ProbeKind::Custom
    }

    /// Run the check. Must be side-effect free.
    async fn check(&self) -> ProbeOutcome;
}

/// Adapter turning an async closure into a probe.
pub struct FnProbe {
    name: String,
    check: Box<dyn Fn() -> BoxFuture<'static, ProbeOutcome> + Send + Sync>,
}

impl FnProbe {
    pub fn new<F, Fut>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ProbeOutcome> + Send + 'static,
    {
        Self {
            name: name.into(),
            check: Box::new(move || Box::pin(check())),
        }
    }
}

#[async_trait]
impl HealthProbe for FnProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> ProbeOutcome {
        (self.check)().await
    }
}

/// Narrow datastore contract: can a connection be established right now?
#[async_trait]
pub trait ConnectivityCheck: Send + Sync {
    async fn check_connectivity(&self) -> bool;
}

/// Datastore probe over any [`ConnectivityCheck`] implementation.
pub struct DatastoreProbe<C> {
    name: String,
    connectivity: C,
}

impl<C: ConnectivityCheck> DatastoreProbe<C> {
    pub fn new(connectivity: C) -> Self {
        Self {
            name: DATASTORE_PROBE_NAME.to_string(),
            connectivity,
        }
    }

    pub fn named(name: impl Into<String>, connectivity: C) -> Self {
        Self {
            name: name.into(),
            connectivity,
        }
    }
}

#[async_trait]
impl<C: ConnectivityCheck> HealthProbe for DatastoreProbe<C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProbeKind {
        ProbeKind::Datastore
    }

    async fn check(&self) -> ProbeOutcome {
        if self.connectivity.check_connectivity().await {
            ProbeOutcome::healthy("connection established")
        } else {
            ProbeOutcome::unhealthy("connection failed")
        }
    }
}

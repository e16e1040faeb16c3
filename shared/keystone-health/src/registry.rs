//! Health registry
//!
//! Ordered probe set with rejected duplicate names and a single concurrent
//! evaluation entry point. Two differently-behaving checks colliding under
//! one name would hide a real dependency from the report, so a duplicate is
//! an error, unlike the silent idempotence of instrumentation keys.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use parking_lot::Mutex;
use tracing::warn;

use crate::probe::HealthProbe;
use crate::types::{HealthError, HealthReport, ProbeOutcome, ProbeRecord};

pub struct HealthRegistry {
    probes: Mutex<Vec<Arc<dyn HealthProbe>>>,
    probe_timeout: Duration,
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl HealthRegistry {
    pub fn new(probe_timeout: Duration) -> Self {
        Self {
            probes: Mutex::new(Vec::new()),
            probe_timeout,
        }
    }

    /// Register a probe. A duplicate name is rejected and logged; the
    /// existing probe stays registered.
    pub fn register(&self, probe: Arc<dyn HealthProbe>) -> Result<(), HealthError> {
        let mut probes = self.probes.lock();
        if probes.iter().any(|p| p.name() == probe.name()) {
            warn!(name = probe.name(), "duplicate health probe rejected");
            return Err(HealthError::DuplicateProbeName(probe.name().to_string()));
        }
        probes.push(probe);
        Ok(())
    }

    /// Probe names in registration order.
    pub fn probe_names(&self) -> Vec<String> {
        self.probes.lock().iter().map(|p| p.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.probes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.lock().is_empty()
    }

    /// Evaluate every probe concurrently, each under the per-probe timeout.
    ///
    /// A timed-out probe is recorded Unhealthy with a timeout message; its
    /// underlying check keeps running detached and is ignored. A panicking
    /// probe is recorded Unhealthy with the failure message. Neither aborts
    /// the report.
    pub async fn evaluate(&self) -> HealthReport {
        let probes: Vec<Arc<dyn HealthProbe>> = self.probes.lock().clone();
        let budget = self.probe_timeout;

        let checks = probes.into_iter().map(|probe| async move {
            let started = Instant::now();
            let task = tokio::spawn({
                let probe = Arc::clone(&probe);
                async move { probe.check().await }
            });
            let outcome = match tokio::time::timeout(budget, task).await {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(join_error)) => {
                    ProbeOutcome::unhealthy(format!("probe failed: {}", join_error))
                }
                Err(_) => ProbeOutcome::unhealthy(format!(
                    "timed out after {}ms",
                    budget.as_millis()
                )),
            };
            ProbeRecord {
                name: probe.name().to_string(),
                kind: probe.kind(),
                status: outcome.status,
                duration_ms: started.elapsed().as_millis() as u64,
                message: outcome.message,
            }
        });

        HealthReport::from_records(join_all(checks).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{FnProbe, DATASTORE_PROBE_NAME};
    use crate::types::ProbeStatus;

    fn probe(name: &str, status: ProbeStatus) -> Arc<dyn HealthProbe> {
        let outcome = ProbeOutcome {
            status,
            message: "checked".to_string(),
        };
        Arc::new(FnProbe::new(name, move || {
            let outcome = outcome.clone();
            async move { outcome }
        }))
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let registry = HealthRegistry::default();
        assert!(registry
            .register(probe(DATASTORE_PROBE_NAME, ProbeStatus::Healthy))
            .is_ok());
        let err = registry
            .register(probe(DATASTORE_PROBE_NAME, ProbeStatus::Unhealthy))
            .unwrap_err();
        assert!(matches!(err, HealthError::DuplicateProbeName(name) if name == DATASTORE_PROBE_NAME));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn overall_status_is_the_worst_probe() {
        let cases = [
            (ProbeStatus::Healthy, ProbeStatus::Degraded, ProbeStatus::Degraded),
            (ProbeStatus::Healthy, ProbeStatus::Unhealthy, ProbeStatus::Unhealthy),
            (ProbeStatus::Healthy, ProbeStatus::Healthy, ProbeStatus::Healthy),
        ];
        for (first, second, expected) in cases {
            let registry = HealthRegistry::default();
            registry.register(probe("first", first)).unwrap();
            registry.register(probe("second", second)).unwrap();
            assert_eq!(registry.evaluate().await.status, expected);
        }
    }

    #[tokio::test]
    async fn report_rows_keep_registration_order() {
        let registry = HealthRegistry::default();
        registry.register(probe("b", ProbeStatus::Healthy)).unwrap();
        registry.register(probe("a", ProbeStatus::Healthy)).unwrap();

        let report = registry.evaluate().await;
        let names: Vec<&str> = report.probes.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn hung_probe_times_out_without_delaying_others() {
        let registry = HealthRegistry::new(Duration::from_millis(100));
        registry
            .register(Arc::new(FnProbe::new("stuck", || async {
                futures_util::future::pending::<()>().await;
                ProbeOutcome::healthy("unreachable")
            })))
            .unwrap();
        registry.register(probe("fast", ProbeStatus::Healthy)).unwrap();

        let started = Instant::now();
        let report = registry.evaluate().await;

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(report.status, ProbeStatus::Unhealthy);
        let stuck = &report.probes[0];
        assert_eq!(stuck.name, "stuck");
        assert_eq!(stuck.status, ProbeStatus::Unhealthy);
        assert!(stuck.message.contains("timed out"));
        assert_eq!(report.probes[1].status, ProbeStatus::Healthy);
    }

    #[tokio::test]
    async fn panicking_probe_is_recorded_not_propagated() {
        let registry = HealthRegistry::default();
        registry
            .register(Arc::new(FnProbe::new("exploding", || async { panic!("boom") })))
            .unwrap();
        registry.register(probe("fast", ProbeStatus::Healthy)).unwrap();

        let report = registry.evaluate().await;
        assert_eq!(report.probes[0].status, ProbeStatus::Unhealthy);
        assert!(report.probes[0].message.contains("probe failed"));
        assert_eq!(report.probes[1].status, ProbeStatus::Healthy);
    }
}

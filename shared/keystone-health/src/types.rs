//! Health probe types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a single probe or of the whole report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl ProbeStatus {
    fn rank(self) -> u8 {
        match self {
            ProbeStatus::Healthy => 0,
            ProbeStatus::Degraded => 1,
            ProbeStatus::Unhealthy => 2,
        }
    }

    /// The worse of the two statuses.
    pub fn worst(self, other: ProbeStatus) -> ProbeStatus {
        if other.rank() > self.rank() {
            other
        } else {
            self
        }
    }

    pub fn is_operational(&self) -> bool {
        matches!(self, ProbeStatus::Healthy | ProbeStatus::Degraded)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    Datastore,
    Custom,
}

/// What a probe reports back from one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub status: ProbeStatus,
    pub message: String,
}

impl ProbeOutcome {
    pub fn healthy(message: impl Into<String>) -> Self {
        Self {
            status: ProbeStatus::Healthy,
            message: message.into(),
        }
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            status: ProbeStatus::Degraded,
            message: message.into(),
        }
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            status: ProbeStatus::Unhealthy,
            message: message.into(),
        }
    }
}

/// One evaluated probe row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeRecord {
    pub name: String,
    pub kind: ProbeKind,
    pub status: ProbeStatus,
    pub duration_ms: u64,
    pub message: String,
}

/// Aggregated result of evaluating every registered probe.
///
/// Row order is registration order; overall status is the worst row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: ProbeStatus,
    pub generated_at: DateTime<Utc>,
    pub probes: Vec<ProbeRecord>,
}

impl HealthReport {
    pub fn from_records(probes: Vec<ProbeRecord>) -> Self {
        let status = probes
            .iter()
            .fold(ProbeStatus::Healthy, |acc, record| acc.worst(record.status));
        Self {
            status,
            generated_at: Utc::now(),
            probes,
        }
    }
}

/// Registration errors.
#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    #[error("duplicate probe name: {0}")]
    DuplicateProbeName(String),
}

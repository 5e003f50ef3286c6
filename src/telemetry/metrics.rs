//! Metrics
//!
//! Authorization server metrics interfaces and implementations.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Metric labels.
pub type MetricLabels = HashMap<String, String>;

/// Authorization server metrics interface.
pub trait ServerMetrics: Send + Sync {
    /// Record authorization endpoint request.
    fn record_authorization_request(&self, response_type: &str);

    /// Record token endpoint request.
    fn record_token_request(&self, grant_type: &str);

    /// Record an issued credential.
    fn record_token_issued(&self, kind: &str);

    /// Record token revocation.
    fn record_token_revocation(&self, found: bool);

    /// Record token introspection.
    fn record_token_introspection(&self, active: bool);

    /// Record a protocol error returned by an endpoint.
    fn record_error(&self, endpoint: &str, error_code: &str);

    /// Record an authorization code replay.
    fn record_replay_detected(&self, revoked: usize);

    /// Record bearer token validation.
    fn record_bearer_validation(&self, success: bool);
}

/// No-op metrics implementation.
pub struct NoOpMetrics;

impl ServerMetrics for NoOpMetrics {
    fn record_authorization_request(&self, _response_type: &str) {}
    fn record_token_request(&self, _grant_type: &str) {}
    fn record_token_issued(&self, _kind: &str) {}
    fn record_token_revocation(&self, _found: bool) {}
    fn record_token_introspection(&self, _active: bool) {}
    fn record_error(&self, _endpoint: &str, _error_code: &str) {}
    fn record_replay_detected(&self, _revoked: usize) {}
    fn record_bearer_validation(&self, _success: bool) {}
}

/// No-op metrics singleton.
pub fn no_op_metrics() -> NoOpMetrics {
    NoOpMetrics
}

/// Metric entry for in-memory storage.
#[derive(Debug, Clone)]
pub struct MetricEntry {
    pub name: String,
    pub value: f64,
    pub labels: MetricLabels,
    pub timestamp: u64,
}

/// In-memory metrics for testing.
pub struct InMemoryMetrics {
    entries: Mutex<Vec<MetricEntry>>,
}

impl InMemoryMetrics {
    /// Create new in-memory metrics.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, Vec<MetricEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get all recorded entries.
    pub fn get_entries(&self) -> Vec<MetricEntry> {
        self.entries().clone()
    }

    /// Get entries by name.
    pub fn get_entries_by_name(&self, name: &str) -> Vec<MetricEntry> {
        self.entries()
            .iter()
            .filter(|e| e.name == name)
            .cloned()
            .collect()
    }

    /// Sum of the values recorded under `name` with a matching label.
    pub fn total(&self, name: &str, label: &str, value: &str) -> f64 {
        self.entries()
            .iter()
            .filter(|e| e.name == name && e.labels.get(label).map(String::as_str) == Some(value))
            .map(|e| e.value)
            .sum()
    }

    /// Clear all entries.
    pub fn clear(&self) {
        self.entries().clear();
    }

    fn record(&self, name: &str, value: f64, labels: &[(&str, String)]) {
        let timestamp = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let labels = labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();

        self.entries().push(MetricEntry {
            name: name.to_string(),
            value,
            labels,
            timestamp,
        });
    }
}

impl Default for InMemoryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerMetrics for InMemoryMetrics {
    fn record_authorization_request(&self, response_type: &str) {
        self.record(
            "oauth2_authorization_requests_total",
            1.0,
            &[("response_type", response_type.to_string())],
        );
    }

    fn record_token_request(&self, grant_type: &str) {
        self.record(
            "oauth2_token_requests_total",
            1.0,
            &[("grant_type", grant_type.to_string())],
        );
    }

    fn record_token_issued(&self, kind: &str) {
        self.record("oauth2_tokens_issued_total", 1.0, &[("kind", kind.to_string())]);
    }

    fn record_token_revocation(&self, found: bool) {
        self.record(
            "oauth2_token_revocations_total",
            1.0,
            &[("found", found.to_string())],
        );
    }

    fn record_token_introspection(&self, active: bool) {
        self.record(
            "oauth2_token_introspections_total",
            1.0,
            &[("active", active.to_string())],
        );
    }

    fn record_error(&self, endpoint: &str, error_code: &str) {
        self.record(
            "oauth2_errors_total",
            1.0,
            &[
                ("endpoint", endpoint.to_string()),
                ("error_code", error_code.to_string()),
            ],
        );
    }

    fn record_replay_detected(&self, revoked: usize) {
        self.record("oauth2_code_replays_total", 1.0, &[]);
        self.record("oauth2_replay_revoked_credentials", revoked as f64, &[]);
    }

    fn record_bearer_validation(&self, success: bool) {
        self.record(
            "oauth2_bearer_validations_total",
            1.0,
            &[("success", success.to_string())],
        );
    }
}

/// Create in-memory metrics for testing.
pub fn create_in_memory_metrics() -> InMemoryMetrics {
    InMemoryMetrics::new()
}

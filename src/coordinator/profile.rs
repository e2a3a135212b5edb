//! Agent profiles: capabilities, status, and performance tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::directory::AgentIdentifier;

/// A named skill an agent advertises, used for task-to-agent matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCapability {
    pub name: String,
    pub description: String,
    /// Optional JSON schema describing expected input
    pub input_schema: Option<Value>,
    /// Optional JSON schema describing produced output
    pub output_schema: Option<Value>,
}

impl AgentCapability {
    /// Create a capability with no schemas.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: None,
            output_schema: None,
        }
    }
}

/// Availability state of an agent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Active,
    Busy,
    Offline,
}

/// Rolling performance record fed by observed outcomes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceRecord {
    /// Success ratio, always kept within [0, 1]
    pub success_rate: f64,
    /// Running mean of observed response times in milliseconds
    pub average_response_ms: f64,
    /// Number of observed task outcomes
    pub total_tasks: u64,
    /// Number of timed responses folded into the mean
    pub timed_responses: u64,
}

impl Default for PerformanceRecord {
    fn default() -> Self {
        Self {
            success_rate: 1.0,
            average_response_ms: 0.0,
            total_tasks: 0,
            timed_responses: 0,
        }
    }
}

impl PerformanceRecord {
    /// Nudge the success rate toward 1 for one more observed success.
    pub fn record_success(&mut self) {
        self.total_tasks += 1;
        let n = self.total_tasks as f64;
        self.success_rate = ((self.success_rate * (n - 1.0)) + 1.0) / n;
        self.clamp();
    }

    /// Nudge the success rate toward 0 for one more observed failure.
    pub fn record_failure(&mut self) {
        self.total_tasks += 1;
        let n = self.total_tasks as f64;
        self.success_rate = (self.success_rate * (n - 1.0)) / n;
        self.clamp();
    }

    /// Fold a measured response time into the running mean.
    pub fn record_response_time(&mut self, elapsed_ms: f64) {
        self.timed_responses += 1;
        let n = self.timed_responses as f64;
        self.average_response_ms = ((self.average_response_ms * (n - 1.0)) + elapsed_ms) / n;
    }

    fn clamp(&mut self) {
        self.success_rate = self.success_rate.clamp(0.0, 1.0);
    }
}

/// Everything the coordinator knows about a registered agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    pub identifier: AgentIdentifier,
    pub capabilities: Vec<AgentCapability>,
    pub status: AgentStatus,
    pub performance: PerformanceRecord,
    /// Tags granting a scoring bonus, distinct from hard capability matching
    pub specialization: Vec<String>,
    /// Registration order; selection ties resolve to the lowest sequence
    pub sequence: u64,
    pub registered_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl AgentProfile {
    /// Build a fresh profile: full success rate, zero tasks, active.
    pub fn new(
        identifier: AgentIdentifier,
        capabilities: Vec<AgentCapability>,
        specialization: Vec<String>,
        sequence: u64,
    ) -> Self {
        let now = Utc::now();
        Self {
            identifier,
            capabilities,
            status: AgentStatus::Active,
            performance: PerformanceRecord::default(),
            specialization,
            sequence,
            registered_at: now,
            last_active: now,
        }
    }

    /// Agent name (the identifier's unique key).
    pub fn name(&self) -> &str {
        &self.identifier.name
    }

    /// Whether the capability set is a superset of the requirement.
    pub fn covers(&self, required: &[String]) -> bool {
        required
            .iter()
            .all(|need| self.capabilities.iter().any(|c| &c.name == need))
    }

    /// Whether any required capability name appears in the specialization tags.
    pub fn specializes_in(&self, required: &[String]) -> bool {
        required
            .iter()
            .any(|need| self.specialization.iter().any(|tag| tag == need))
    }

    /// Refresh the last-active timestamp.
    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_profile_defaults() {
        let profile = AgentProfile::new(
            AgentIdentifier::new("writer"),
            vec![AgentCapability::new("summarize", "Summarize documents")],
            vec!["text".to_string()],
            0,
        );

        assert_eq!(profile.status, AgentStatus::Active);
        assert_eq!(profile.performance.success_rate, 1.0);
        assert_eq!(profile.performance.total_tasks, 0);
    }

    #[test]
    fn capability_superset_check() {
        let profile = AgentProfile::new(
            AgentIdentifier::new("writer"),
            vec![
                AgentCapability::new("summarize", ""),
                AgentCapability::new("translate", ""),
            ],
            vec![],
            0,
        );

        assert!(profile.covers(&["summarize".to_string()]));
        assert!(profile.covers(&["summarize".to_string(), "translate".to_string()]));
        assert!(!profile.covers(&["summarize".to_string(), "draw".to_string()]));
        assert!(profile.covers(&[]));
    }

    #[test]
    fn success_and_failure_nudges() {
        let mut record = PerformanceRecord::default();

        record.record_failure();
        assert_eq!(record.total_tasks, 1);
        assert!((record.success_rate - 0.0).abs() < f64::EPSILON);

        record.record_success();
        assert_eq!(record.total_tasks, 2);
        assert!((record.success_rate - 0.5).abs() < 1e-9);

        record.record_success();
        assert!((record.success_rate - (2.0 / 3.0)).abs() < 1e-9);
        assert!(record.success_rate <= 1.0 && record.success_rate >= 0.0);
    }

    #[test]
    fn response_time_running_mean() {
        let mut record = PerformanceRecord::default();
        record.record_response_time(100.0);
        record.record_response_time(300.0);
        assert!((record.average_response_ms - 200.0).abs() < 1e-9);
    }
}

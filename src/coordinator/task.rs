//! Coordination tasks and the priority-ordered pending queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Task urgency tiers; assignment drains Critical first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low = 0,
    Medium = 1,
    High = 2,
    Critical = 3,
}

impl Default for TaskPriority {
    fn default() -> Self {
        Self::Medium
    }
}

/// Task lifecycle: pending → assigned → in-progress → completed | failed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Assigned,
    InProgress,
    Completed,
    Failed,
}

/// A unit of work routed to one or more agents.
///
/// Retained after completion for metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinationTask {
    /// Unique task ID (ULID)
    pub id: String,
    pub description: String,
    /// Capability names an assignee must cover
    pub required_capabilities: Vec<String>,
    pub priority: TaskPriority,
    pub deadline: Option<DateTime<Utc>>,
    /// Empty exactly while the task is pending
    pub assigned_agents: Vec<String>,
    pub status: TaskStatus,
    pub result: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl CoordinationTask {
    /// Create a pending task.
    pub fn new(
        description: impl Into<String>,
        required_capabilities: Vec<String>,
        priority: TaskPriority,
        deadline: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            description: description.into(),
            required_capabilities,
            priority,
            deadline,
            assigned_agents: Vec::new(),
            status: TaskStatus::Pending,
            result: None,
            created_at: Utc::now(),
            started_at: None,
            ended_at: None,
        }
    }

    /// Move to Assigned with the chosen agents.
    pub fn assign(&mut self, agents: Vec<String>) {
        self.assigned_agents = agents;
        self.status = TaskStatus::Assigned;
    }

    /// Move to InProgress, stamping the start time.
    pub fn start(&mut self) {
        self.status = TaskStatus::InProgress;
        self.started_at = Some(Utc::now());
    }

    /// Move to Completed with a result, stamping the end time.
    pub fn complete(&mut self, result: Value) {
        self.status = TaskStatus::Completed;
        self.result = Some(result);
        self.ended_at = Some(Utc::now());
    }

    /// Move to Failed, stamping the end time.
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.status = TaskStatus::Failed;
        self.result = Some(Value::String(reason.into()));
        self.ended_at = Some(Utc::now());
    }

    /// Duration in milliseconds, when both start and end are stamped.
    pub fn duration_ms(&self) -> Option<i64> {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds()),
            _ => None,
        }
    }
}

/// Insert a task ID into a priority-ordered queue.
///
/// Higher tiers come first; within a tier insertion order is preserved, so
/// ties resolve first-in-first-out by construction rather than by accident.
pub fn insert_by_priority(
    queue: &mut Vec<String>,
    task_id: &str,
    priority: TaskPriority,
    priority_of: impl Fn(&str) -> TaskPriority,
) {
    let position = queue
        .iter()
        .position(|queued| priority_of(queued) < priority)
        .unwrap_or(queue.len());
    queue.insert(position, task_id.to_string());
}

//! Agent coordinator: capability registry, task queue, scoring, execution.
//!
//! The coordinator owns every mutable registry (profiles, tasks, pending
//! queue) and fronts the directory for registration and messaging, so all
//! shared state is reached through its methods.

pub mod profile;
pub mod scoring;
pub mod strategy;
pub mod task;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::Settings;
use crate::directory::{AgentDirectory, AgentIdentifier};
use crate::error::{Error, Result};
use crate::events::{CoordinationEvent, EventBus};
use crate::interaction::{call_for_proposals, FirstProposal, ProposalRanking};
use crate::protocol::{AclMessage, MessageBuilder, Performative};

pub use profile::{AgentCapability, AgentProfile, AgentStatus, PerformanceRecord};
pub use strategy::{AgentExecutor, ExecutionStrategy, StepOutcome, StrategyOutcome};
pub use task::{CoordinationTask, TaskPriority, TaskStatus};

/// Name the coordinator signs its own messages with.
const COORDINATOR_NAME: &str = "coordinator";

/// Read-only aggregate over one agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMetrics {
    pub name: String,
    pub status: AgentStatus,
    pub success_rate: f64,
    pub average_response_ms: f64,
    pub total_tasks: u64,
    pub capabilities: Vec<String>,
    pub specialization: Vec<String>,
    pub last_active: DateTime<Utc>,
}

/// Read-only aggregate over the whole coordination core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinationStats {
    pub total_agents: usize,
    pub active_agents: usize,
    pub total_tasks: usize,
    pub pending_tasks: usize,
    pub assigned_tasks: usize,
    pub in_progress_tasks: usize,
    pub completed_tasks: usize,
    pub failed_tasks: usize,
    /// Completed over all terminal tasks; 0 when nothing finished yet
    pub completion_rate: f64,
    /// Mean over tasks with both start and end stamps
    pub average_task_duration_ms: Option<f64>,
}

/// Result of a task negotiation round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegotiationOutcome {
    pub conversation_id: String,
    /// Sender name of the winning proposal
    pub winner: Option<String>,
    pub proposals: usize,
}

/// The coordination core.
pub struct Coordinator {
    settings: Settings,
    directory: Arc<AgentDirectory>,
    events: EventBus,
    profiles: RwLock<HashMap<String, AgentProfile>>,
    tasks: RwLock<HashMap<String, CoordinationTask>>,
    pending: Mutex<Vec<String>>,
    next_sequence: AtomicU64,
}

impl Coordinator {
    /// Create a coordinator with its own directory and event bus.
    pub fn new(settings: Settings) -> Self {
        let events = EventBus::new(settings.events.channel_capacity);
        let directory = Arc::new(AgentDirectory::new(&settings, events.clone()));
        Self {
            settings,
            directory,
            events,
            profiles: RwLock::new(HashMap::new()),
            tasks: RwLock::new(HashMap::new()),
            pending: Mutex::new(Vec::new()),
            next_sequence: AtomicU64::new(0),
        }
    }

    /// The underlying directory, for direct messaging and lookups.
    pub fn directory(&self) -> &Arc<AgentDirectory> {
        &self.directory
    }

    /// Subscribe to coordination events.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<CoordinationEvent> {
        self.events.subscribe()
    }

    // ---- agent registry ----

    /// Register an agent: fresh profile (full success rate, zero tasks,
    /// active) plus a directory entry carrying the specialization tags.
    pub fn register_agent(
        &self,
        name: &str,
        capabilities: Vec<AgentCapability>,
        specialization: Vec<String>,
    ) -> AgentProfile {
        let mut identifier = AgentIdentifier::new(name);
        if !specialization.is_empty() {
            identifier = identifier.with_property("specialization", specialization.join(","));
        }

        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        let profile = AgentProfile::new(identifier.clone(), capabilities, specialization, sequence);

        self.directory.register(identifier);
        self.profiles
            .write()
            .unwrap()
            .insert(name.to_string(), profile.clone());

        tracing::info!(agent = %name, sequence, "Agent registered");
        self.events.publish(CoordinationEvent::AgentRegistered {
            profile: profile.clone(),
        });
        profile
    }

    /// Remove an agent's profile and directory entry.
    pub fn unregister_agent(&self, name: &str) -> bool {
        let removed = self.profiles.write().unwrap().remove(name).is_some();
        self.directory.unregister(name);
        if removed {
            tracing::info!(agent = %name, "Agent unregistered");
            self.events.publish(CoordinationEvent::AgentUnregistered {
                name: name.to_string(),
            });
        }
        removed
    }

    /// Update an agent's availability.
    pub fn set_agent_status(&self, name: &str, status: AgentStatus) -> Result<()> {
        let mut profiles = self.profiles.write().unwrap();
        let profile = profiles
            .get_mut(name)
            .ok_or_else(|| Error::not_found(format!("agent {}", name)))?;
        profile.status = status;
        profile.touch();
        Ok(())
    }

    /// Snapshot one agent's profile.
    pub fn profile(&self, name: &str) -> Option<AgentProfile> {
        self.profiles.read().unwrap().get(name).cloned()
    }

    // ---- tasks ----

    /// Create a pending task, enqueue it by priority, and immediately try to
    /// assign it. Returns the post-assignment snapshot.
    pub fn create_task(
        &self,
        description: &str,
        required_capabilities: Vec<String>,
        priority: TaskPriority,
        deadline: Option<DateTime<Utc>>,
    ) -> Result<CoordinationTask> {
        let task = CoordinationTask::new(description, required_capabilities, priority, deadline);
        let task_id = task.id.clone();

        {
            let mut tasks = self.tasks.write().unwrap();
            let mut pending = self.pending.lock().unwrap();
            task::insert_by_priority(&mut pending, &task_id, priority, |queued| {
                tasks.get(queued).map(|t| t.priority).unwrap_or(TaskPriority::Low)
            });
            tasks.insert(task_id.clone(), task.clone());
        }

        tracing::info!(task = %task_id, priority = ?priority, "Task created");
        self.events
            .publish(CoordinationEvent::TaskCreated { task });

        self.assign_task(&task_id)?;
        Ok(self.task(&task_id).expect("task just inserted"))
    }

    /// Try to assign a pending task to the best-scoring capable agent.
    ///
    /// Returns `Ok(false)` without mutating anything when the task already
    /// left Pending, or when no suitable, available agent exists — the task
    /// then stays pending and retry is the caller's responsibility.
    pub fn assign_task(&self, task_id: &str) -> Result<bool> {
        let required = {
            let tasks = self.tasks.read().unwrap();
            let task = tasks
                .get(task_id)
                .ok_or_else(|| Error::not_found(format!("task {}", task_id)))?;
            if task.status != TaskStatus::Pending {
                return Ok(false);
            }
            task.required_capabilities.clone()
        };

        // Suitable: capability superset. Available: currently active.
        // Candidates sorted by registration sequence so score ties resolve
        // to the first-encountered agent.
        let winner = {
            let profiles = self.profiles.read().unwrap();
            let mut candidates: Vec<AgentProfile> = profiles
                .values()
                .filter(|p| p.covers(&required))
                .filter(|p| p.status == AgentStatus::Active)
                .cloned()
                .collect();
            candidates.sort_by_key(|p| p.sequence);

            match scoring::select_best(&candidates, &required, &self.settings.scoring) {
                Some((profile, score)) => {
                    tracing::debug!(task = %task_id, winner = %profile.name(), score, "Assignment winner");
                    profile.name().to_string()
                }
                None => {
                    tracing::debug!(task = %task_id, "No suitable, available agent");
                    return Ok(false);
                }
            }
        };

        let snapshot = {
            let mut tasks = self.tasks.write().unwrap();
            let task = tasks
                .get_mut(task_id)
                .ok_or_else(|| Error::not_found(format!("task {}", task_id)))?;
            task.assign(vec![winner.clone()]);
            self.pending.lock().unwrap().retain(|queued| queued != task_id);
            task.clone()
        };

        let assignment = MessageBuilder::new(Performative::Request, COORDINATOR_NAME)
            .to(&winner)
            .protocol("task-assignment")
            .content(json!({
                "task_id": snapshot.id,
                "description": snapshot.description,
                "required_capabilities": snapshot.required_capabilities,
                "priority": snapshot.priority,
            }))
            .conversation(crate::protocol::new_conversation_id())
            .reply_with(crate::protocol::new_reply_id())
            .build();
        self.directory.send(assignment)?;

        tracing::info!(task = %task_id, agent = %winner, "Task assigned");
        self.events
            .publish(CoordinationEvent::TaskAssigned { task: snapshot });
        Ok(true)
    }

    /// Caller-driven transition: Assigned → InProgress.
    pub fn start_task(&self, task_id: &str) -> Result<()> {
        let mut tasks = self.tasks.write().unwrap();
        let task = tasks
            .get_mut(task_id)
            .ok_or_else(|| Error::not_found(format!("task {}", task_id)))?;
        if task.status != TaskStatus::Assigned {
            return Err(Error::validation(format!(
                "task {} is {:?}, expected assigned",
                task_id, task.status
            )));
        }
        task.start();
        Ok(())
    }

    /// Caller-driven transition to Completed.
    pub fn complete_task(&self, task_id: &str, result: serde_json::Value) -> Result<()> {
        self.finish_task(task_id, Some(result), None)
    }

    /// Caller-driven transition to Failed.
    pub fn fail_task(&self, task_id: &str, reason: &str) -> Result<()> {
        self.finish_task(task_id, None, Some(reason.to_string()))
    }

    fn finish_task(
        &self,
        task_id: &str,
        result: Option<serde_json::Value>,
        failure: Option<String>,
    ) -> Result<()> {
        let mut tasks = self.tasks.write().unwrap();
        let task = tasks
            .get_mut(task_id)
            .ok_or_else(|| Error::not_found(format!("task {}", task_id)))?;
        if !matches!(task.status, TaskStatus::Assigned | TaskStatus::InProgress) {
            return Err(Error::validation(format!(
                "task {} is {:?}, expected assigned or in-progress",
                task_id, task.status
            )));
        }
        if task.started_at.is_none() {
            task.start();
        }
        match failure {
            Some(reason) => task.fail(reason),
            None => task.complete(result.unwrap_or(serde_json::Value::Null)),
        }
        Ok(())
    }

    /// Snapshot one task.
    pub fn task(&self, task_id: &str) -> Option<CoordinationTask> {
        self.tasks.read().unwrap().get(task_id).cloned()
    }

    // ---- collaboration ----

    /// Run a task across an explicit agent list, bypassing capability
    /// matching.
    ///
    /// This is the one path where the core itself executes, so the task is
    /// driven through its full lifecycle here: Assigned → InProgress →
    /// Completed/Failed. Observed per-agent durations and outcomes feed the
    /// performance records.
    pub async fn execute_collaborative_task(
        &self,
        description: &str,
        agent_names: &[String],
        strategy: ExecutionStrategy,
        executor: Arc<dyn AgentExecutor>,
    ) -> Result<CoordinationTask> {
        {
            let profiles = self.profiles.read().unwrap();
            for name in agent_names {
                if !profiles.contains_key(name) {
                    return Err(Error::not_found(format!("agent {}", name)));
                }
            }
        }

        let mut task = CoordinationTask::new(description, Vec::new(), TaskPriority::Medium, None);
        let task_id = task.id.clone();
        self.events
            .publish(CoordinationEvent::TaskCreated { task: task.clone() });

        task.assign(agent_names.to_vec());
        task.start();
        self.tasks
            .write()
            .unwrap()
            .insert(task_id.clone(), task.clone());
        self.events.publish(CoordinationEvent::TaskAssigned { task });

        let outcome = strategy::run(strategy, agent_names, description, executor).await;
        self.record_strategy_feedback(&outcome);

        let snapshot = {
            let mut tasks = self.tasks.write().unwrap();
            let task = tasks
                .get_mut(&task_id)
                .ok_or_else(|| Error::not_found(format!("task {}", task_id)))?;
            if outcome.succeeded {
                task.complete(json!({
                    "strategy": outcome.strategy,
                    "results": outcome.results,
                    "final": outcome.final_result,
                }));
            } else {
                let reason = outcome
                    .steps
                    .iter()
                    .find_map(|s| s.error.clone())
                    .unwrap_or_else(|| "collaborative execution failed".to_string());
                task.fail(reason);
            }
            task.clone()
        };

        tracing::info!(
            task = %task_id,
            strategy = ?strategy,
            succeeded = outcome.succeeded,
            "Collaborative task finished"
        );
        Ok(snapshot)
    }

    fn record_strategy_feedback(&self, outcome: &StrategyOutcome) {
        let mut profiles = self.profiles.write().unwrap();
        for step in &outcome.steps {
            if let Some(profile) = profiles.get_mut(&step.agent) {
                profile.performance.record_response_time(step.elapsed_ms);
                if step.succeeded() {
                    profile.performance.record_success();
                } else {
                    profile.performance.record_failure();
                }
                profile.touch();
            }
        }
    }

    // ---- negotiation ----

    /// Contract-Net with the default first-proposal-wins policy.
    pub async fn negotiate_task(
        &self,
        initiator: &str,
        participants: &[String],
        description: &str,
    ) -> Result<NegotiationOutcome> {
        self.negotiate_task_with(initiator, participants, description, &FirstProposal)
            .await
    }

    /// Contract-Net with a caller-supplied ranking policy.
    pub async fn negotiate_task_with(
        &self,
        initiator: &str,
        participants: &[String],
        description: &str,
        ranking: &dyn ProposalRanking,
    ) -> Result<NegotiationOutcome> {
        let resolved: Vec<String> = {
            let profiles = self.profiles.read().unwrap();
            if !profiles.contains_key(initiator) {
                return Err(Error::not_found(format!("agent {}", initiator)));
            }
            participants
                .iter()
                .filter(|p| {
                    let known = profiles.contains_key(p.as_str());
                    if !known {
                        tracing::warn!(agent = %p, "Skipping unknown negotiation participant");
                    }
                    known
                })
                .cloned()
                .collect()
        };
        if resolved.is_empty() {
            return Err(Error::not_found(
                "no registered participants for negotiation".to_string(),
            ));
        }

        let window = Duration::from_millis(self.settings.negotiation.default_timeout_ms);
        let outcome = call_for_proposals(
            &self.directory,
            initiator,
            &resolved,
            json!({"task": description}),
            window,
            ranking,
        )
        .await?;

        Ok(NegotiationOutcome {
            conversation_id: outcome.conversation_id,
            winner: outcome.selected.map(|m| m.sender),
            proposals: outcome.proposals.len(),
        })
    }

    // ---- messaging ----

    /// Republish a message through the directory on behalf of an agent,
    /// refreshing its last-active stamp and folding performative-keyed
    /// feedback into its performance record.
    pub fn process_message(&self, agent_name: &str, message: AclMessage) -> Result<String> {
        {
            let mut profiles = self.profiles.write().unwrap();
            let profile = profiles
                .get_mut(agent_name)
                .ok_or_else(|| Error::not_found(format!("agent {}", agent_name)))?;
            profile.touch();
            // Keyed purely off the performative, not verified correctness.
            if message.performative.is_positive_terminal() {
                profile.performance.record_success();
            } else if message.performative.is_negative_terminal() {
                profile.performance.record_failure();
            }
        }

        let conversation_id = self.directory.send(message.clone())?;
        self.events.publish(CoordinationEvent::MessageProcessed {
            agent: agent_name.to_string(),
            message,
        });
        Ok(conversation_id)
    }

    // ---- read-only aggregates ----

    /// Snapshot of one conversation.
    pub fn conversation(&self, id: &str) -> Option<crate::directory::ConversationContext> {
        self.directory.conversation(id)
    }

    /// Snapshots of every conversation an agent participated in.
    pub fn agent_conversations(&self, name: &str) -> Vec<crate::directory::ConversationContext> {
        self.directory.conversations_for(name)
    }

    /// Per-agent metrics snapshot.
    pub fn agent_metrics(&self, name: &str) -> Option<AgentMetrics> {
        let profiles = self.profiles.read().unwrap();
        profiles.get(name).map(|p| AgentMetrics {
            name: p.name().to_string(),
            status: p.status,
            success_rate: p.performance.success_rate,
            average_response_ms: p.performance.average_response_ms,
            total_tasks: p.performance.total_tasks,
            capabilities: p.capabilities.iter().map(|c| c.name.clone()).collect(),
            specialization: p.specialization.clone(),
            last_active: p.last_active,
        })
    }

    /// Whole-core statistics snapshot.
    pub fn coordination_stats(&self) -> CoordinationStats {
        let profiles = self.profiles.read().unwrap();
        let tasks = self.tasks.read().unwrap();

        let mut stats = CoordinationStats {
            total_agents: profiles.len(),
            active_agents: profiles
                .values()
                .filter(|p| p.status == AgentStatus::Active)
                .count(),
            total_tasks: tasks.len(),
            pending_tasks: 0,
            assigned_tasks: 0,
            in_progress_tasks: 0,
            completed_tasks: 0,
            failed_tasks: 0,
            completion_rate: 0.0,
            average_task_duration_ms: None,
        };

        let mut durations = Vec::new();
        for task in tasks.values() {
            match task.status {
                TaskStatus::Pending => stats.pending_tasks += 1,
                TaskStatus::Assigned => stats.assigned_tasks += 1,
                TaskStatus::InProgress => stats.in_progress_tasks += 1,
                TaskStatus::Completed => stats.completed_tasks += 1,
                TaskStatus::Failed => stats.failed_tasks += 1,
            }
            if let Some(ms) = task.duration_ms() {
                durations.push(ms as f64);
            }
        }

        let terminal = stats.completed_tasks + stats.failed_tasks;
        if terminal > 0 {
            stats.completion_rate = stats.completed_tasks as f64 / terminal as f64;
        }
        if !durations.is_empty() {
            stats.average_task_duration_ms =
                Some(durations.iter().sum::<f64>() / durations.len() as f64);
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    fn coordinator() -> Coordinator {
        Coordinator::new(Settings::default())
    }

    fn capability(name: &str) -> AgentCapability {
        AgentCapability::new(name, format!("{} capability", name))
    }

    struct Echo;

    #[async_trait]
    impl AgentExecutor for Echo {
        async fn execute(&self, agent: &str, input: &str) -> crate::error::Result<String> {
            Ok(format!("{}:{}", agent, input))
        }
    }

    #[test]
    fn task_assigned_to_capable_agent() {
        let coordinator = coordinator();
        coordinator.register_agent("writer", vec![capability("summarize")], vec![]);

        let task = coordinator
            .create_task(
                "summarize doc",
                vec!["summarize".to_string()],
                TaskPriority::High,
                None,
            )
            .unwrap();

        assert_eq!(task.status, TaskStatus::Assigned);
        assert_eq!(task.assigned_agents, vec!["writer".to_string()]);

        // The winner got an assignment request in its mailbox.
        let inbox = coordinator.directory().receive("writer");
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].performative, Performative::Request);
        assert_eq!(inbox[0].protocol, "task-assignment");
    }

    #[test]
    fn task_stays_pending_without_capable_agent() {
        let coordinator = coordinator();
        coordinator.register_agent("writer", vec![capability("summarize")], vec![]);

        let task = coordinator
            .create_task(
                "translate doc",
                vec!["translate".to_string()],
                TaskPriority::Medium,
                None,
            )
            .unwrap();

        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.assigned_agents.is_empty());
    }

    #[test]
    fn higher_scoring_specialist_wins() {
        let coordinator = coordinator();
        coordinator.register_agent("a", vec![capability("x")], vec!["x".to_string()]);
        let b = coordinator.register_agent("b", vec![capability("x")], vec![]);
        // Drag b's success rate down to 0.5.
        {
            let mut profiles = coordinator.profiles.write().unwrap();
            let profile = profiles.get_mut("b").unwrap();
            profile.performance.record_failure();
            profile.performance.record_success();
        }
        assert_eq!(b.performance.total_tasks, 0);

        let task = coordinator
            .create_task("use x", vec!["x".to_string()], TaskPriority::Medium, None)
            .unwrap();

        assert_eq!(task.assigned_agents, vec!["a".to_string()]);
    }

    #[test]
    fn busy_agents_are_not_available() {
        let coordinator = coordinator();
        coordinator.register_agent("writer", vec![capability("summarize")], vec![]);
        coordinator
            .set_agent_status("writer", AgentStatus::Busy)
            .unwrap();

        let task = coordinator
            .create_task(
                "summarize doc",
                vec!["summarize".to_string()],
                TaskPriority::Medium,
                None,
            )
            .unwrap();
        assert_eq!(task.status, TaskStatus::Pending);

        // Freeing the agent lets a retry succeed.
        coordinator
            .set_agent_status("writer", AgentStatus::Active)
            .unwrap();
        assert!(coordinator.assign_task(&task.id).unwrap());
    }

    #[test]
    fn assign_task_is_idempotent_after_leaving_pending() {
        let coordinator = coordinator();
        coordinator.register_agent("writer", vec![capability("summarize")], vec![]);

        let task = coordinator
            .create_task(
                "summarize doc",
                vec!["summarize".to_string()],
                TaskPriority::Medium,
                None,
            )
            .unwrap();
        assert_eq!(task.status, TaskStatus::Assigned);

        // Repeated calls return false and leave the assignment untouched.
        assert!(!coordinator.assign_task(&task.id).unwrap());
        let snapshot = coordinator.task(&task.id).unwrap();
        assert_eq!(snapshot.assigned_agents, vec!["writer".to_string()]);
        // The single original assignment message is all the agent ever got.
        assert_eq!(coordinator.directory().receive("writer").len(), 1);
    }

    #[test]
    fn unknown_task_is_not_found() {
        let coordinator = coordinator();
        assert!(matches!(
            coordinator.assign_task("no-such-task"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn register_unregister_round_trip_clears_directory() {
        let coordinator = coordinator();
        coordinator.register_agent("writer", vec![capability("summarize")], vec![]);
        coordinator.unregister_agent("writer");

        let found = coordinator
            .directory()
            .find_agents(&crate::protocol::AgentQuery::by_name("writer"));
        assert!(found.is_empty());
        assert!(coordinator.agent_metrics("writer").is_none());
    }

    #[tokio::test]
    async fn collaborative_sequential_threads_and_completes() {
        let coordinator = coordinator();
        coordinator.register_agent("a", vec![capability("x")], vec![]);
        coordinator.register_agent("b", vec![capability("x")], vec![]);

        let task = coordinator
            .execute_collaborative_task(
                "chain it",
                &["a".to_string(), "b".to_string()],
                ExecutionStrategy::Sequential,
                Arc::new(Echo),
            )
            .await
            .unwrap();

        assert_eq!(task.status, TaskStatus::Completed);
        let result = task.result.as_ref().unwrap();
        assert_eq!(result["final"], json!("b:a:chain it"));
        assert!(task.duration_ms().is_some());

        // Outcomes fed the performance records.
        let metrics = coordinator.agent_metrics("a").unwrap();
        assert_eq!(metrics.total_tasks, 1);
        assert_eq!(metrics.success_rate, 1.0);
    }

    #[tokio::test]
    async fn collaborative_rejects_unknown_agents() {
        let coordinator = coordinator();
        coordinator.register_agent("a", vec![], vec![]);

        let result = coordinator
            .execute_collaborative_task(
                "nope",
                &["a".to_string(), "ghost".to_string()],
                ExecutionStrategy::Parallel,
                Arc::new(Echo),
            )
            .await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn negotiation_maps_winner_to_sender_name() {
        let mut settings = Settings::default();
        settings.negotiation.default_timeout_ms = 300;
        let coordinator = Arc::new(Coordinator::new(settings));
        coordinator.register_agent("initiator", vec![], vec![]);
        coordinator.register_agent("fast", vec![], vec![]);
        coordinator.register_agent("slow", vec![], vec![]);

        // "fast" bids immediately, "slow" never does.
        let directory = coordinator.directory().clone();
        tokio::spawn(async move {
            loop {
                let inbox = directory.receive("fast");
                if let Some(cfp) = inbox.iter().find(|m| m.performative == Performative::Cfp) {
                    let proposal = AclMessage::propose(
                        "fast",
                        &cfp.sender,
                        cfp.conversation_id.clone().unwrap(),
                        json!({"eta": "now"}),
                    );
                    directory.send(proposal).unwrap();
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        });

        let outcome = coordinator
            .negotiate_task(
                "initiator",
                &["fast".to_string(), "slow".to_string()],
                "index the corpus",
            )
            .await
            .unwrap();

        assert_eq!(outcome.winner.as_deref(), Some("fast"));
        assert_eq!(outcome.proposals, 1);
    }

    #[test]
    fn process_message_feeds_performance_and_republishes() {
        let coordinator = coordinator();
        coordinator.register_agent("a", vec![], vec![]);
        coordinator.register_agent("b", vec![], vec![]);

        let request = AclMessage::request("a", "b", json!("go"));
        coordinator.process_message("a", request.clone()).unwrap();

        let agree = request.reply("b", Performative::Agree);
        coordinator.process_message("b", agree).unwrap();

        let metrics = coordinator.agent_metrics("b").unwrap();
        assert_eq!(metrics.total_tasks, 1);
        assert_eq!(metrics.success_rate, 1.0);

        let refuse = request.reply("b", Performative::Refuse);
        coordinator.process_message("b", refuse).unwrap();
        let metrics = coordinator.agent_metrics("b").unwrap();
        assert_eq!(metrics.total_tasks, 2);
        assert!(metrics.success_rate < 1.0);

        // Republished messages reached b's mailbox through the directory.
        assert_eq!(coordinator.directory().receive("b").len(), 1);
    }

    #[test]
    fn stats_aggregate_tasks_and_agents() {
        let coordinator = coordinator();
        coordinator.register_agent("writer", vec![capability("summarize")], vec![]);
        coordinator
            .set_agent_status("writer", AgentStatus::Busy)
            .unwrap();
        coordinator.register_agent("critic", vec![capability("review")], vec![]);

        coordinator
            .create_task("review", vec!["review".to_string()], TaskPriority::Low, None)
            .unwrap();
        coordinator
            .create_task(
                "summarize",
                vec!["summarize".to_string()],
                TaskPriority::High,
                None,
            )
            .unwrap();

        let stats = coordinator.coordination_stats();
        assert_eq!(stats.total_agents, 2);
        assert_eq!(stats.active_agents, 1);
        assert_eq!(stats.total_tasks, 2);
        assert_eq!(stats.assigned_tasks, 1);
        assert_eq!(stats.pending_tasks, 1);
        assert!(stats.average_task_duration_ms.is_none());
    }

    #[test]
    fn caller_driven_lifecycle_transitions() {
        let coordinator = coordinator();
        coordinator.register_agent("writer", vec![capability("summarize")], vec![]);

        let task = coordinator
            .create_task(
                "summarize",
                vec!["summarize".to_string()],
                TaskPriority::Medium,
                None,
            )
            .unwrap();
        assert_eq!(task.status, TaskStatus::Assigned);

        coordinator.start_task(&task.id).unwrap();
        assert_eq!(
            coordinator.task(&task.id).unwrap().status,
            TaskStatus::InProgress
        );

        coordinator
            .complete_task(&task.id, json!("summary text"))
            .unwrap();
        let done = coordinator.task(&task.id).unwrap();
        assert_eq!(done.status, TaskStatus::Completed);

        // Terminal states reject further transitions.
        assert!(coordinator.start_task(&task.id).is_err());
        assert!(coordinator.fail_task(&task.id, "late").is_err());
    }
}

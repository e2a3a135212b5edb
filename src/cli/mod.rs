//! CLI commands for Parley using clap.
//!
//! The binary ships a scripted in-process scenario so the coordination core
//! can be exercised end to end without any real agent runtime behind it.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use serde_json::json;

use crate::config::load_settings_or_default;
use crate::coordinator::{
    AgentCapability, AgentExecutor, Coordinator, ExecutionStrategy, TaskPriority,
};
use crate::protocol::{AclMessage, Performative};

/// Parley - in-process multi-agent coordination.
#[derive(Parser)]
#[command(name = "parley")]
#[command(version = "0.1.0")]
#[command(about = "Parley - agent messaging, negotiation, and task routing", long_about = None)]
pub struct Commands {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a scripted coordination scenario end to end
    Demo,

    /// Run a Contract-Net round against simulated bidders
    Negotiate {
        /// Number of bidding agents
        #[arg(default_value_t = 3)]
        bidders: usize,
    },
}

impl Commands {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Demo => run_demo().await,
            Command::Negotiate { bidders } => run_negotiation(bidders).await,
        }
    }
}

/// Simulated agent runtime: a short pause, then a canned transformation.
struct ScriptedExecutor;

#[async_trait]
impl AgentExecutor for ScriptedExecutor {
    async fn execute(&self, agent: &str, input: &str) -> crate::error::Result<String> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(format!("[{}] handled: {}", agent, input))
    }
}

async fn run_demo() -> Result<()> {
    let settings = load_settings_or_default();
    let coordinator = Coordinator::new(settings);

    coordinator.register_agent(
        "writer",
        vec![AgentCapability::new("summarize", "Summarize documents")],
        vec!["summarize".to_string()],
    );
    coordinator.register_agent(
        "translator",
        vec![AgentCapability::new("translate", "Translate documents")],
        vec![],
    );
    coordinator.register_agent(
        "critic",
        vec![AgentCapability::new("review", "Review drafts")],
        vec![],
    );

    let assigned = coordinator.create_task(
        "summarize the quarterly report",
        vec!["summarize".to_string()],
        TaskPriority::High,
        None,
    )?;
    println!(
        "task {} -> {:?} (agents: {:?})",
        assigned.id, assigned.status, assigned.assigned_agents
    );

    let unassignable = coordinator.create_task(
        "paint a fresco",
        vec!["paint".to_string()],
        TaskPriority::Low,
        None,
    )?;
    println!(
        "task {} -> {:?} (no capable agent, stays pending)",
        unassignable.id, unassignable.status
    );

    let collaborative = coordinator
        .execute_collaborative_task(
            "draft, translate, review",
            &[
                "writer".to_string(),
                "translator".to_string(),
                "critic".to_string(),
            ],
            ExecutionStrategy::Sequential,
            Arc::new(ScriptedExecutor),
        )
        .await?;
    println!(
        "collaborative task {} -> {:?}",
        collaborative.id, collaborative.status
    );
    if let Some(result) = &collaborative.result {
        println!("  final: {}", result["final"]);
    }

    let stats = coordinator.coordination_stats();
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

async fn run_negotiation(bidders: usize) -> Result<()> {
    let mut settings = load_settings_or_default();
    settings.negotiation.default_timeout_ms = 500;
    let coordinator = Arc::new(Coordinator::new(settings));

    coordinator.register_agent("initiator", vec![], vec![]);
    let names: Vec<String> = (0..bidders).map(|i| format!("bidder-{}", i)).collect();
    for name in &names {
        coordinator.register_agent(name, vec![], vec![]);
        spawn_bidder(coordinator.clone(), name.clone());
    }

    let outcome = coordinator
        .negotiate_task("initiator", &names, "index the archive")
        .await?;
    println!(
        "negotiation {}: {} proposal(s), winner: {}",
        outcome.conversation_id,
        outcome.proposals,
        outcome.winner.as_deref().unwrap_or("none")
    );
    Ok(())
}

/// Poll the mailbox until a cfp shows up, then answer with a propose.
fn spawn_bidder(coordinator: Arc<Coordinator>, name: String) {
    tokio::spawn(async move {
        loop {
            let inbox = coordinator.directory().receive(&name);
            if let Some(cfp) = inbox.iter().find(|m| m.performative == Performative::Cfp) {
                let proposal = AclMessage::propose(
                    &name,
                    &cfp.sender,
                    cfp.conversation_id.clone().unwrap_or_default(),
                    json!({"bidder": name}),
                );
                let _ = coordinator.process_message(&name, proposal);
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    });
}

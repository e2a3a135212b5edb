//! Multi-agent execution strategies.
//!
//! The coordinator never invokes a model itself; callers supply an
//! `AgentExecutor` and the strategy decides ordering and data flow between
//! the agents.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The seam where a real agent runtime plugs in.
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    /// Run one agent against an input, returning its output.
    async fn execute(&self, agent: &str, input: &str) -> Result<String>;
}

/// How a collaborative task distributes work across its agents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStrategy {
    /// Agents in array order, each result threaded into the next input
    Sequential,
    /// All agents concurrently with no shared context
    Parallel,
    /// Staged hand-off; stages currently run strictly in order
    Pipeline,
}

/// One agent's contribution to a strategy run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutcome {
    pub agent: String,
    pub output: Option<String>,
    pub error: Option<String>,
    pub elapsed_ms: f64,
}

impl StepOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// The aggregate result of a strategy run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyOutcome {
    pub strategy: ExecutionStrategy,
    /// Outputs of agents that succeeded (non-null results only)
    pub results: Vec<String>,
    /// The last successful output for sequential flows
    pub final_result: Option<String>,
    /// Per-agent details, in agent order
    pub steps: Vec<StepOutcome>,
    pub succeeded: bool,
}

/// Run a strategy over an agent list.
pub async fn run(
    strategy: ExecutionStrategy,
    agents: &[String],
    input: &str,
    executor: Arc<dyn AgentExecutor>,
) -> StrategyOutcome {
    match strategy {
        ExecutionStrategy::Sequential => run_sequential(strategy, agents, input, executor).await,
        ExecutionStrategy::Parallel => run_parallel(agents, input, executor).await,
        // Pipeline keeps sequential semantics until overlapping stages are
        // actually required.
        ExecutionStrategy::Pipeline => run_sequential(strategy, agents, input, executor).await,
    }
}

async fn run_sequential(
    strategy: ExecutionStrategy,
    agents: &[String],
    input: &str,
    executor: Arc<dyn AgentExecutor>,
) -> StrategyOutcome {
    let mut steps = Vec::with_capacity(agents.len());
    let mut results = Vec::new();
    let mut current = input.to_string();
    let mut succeeded = true;

    for agent in agents {
        let started = Instant::now();
        match executor.execute(agent, &current).await {
            Ok(output) => {
                steps.push(StepOutcome {
                    agent: agent.clone(),
                    output: Some(output.clone()),
                    error: None,
                    elapsed_ms: started.elapsed().as_secs_f64() * 1000.0,
                });
                results.push(output.clone());
                current = output;
            }
            Err(e) => {
                tracing::warn!(agent = %agent, error = %e, "Sequential step failed, aborting chain");
                steps.push(StepOutcome {
                    agent: agent.clone(),
                    output: None,
                    error: Some(e.to_string()),
                    elapsed_ms: started.elapsed().as_secs_f64() * 1000.0,
                });
                succeeded = false;
                break;
            }
        }
    }

    StrategyOutcome {
        strategy,
        final_result: if succeeded { results.last().cloned() } else { None },
        results,
        steps,
        succeeded,
    }
}

async fn run_parallel(
    agents: &[String],
    input: &str,
    executor: Arc<dyn AgentExecutor>,
) -> StrategyOutcome {
    let mut handles = Vec::with_capacity(agents.len());
    for agent in agents {
        let executor = executor.clone();
        let agent = agent.clone();
        let input = input.to_string();
        handles.push(tokio::spawn(async move {
            let started = Instant::now();
            let result = executor.execute(&agent, &input).await;
            (agent, result, started.elapsed().as_secs_f64() * 1000.0)
        }));
    }

    // Awaiting in spawn order keeps steps/results in agent order even though
    // the executions overlap.
    let mut steps = Vec::with_capacity(agents.len());
    let mut results = Vec::new();
    for handle in handles {
        match handle.await {
            Ok((agent, Ok(output), elapsed_ms)) => {
                results.push(output.clone());
                steps.push(StepOutcome {
                    agent,
                    output: Some(output),
                    error: None,
                    elapsed_ms,
                });
            }
            Ok((agent, Err(e), elapsed_ms)) => {
                tracing::warn!(agent = %agent, error = %e, "Parallel step failed, skipping result");
                steps.push(StepOutcome {
                    agent,
                    output: None,
                    error: Some(e.to_string()),
                    elapsed_ms,
                });
            }
            Err(join_error) => {
                steps.push(StepOutcome {
                    agent: "<spawn>".to_string(),
                    output: None,
                    error: Some(join_error.to_string()),
                    elapsed_ms: 0.0,
                });
            }
        }
    }

    let succeeded = !results.is_empty() || agents.is_empty();
    StrategyOutcome {
        strategy: ExecutionStrategy::Parallel,
        final_result: results.last().cloned(),
        results,
        steps,
        succeeded,
    }
}

//! Parley library root.

pub mod cli;
pub mod config;
pub mod coordinator;
pub mod directory;
pub mod error;
pub mod events;
pub mod interaction;
pub mod logging;
pub mod protocol;

pub use cli::Commands;
pub use config::{load_settings, load_settings_or_default, Settings};
pub use coordinator::{
    AgentCapability, AgentExecutor, AgentMetrics, AgentProfile, AgentStatus, CoordinationStats,
    CoordinationTask, Coordinator, ExecutionStrategy, NegotiationOutcome, TaskPriority, TaskStatus,
};
pub use directory::{AgentDirectory, AgentIdentifier, ConversationContext};
pub use error::{Error, Result};
pub use events::{CoordinationEvent, EventBus};
pub use interaction::{call_for_proposals, request, ContractNetOutcome, FirstProposal, ProposalRanking};
pub use protocol::{AclMessage, AgentQuery, ConversationState, MessageBuilder, Performative};

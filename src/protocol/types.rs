//! Speech-act and conversation state types for the agent protocol.

use serde::{Deserialize, Serialize};

/// FIPA-ACL speech-act tags.
///
/// The performative determines protocol semantics: a typed enum makes a
/// missing or empty performative structurally impossible.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Performative {
    /// Assert a fact to the receiver
    Inform,
    /// Ask the receiver to perform an action
    Request,
    /// Ask whether a proposition holds
    QueryIf,
    /// Ask for the value of an expression
    QueryRef,
    /// Offer to perform a task under stated terms
    Propose,
    /// Accept a previously received proposal
    AcceptProposal,
    /// Decline a previously received proposal
    RejectProposal,
    /// Commit to performing a requested action
    Agree,
    /// Decline a requested action
    Refuse,
    /// Call for proposals (Contract-Net opening move)
    Cfp,
    /// Confirm a proposition the receiver was unsure about
    Confirm,
    /// Deny a proposition the receiver believed
    Disconfirm,
    /// Withdraw a previous request
    Cancel,
    /// Report that an attempted action failed
    Failure,
    /// Report that a message could not be interpreted
    NotUnderstood,
}

impl Performative {
    /// Performatives that mark a conversation as failed.
    pub fn is_negative_terminal(&self) -> bool {
        matches!(self, Performative::Refuse | Performative::Cancel)
    }

    /// Performatives that can close a conversation successfully.
    pub fn is_positive_terminal(&self) -> bool {
        matches!(self, Performative::Agree | Performative::Confirm)
    }
}

impl std::fmt::Display for Performative {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Performative::Inform => "inform",
            Performative::Request => "request",
            Performative::QueryIf => "query-if",
            Performative::QueryRef => "query-ref",
            Performative::Propose => "propose",
            Performative::AcceptProposal => "accept-proposal",
            Performative::RejectProposal => "reject-proposal",
            Performative::Agree => "agree",
            Performative::Refuse => "refuse",
            Performative::Cfp => "cfp",
            Performative::Confirm => "confirm",
            Performative::Disconfirm => "disconfirm",
            Performative::Cancel => "cancel",
            Performative::Failure => "failure",
            Performative::NotUnderstood => "not-understood",
        };
        write!(f, "{}", s)
    }
}

/// Lifecycle state of a conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    /// Messages are still being exchanged
    Active,
    /// Closed successfully
    Completed,
    /// Closed by refusal or cancellation
    Failed,
}

impl ConversationState {
    /// Completed and Failed are terminal; history is still appended.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ConversationState::Active)
    }
}

/// Criteria for directory lookups.
///
/// `name` matches as a substring; each property must match exactly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentQuery {
    pub name: Option<String>,
    #[serde(default)]
    pub properties: std::collections::HashMap<String, String>,
}

impl AgentQuery {
    /// Query by name substring only.
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            properties: std::collections::HashMap::new(),
        }
    }

    /// Add an exact-match property requirement.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

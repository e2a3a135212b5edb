//! Conversation tracking for the agent directory.
//!
//! A conversation is the ordered history of messages sharing one
//! conversation ID, together with its participant set and lifecycle state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::protocol::{AclMessage, ConversationState};

/// Context for one conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationContext {
    /// Conversation ID (key)
    pub id: String,

    /// Interaction protocol of the opening message
    pub protocol: String,

    /// Union of senders and receivers of all messages, in first-seen order
    pub participants: Vec<String>,

    /// Lifecycle state; transitions are terminal
    pub state: ConversationState,

    /// Ordered message history (send order)
    pub messages: Vec<AclMessage>,

    /// When the conversation started
    pub created_at: DateTime<Utc>,

    /// Last activity timestamp
    pub last_activity: DateTime<Utc>,
}

impl ConversationContext {
    /// Create a conversation from its first message's metadata.
    pub fn new(id: impl Into<String>, protocol: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            protocol: protocol.into(),
            participants: Vec::new(),
            state: ConversationState::Active,
            messages: Vec::new(),
            created_at: now,
            last_activity: now,
        }
    }

    /// Append a message: extends history, refreshes activity, updates the
    /// participant set, and applies performative-driven state transitions.
    ///
    /// Refuse/Cancel force the state to Failed. Agree/Confirm complete the
    /// conversation once it holds more than two messages — a heuristic
    /// terminal-detection rule, not full protocol verification. Terminal
    /// states never transition again; history is still retained.
    pub fn record(&mut self, message: AclMessage) {
        self.add_participant(&message.sender);
        for receiver in &message.receivers {
            self.add_participant(receiver);
        }

        let performative = message.performative;
        self.messages.push(message);
        self.last_activity = Utc::now();

        if self.state.is_terminal() {
            return;
        }
        if performative.is_negative_terminal() {
            self.state = ConversationState::Failed;
        } else if performative.is_positive_terminal() && self.messages.len() > 2 {
            self.state = ConversationState::Completed;
        }
    }

    /// Whether an agent has appeared in this conversation.
    pub fn involves(&self, agent: &str) -> bool {
        self.participants.iter().any(|p| p == agent)
    }

    fn add_participant(&mut self, agent: &str) {
        if !self.participants.iter().any(|p| p == agent) {
            self.participants.push(agent.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{AclMessage, Performative};
    use serde_json::json;

    fn msg(performative: Performative, sender: &str, receiver: &str) -> AclMessage {
        let mut m = AclMessage::new(performative, sender, vec![receiver.to_string()]);
        m.conversation_id = Some("conv-1".to_string());
        m.content = Some(json!("payload"));
        m
    }

    #[test]
    fn participants_are_union_of_senders_and_receivers() {
        let mut conv = ConversationContext::new("conv-1", "fipa-request");
        conv.record(msg(Performative::Request, "a", "b"));
        conv.record(msg(Performative::Inform, "b", "c"));

        assert_eq!(conv.participants, vec!["a", "b", "c"]);
        assert_eq!(conv.messages.len(), 2);
        assert!(conv.involves("c"));
        assert!(!conv.involves("d"));
    }

    #[test]
    fn refuse_forces_failed() {
        let mut conv = ConversationContext::new("conv-1", "fipa-request");
        conv.record(msg(Performative::Request, "a", "b"));
        conv.record(msg(Performative::Refuse, "b", "a"));

        assert_eq!(conv.state, ConversationState::Failed);
    }

    #[test]
    fn agree_completes_only_past_two_messages() {
        let mut conv = ConversationContext::new("conv-1", "fipa-request");
        conv.record(msg(Performative::Request, "a", "b"));
        conv.record(msg(Performative::Agree, "b", "a"));
        // Two messages: the heuristic does not fire yet.
        assert_eq!(conv.state, ConversationState::Active);

        conv.record(msg(Performative::Agree, "b", "a"));
        assert_eq!(conv.state, ConversationState::Completed);
    }

    #[test]
    fn terminal_state_sticks_but_history_grows() {
        let mut conv = ConversationContext::new("conv-1", "fipa-request");
        conv.record(msg(Performative::Request, "a", "b"));
        conv.record(msg(Performative::Cancel, "a", "b"));
        assert_eq!(conv.state, ConversationState::Failed);

        conv.record(msg(Performative::Agree, "b", "a"));
        conv.record(msg(Performative::Agree, "b", "a"));
        assert_eq!(conv.state, ConversationState::Failed);
        assert_eq!(conv.messages.len(), 4);
    }
}

//! ACL message envelopes with correlation IDs for tracking agent communication.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::Performative;
use crate::error::{Error, Result};

/// An ACL message envelope.
///
/// Immutable value type: the directory delivers copies, never mutates one in
/// place. `conversation_id` may be absent on construction; the directory
/// fills it in at send time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AclMessage {
    /// Unique message ID (ULID)
    pub id: String,
    /// Speech-act tag
    pub performative: Performative,
    /// Sender agent name
    pub sender: String,
    /// Recipient agent names (at least one)
    pub receivers: Vec<String>,
    /// Message payload
    pub content: Option<Value>,
    /// Content language (e.g. "json")
    pub language: Option<String>,
    /// Content encoding
    pub encoding: Option<String>,
    /// Ontology the content refers to
    pub ontology: Option<String>,
    /// Interaction protocol name
    pub protocol: String,
    /// Conversation ID; generated at send time when absent
    pub conversation_id: Option<String>,
    /// Correlation ID a reply should echo back
    pub reply_with: Option<String>,
    /// Correlation ID this message replies to
    pub in_reply_to: Option<String>,
    /// Deadline by which a reply is expected
    pub reply_by: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub sent_at: DateTime<Utc>,
}

impl AclMessage {
    /// Create a message with the given performative and sender.
    pub fn new(
        performative: Performative,
        sender: impl Into<String>,
        receivers: Vec<String>,
    ) -> Self {
        Self {
            id: new_message_id(),
            performative,
            sender: sender.into(),
            receivers,
            content: None,
            language: None,
            encoding: None,
            ontology: None,
            protocol: "fipa-request".to_string(),
            conversation_id: None,
            reply_with: None,
            in_reply_to: None,
            reply_by: None,
            sent_at: Utc::now(),
        }
    }

    /// Build an `inform` under a fresh conversation.
    pub fn inform(sender: impl Into<String>, receiver: impl Into<String>, content: Value) -> Self {
        MessageBuilder::new(Performative::Inform, sender)
            .to(receiver)
            .content(content)
            .conversation(new_conversation_id())
            .build()
    }

    /// Build a `request` with fresh conversation and reply-with IDs.
    pub fn request(sender: impl Into<String>, receiver: impl Into<String>, content: Value) -> Self {
        MessageBuilder::new(Performative::Request, sender)
            .to(receiver)
            .content(content)
            .conversation(new_conversation_id())
            .reply_with(new_reply_id())
            .build()
    }

    /// Build a `query-if` with fresh conversation and reply-with IDs.
    pub fn query_if(sender: impl Into<String>, receiver: impl Into<String>, content: Value) -> Self {
        MessageBuilder::new(Performative::QueryIf, sender)
            .to(receiver)
            .content(content)
            .protocol("fipa-query")
            .conversation(new_conversation_id())
            .reply_with(new_reply_id())
            .build()
    }

    /// Build a `query-ref` with fresh conversation and reply-with IDs.
    pub fn query_ref(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        content: Value,
    ) -> Self {
        MessageBuilder::new(Performative::QueryRef, sender)
            .to(receiver)
            .content(content)
            .protocol("fipa-query")
            .conversation(new_conversation_id())
            .reply_with(new_reply_id())
            .build()
    }

    /// Build a `propose` inside an existing conversation.
    pub fn propose(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        conversation_id: impl Into<String>,
        content: Value,
    ) -> Self {
        MessageBuilder::new(Performative::Propose, sender)
            .to(receiver)
            .content(content)
            .protocol("contract-net")
            .conversation(conversation_id)
            .build()
    }

    /// Build a `cfp` broadcast opening a Contract-Net conversation.
    pub fn cfp(sender: impl Into<String>, receivers: Vec<String>, content: Value) -> Self {
        let mut msg = AclMessage::new(Performative::Cfp, sender, receivers);
        msg.content = Some(content);
        msg.protocol = "contract-net".to_string();
        msg.conversation_id = Some(new_conversation_id());
        msg.reply_with = Some(new_reply_id());
        msg
    }

    /// Build a reply to this message.
    ///
    /// The reply stays in the same conversation and protocol, echoing this
    /// message's reply-with (falling back to its ID) as `in_reply_to`.
    pub fn reply(&self, sender: impl Into<String>, performative: Performative) -> AclMessage {
        let mut msg = AclMessage::new(performative, sender, vec![self.sender.clone()]);
        msg.protocol = self.protocol.clone();
        msg.conversation_id = self.conversation_id.clone();
        msg.in_reply_to = self.reply_with.clone().or_else(|| Some(self.id.clone()));
        msg
    }

    /// Check structural validity: non-empty sender, at least one non-empty
    /// receiver. Malformed messages are rejected synchronously, never queued.
    pub fn validate(&self) -> Result<()> {
        if self.sender.trim().is_empty() {
            return Err(Error::validation("sender must not be empty"));
        }
        if self.receivers.is_empty() {
            return Err(Error::validation("at least one receiver is required"));
        }
        if self.receivers.iter().any(|r| r.trim().is_empty()) {
            return Err(Error::validation("receiver names must not be empty"));
        }
        Ok(())
    }

    /// Check if this message is addressed to a specific agent.
    pub fn is_for(&self, agent: &str) -> bool {
        self.receivers.iter().any(|r| r == agent)
    }
}

/// Builder for composing messages with a fluent API.
pub struct MessageBuilder {
    message: AclMessage,
}

impl MessageBuilder {
    /// Start building a message from a sender.
    pub fn new(performative: Performative, sender: impl Into<String>) -> Self {
        Self {
            message: AclMessage::new(performative, sender, Vec::new()),
        }
    }

    /// Address to a single agent.
    pub fn to(mut self, receiver: impl Into<String>) -> Self {
        self.message.receivers.push(receiver.into());
        self
    }

    /// Address to multiple agents.
    pub fn to_many(mut self, receivers: Vec<String>) -> Self {
        self.message.receivers.extend(receivers);
        self
    }

    /// Set the content payload.
    pub fn content(mut self, content: Value) -> Self {
        self.message.content = Some(content);
        self
    }

    /// Set the content language.
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.message.language = Some(language.into());
        self
    }

    /// Set the content encoding.
    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.message.encoding = Some(encoding.into());
        self
    }

    /// Set the ontology.
    pub fn ontology(mut self, ontology: impl Into<String>) -> Self {
        self.message.ontology = Some(ontology.into());
        self
    }

    /// Set the interaction protocol name.
    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.message.protocol = protocol.into();
        self
    }

    /// Set the conversation ID.
    pub fn conversation(mut self, id: impl Into<String>) -> Self {
        self.message.conversation_id = Some(id.into());
        self
    }

    /// Set the reply-with correlation ID.
    pub fn reply_with(mut self, id: impl Into<String>) -> Self {
        self.message.reply_with = Some(id.into());
        self
    }

    /// Set the in-reply-to correlation ID.
    pub fn in_reply_to(mut self, id: impl Into<String>) -> Self {
        self.message.in_reply_to = Some(id.into());
        self
    }

    /// Set the reply-by deadline.
    pub fn reply_by(mut self, deadline: DateTime<Utc>) -> Self {
        self.message.reply_by = Some(deadline);
        self
    }

    /// Finish building.
    pub fn build(self) -> AclMessage {
        self.message
    }
}

/// Generate a message ID (ULID).
pub fn new_message_id() -> String {
    ulid::Ulid::new().to_string()
}

/// Generate a reply-with correlation ID (ULID).
pub fn new_reply_id() -> String {
    ulid::Ulid::new().to_string()
}

/// Generate a conversation ID (UUID v4).
pub fn new_conversation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

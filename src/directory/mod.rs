//! Agent directory: registration, lookup, message delivery, conversations.
//!
//! The directory owns every piece of shared messaging state — the agent
//! registry, per-agent mailboxes, conversation contexts, and pending reply
//! listeners — and is the only mutation path for all of them. Sends are
//! synchronous over in-memory state and never block on a receiver.

pub mod conversation;

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::config::Settings;
use crate::error::Result;
use crate::events::{CoordinationEvent, EventBus};
use crate::protocol::{AclMessage, AgentQuery, MailboxStats, MailboxStore, Performative};

pub use conversation::ConversationContext;

/// An agent's directory entry.
///
/// Immutable once registered; re-registering the same name replaces it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentIdentifier {
    /// Unique agent name
    pub name: String,
    /// Logical addresses (no wire transport; informational)
    pub addresses: Vec<String>,
    /// User-defined properties, e.g. specialization tags
    pub properties: HashMap<String, String>,
}

impl AgentIdentifier {
    /// Create an identifier with no addresses or properties.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            addresses: Vec::new(),
            properties: HashMap::new(),
        }
    }

    /// Add a logical address.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.addresses.push(address.into());
        self
    }

    /// Add a user-defined property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Substring match on name, exact match on every queried property.
    pub fn matches(&self, query: &AgentQuery) -> bool {
        if let Some(name) = &query.name {
            if !self.name.contains(name.as_str()) {
                return false;
            }
        }
        query
            .properties
            .iter()
            .all(|(k, v)| self.properties.get(k) == Some(v))
    }
}

/// What a registered listener is waiting for.
enum ListenerKind {
    /// One correlated reply; fires once and is removed.
    Reply {
        in_reply_to: String,
        tx: Option<oneshot::Sender<AclMessage>>,
    },
    /// Every message with a given performative, until unhooked.
    Collect {
        performative: Performative,
        tx: mpsc::UnboundedSender<AclMessage>,
    },
}

struct ReplyListener {
    token: String,
    conversation_id: String,
    kind: ListenerKind,
}

/// Handle for unhooking a listener; returned by the listen/collect calls.
pub(crate) struct ListenerToken(String);

/// The agent directory.
pub struct AgentDirectory {
    agents: RwLock<HashMap<String, AgentIdentifier>>,
    mailboxes: MailboxStore,
    conversations: RwLock<HashMap<String, ConversationContext>>,
    listeners: Mutex<Vec<ReplyListener>>,
    events: EventBus,
}

impl AgentDirectory {
    /// Create a directory using the given settings and event bus.
    pub fn new(settings: &Settings, events: EventBus) -> Self {
        Self {
            agents: RwLock::new(HashMap::new()),
            mailboxes: MailboxStore::new(settings.mailbox.max_messages),
            conversations: RwLock::new(HashMap::new()),
            listeners: Mutex::new(Vec::new()),
            events,
        }
    }

    /// Register an agent and allocate an empty mailbox.
    ///
    /// Re-registering the same name overwrites the entry and clears any
    /// queued messages.
    pub fn register(&self, id: AgentIdentifier) {
        tracing::debug!(agent = %id.name, "Registering agent in directory");
        self.mailboxes.allocate(&id.name);
        self.agents.write().unwrap().insert(id.name.clone(), id);
    }

    /// Remove an agent and its mailbox.
    ///
    /// Historical conversations referencing the name are left intact.
    pub fn unregister(&self, name: &str) -> bool {
        let removed = self.agents.write().unwrap().remove(name).is_some();
        self.mailboxes.remove(name);
        if removed {
            tracing::debug!(agent = %name, "Unregistered agent from directory");
        }
        removed
    }

    /// Whether an agent is currently registered.
    pub fn is_registered(&self, name: &str) -> bool {
        self.agents.read().unwrap().contains_key(name)
    }

    /// Look up a single identifier.
    pub fn identifier(&self, name: &str) -> Option<AgentIdentifier> {
        self.agents.read().unwrap().get(name).cloned()
    }

    /// Find agents by substring name match and exact property match.
    pub fn find_agents(&self, query: &AgentQuery) -> Vec<AgentIdentifier> {
        let agents = self.agents.read().unwrap();
        let mut found: Vec<AgentIdentifier> =
            agents.values().filter(|a| a.matches(query)).cloned().collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found
    }

    /// Send a message: validate, track the conversation, deliver copies.
    ///
    /// Generates a conversation ID when the message carries none. Unknown
    /// receivers are warned about, not fatal — delivery to the remaining
    /// receivers still proceeds. Returns the conversation ID.
    pub fn send(&self, message: AclMessage) -> Result<String> {
        message.validate()?;

        let conversation_id = message
            .conversation_id
            .clone()
            .unwrap_or_else(crate::protocol::new_conversation_id);

        let mut delivered = message;
        delivered.conversation_id = Some(conversation_id.clone());

        {
            let mut conversations = self.conversations.write().unwrap();
            let context = conversations
                .entry(conversation_id.clone())
                .or_insert_with(|| {
                    ConversationContext::new(&conversation_id, &delivered.protocol)
                });
            context.record(delivered.clone());
        }

        for receiver in &delivered.receivers {
            if !self.mailboxes.deliver(receiver, delivered.clone()) {
                tracing::warn!(
                    receiver = %receiver,
                    sender = %delivered.sender,
                    conversation = %conversation_id,
                    "Receiver not registered, skipping delivery"
                );
            }
        }

        self.fire_listeners(&conversation_id, &delivered);

        tracing::debug!(
            performative = %delivered.performative,
            sender = %delivered.sender,
            receivers = delivered.receivers.len(),
            conversation = %conversation_id,
            "Message sent"
        );
        self.events.publish(CoordinationEvent::MessageSent {
            message: delivered,
        });

        Ok(conversation_id)
    }

    /// Atomically drain an agent's mailbox (read-once).
    pub fn receive(&self, name: &str) -> Vec<AclMessage> {
        self.mailboxes.drain(name)
    }

    /// Snapshot of one conversation.
    pub fn conversation(&self, id: &str) -> Option<ConversationContext> {
        self.conversations.read().unwrap().get(id).cloned()
    }

    /// Snapshots of every conversation an agent participated in.
    pub fn conversations_for(&self, agent: &str) -> Vec<ConversationContext> {
        let conversations = self.conversations.read().unwrap();
        let mut found: Vec<ConversationContext> = conversations
            .values()
            .filter(|c| c.involves(agent))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        found
    }

    /// Mailbox counters for observability.
    pub fn mailbox_stats(&self) -> Vec<MailboxStats> {
        self.mailboxes.all_stats()
    }

    /// Wait for one message in `conversation_id` whose in-reply-to matches.
    pub(crate) fn listen_for_reply(
        &self,
        conversation_id: &str,
        in_reply_to: &str,
    ) -> (ListenerToken, oneshot::Receiver<AclMessage>) {
        let (tx, rx) = oneshot::channel();
        let token = ulid::Ulid::new().to_string();
        self.listeners.lock().unwrap().push(ReplyListener {
            token: token.clone(),
            conversation_id: conversation_id.to_string(),
            kind: ListenerKind::Reply {
                in_reply_to: in_reply_to.to_string(),
                tx: Some(tx),
            },
        });
        (ListenerToken(token), rx)
    }

    /// Collect every message with `performative` in `conversation_id`.
    pub(crate) fn collect_performative(
        &self,
        conversation_id: &str,
        performative: Performative,
    ) -> (ListenerToken, mpsc::UnboundedReceiver<AclMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let token = ulid::Ulid::new().to_string();
        self.listeners.lock().unwrap().push(ReplyListener {
            token: token.clone(),
            conversation_id: conversation_id.to_string(),
            kind: ListenerKind::Collect { performative, tx },
        });
        (ListenerToken(token), rx)
    }

    /// Unhook a listener. Timing out a call releases its listener without
    /// touching already-delivered messages or conversation state.
    pub(crate) fn remove_listener(&self, token: ListenerToken) {
        self.listeners.lock().unwrap().retain(|l| l.token != token.0);
    }

    fn fire_listeners(&self, conversation_id: &str, message: &AclMessage) {
        let mut listeners = self.listeners.lock().unwrap();
        listeners.retain_mut(|listener| {
            if listener.conversation_id != conversation_id {
                return true;
            }
            match &mut listener.kind {
                ListenerKind::Reply { in_reply_to, tx } => {
                    if message.in_reply_to.as_deref() != Some(in_reply_to.as_str()) {
                        return true;
                    }
                    if let Some(tx) = tx.take() {
                        // Err means the waiter already gave up.
                        let _ = tx.send(message.clone());
                    }
                    false
                }
                ListenerKind::Collect { performative, tx } => {
                    if message.performative != *performative {
                        return true;
                    }
                    // A closed channel means the collector finished; drop it.
                    tx.send(message.clone()).is_ok()
                }
            }
        });
    }
}

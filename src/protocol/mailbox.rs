//! Agent mailboxes for in-process message delivery.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::envelope::AclMessage;

/// An agent's mailbox: a bounded FIFO queue of undelivered messages.
///
/// Messages stay queued until drained (read-once semantics); on overflow the
/// oldest message is dropped.
#[derive(Debug)]
pub struct Mailbox {
    /// Agent name owning this mailbox.
    pub agent: String,
    queue: VecDeque<AclMessage>,
    capacity: usize,
    total_received: u64,
    total_dropped: u64,
    last_activity: DateTime<Utc>,
}

impl Mailbox {
    /// Create an empty mailbox.
    pub fn new(agent: impl Into<String>, capacity: usize) -> Self {
        Self {
            agent: agent.into(),
            queue: VecDeque::new(),
            capacity,
            total_received: 0,
            total_dropped: 0,
            last_activity: Utc::now(),
        }
    }

    /// Append a message in arrival order.
    pub fn deliver(&mut self, message: AclMessage) {
        if self.queue.len() >= self.capacity {
            self.queue.pop_front();
            self.total_dropped += 1;
            tracing::warn!(
                agent = %self.agent,
                capacity = self.capacity,
                "Mailbox full, dropping oldest message"
            );
        }
        self.queue.push_back(message);
        self.total_received += 1;
        self.last_activity = Utc::now();
    }

    /// Remove and return every queued message, preserving FIFO order.
    pub fn drain(&mut self) -> Vec<AclMessage> {
        self.last_activity = Utc::now();
        self.queue.drain(..).collect()
    }

    /// Number of queued messages.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Snapshot of mailbox counters.
    pub fn stats(&self) -> MailboxStats {
        MailboxStats {
            agent: self.agent.clone(),
            queued: self.queue.len(),
            total_received: self.total_received,
            total_dropped: self.total_dropped,
            last_activity: self.last_activity,
        }
    }
}

/// Mailbox statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailboxStats {
    pub agent: String,
    pub queued: usize,
    pub total_received: u64,
    pub total_dropped: u64,
    pub last_activity: DateTime<Utc>,
}

/// Store for all agent mailboxes.
///
/// A single lock over the map serializes deliveries and drains, so a drain
/// is atomic with respect to concurrent deliveries: no lost or duplicated
/// messages.
#[derive(Debug)]
pub struct MailboxStore {
    boxes: Mutex<HashMap<String, Mailbox>>,
    capacity: usize,
}

impl MailboxStore {
    /// Create a store; each mailbox holds at most `capacity` messages.
    pub fn new(capacity: usize) -> Self {
        Self {
            boxes: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    /// Allocate an empty mailbox, replacing any existing one for the name.
    pub fn allocate(&self, agent: &str) {
        let mut boxes = self.boxes.lock().unwrap();
        boxes.insert(agent.to_string(), Mailbox::new(agent, self.capacity));
    }

    /// Remove an agent's mailbox, discarding queued messages.
    pub fn remove(&self, agent: &str) -> bool {
        self.boxes.lock().unwrap().remove(agent).is_some()
    }

    /// Whether a mailbox exists for the agent.
    pub fn contains(&self, agent: &str) -> bool {
        self.boxes.lock().unwrap().contains_key(agent)
    }

    /// Deliver a message to an agent's mailbox.
    ///
    /// Returns false when the agent has no mailbox; the caller decides
    /// whether that is a warning or an error.
    pub fn deliver(&self, agent: &str, message: AclMessage) -> bool {
        let mut boxes = self.boxes.lock().unwrap();
        match boxes.get_mut(agent) {
            Some(mailbox) => {
                mailbox.deliver(message);
                true
            }
            None => false,
        }
    }

    /// Atomically drain an agent's mailbox.
    pub fn drain(&self, agent: &str) -> Vec<AclMessage> {
        let mut boxes = self.boxes.lock().unwrap();
        boxes.get_mut(agent).map(|m| m.drain()).unwrap_or_default()
    }

    /// Snapshot of every mailbox's counters.
    pub fn all_stats(&self) -> Vec<MailboxStats> {
        let boxes = self.boxes.lock().unwrap();
        boxes.values().map(|m| m.stats()).collect()
    }
}

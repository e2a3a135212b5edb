//! Coordination event bus.
//!
//! Outbound notifications are modeled as an explicit publish/subscribe
//! channel rather than ambient callbacks. Subscribers get a snapshot of the
//! relevant entity with each event; publishing with no subscribers is not an
//! error.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::coordinator::profile::AgentProfile;
use crate::coordinator::task::CoordinationTask;
use crate::protocol::AclMessage;

/// A notification emitted by the directory or coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CoordinationEvent {
    AgentRegistered { profile: AgentProfile },
    AgentUnregistered { name: String },
    TaskCreated { task: CoordinationTask },
    TaskAssigned { task: CoordinationTask },
    MessageSent { message: AclMessage },
    MessageProcessed { agent: String, message: AclMessage },
}

/// Broadcast-backed event bus shared by the directory and coordinator.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CoordinationEvent>,
}

impl EventBus {
    /// Create a bus with the given channel capacity.
    ///
    /// Lagged subscribers lose the oldest events, never block publishers.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<CoordinationEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: CoordinationEvent) {
        // Err means no subscribers are listening right now.
        let _ = self.tx.send(event);
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::config::Events::default().channel_capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_reaches_subscriber() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        bus.publish(CoordinationEvent::AgentUnregistered {
            name: "writer".to_string(),
        });

        match rx.recv().await.unwrap() {
            CoordinationEvent::AgentUnregistered { name } => assert_eq!(name, "writer"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn publish_without_subscribers_is_ok() {
        let bus = EventBus::new(8);
        bus.publish(CoordinationEvent::AgentUnregistered {
            name: "ghost".to_string(),
        });
        assert_eq!(bus.subscriber_count(), 0);
    }
}

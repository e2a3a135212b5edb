//! Agent Communication Language protocol layer.
//!
//! This module defines the structured protocol for inter-agent communication:
//! - ACL message envelopes with correlation IDs
//! - Typed performatives (inform, request, propose, cfp, ...)
//! - Per-agent FIFO mailboxes

pub mod envelope;
pub mod mailbox;
pub mod types;

pub use envelope::{new_conversation_id, new_reply_id, AclMessage, MessageBuilder};
pub use mailbox::{Mailbox, MailboxStats, MailboxStore};
pub use types::{AgentQuery, ConversationState, Performative};

//! Request-response interaction pattern.

use std::time::Duration;

use serde_json::Value;

use crate::directory::AgentDirectory;
use crate::error::{Error, Result};
use crate::protocol::{
    new_conversation_id, new_reply_id, AclMessage, MessageBuilder, Performative,
};

/// Send a `request` and suspend until a correlated reply arrives.
///
/// A fresh conversation and reply-with ID are generated; the first message in
/// that conversation whose `in_reply_to` matches resolves the call. After
/// `timeout` the pending listener is released and `Error::Timeout` is
/// returned — the conversation itself is left untouched so late arrivals
/// still land in its history.
pub async fn request(
    directory: &AgentDirectory,
    sender: &str,
    receiver: &str,
    content: Value,
    timeout: Duration,
) -> Result<AclMessage> {
    let conversation_id = new_conversation_id();
    let reply_with = new_reply_id();
    let message = MessageBuilder::new(Performative::Request, sender)
        .to(receiver)
        .content(content)
        .conversation(conversation_id.clone())
        .reply_with(reply_with.clone())
        .build();

    // Hook the listener before sending so a same-tick reply cannot slip past.
    let (token, rx) = directory.listen_for_reply(&conversation_id, &reply_with);
    directory.send(message)?;

    match tokio::time::timeout(timeout, rx).await {
        Ok(Ok(reply)) => Ok(reply),
        Ok(Err(_)) => {
            // Sender side dropped without firing; treat as an expired wait.
            directory.remove_listener(token);
            Err(Error::timeout(format!(
                "reply channel closed for conversation {}",
                conversation_id
            )))
        }
        Err(_) => {
            directory.remove_listener(token);
            tracing::warn!(
                receiver = %receiver,
                conversation = %conversation_id,
                timeout_ms = timeout.as_millis() as u64,
                "Request timed out waiting for reply"
            );
            Err(Error::timeout(format!(
                "no reply from {} within {}ms",
                receiver,
                timeout.as_millis()
            )))
        }
    }
}

//! Contract-Net negotiation pattern.
//!
//! The initiator broadcasts a call-for-proposal to all participants under a
//! single conversation, collects `propose` replies until the deadline, and
//! hands selection to a pluggable ranking policy.

use std::time::Duration;

use serde_json::Value;

use crate::directory::AgentDirectory;
use crate::error::{Error, Result};
use crate::protocol::{AclMessage, Performative};

/// Selection policy applied to the collected proposals.
///
/// The default policy takes the first proposal received. Callers wanting
/// optimal-bid ranking supply their own implementation or re-rank the
/// returned list themselves.
pub trait ProposalRanking: Send + Sync {
    /// Pick the winning proposal, if any.
    fn select<'a>(&self, proposals: &'a [AclMessage]) -> Option<&'a AclMessage>;
}

/// Default policy: first proposal received wins.
pub struct FirstProposal;

impl ProposalRanking for FirstProposal {
    fn select<'a>(&self, proposals: &'a [AclMessage]) -> Option<&'a AclMessage> {
        proposals.first()
    }
}

/// Result of a Contract-Net round.
#[derive(Debug, Clone)]
pub struct ContractNetOutcome {
    /// Conversation the negotiation ran under
    pub conversation_id: String,
    /// Every proposal received before the deadline, in arrival order
    pub proposals: Vec<AclMessage>,
    /// The proposal picked by the ranking policy
    pub selected: Option<AclMessage>,
}

/// Run one Contract-Net round.
///
/// Proposals arriving before `window` elapses are collected in arrival
/// order; participants who stay silent are simply absent from the result.
/// Zero proposals within the window is reported as `Error::Timeout`. The
/// timeout only unhooks the collector — the conversation keeps accepting
/// late messages.
pub async fn call_for_proposals(
    directory: &AgentDirectory,
    initiator: &str,
    participants: &[String],
    content: Value,
    window: Duration,
    ranking: &dyn ProposalRanking,
) -> Result<ContractNetOutcome> {
    if participants.is_empty() {
        return Err(Error::validation(
            "contract-net needs at least one participant",
        ));
    }

    let cfp = AclMessage::cfp(initiator, participants.to_vec(), content);
    let conversation_id = cfp
        .conversation_id
        .clone()
        .unwrap_or_else(crate::protocol::new_conversation_id);

    // Hook the collector before sending so no proposal can slip past.
    let (token, mut rx) = directory.collect_performative(&conversation_id, Performative::Propose);
    directory.send(cfp)?;

    let deadline = tokio::time::Instant::now() + window;
    let mut proposals = Vec::new();
    loop {
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Some(proposal)) => proposals.push(proposal),
            Ok(None) => break,
            Err(_) => break,
        }
    }
    directory.remove_listener(token);

    if proposals.is_empty() {
        tracing::warn!(
            initiator = %initiator,
            participants = participants.len(),
            conversation = %conversation_id,
            window_ms = window.as_millis() as u64,
            "Contract-net window closed with no proposals"
        );
        return Err(Error::timeout(format!(
            "no proposals within {}ms",
            window.as_millis()
        )));
    }

    let selected = ranking.select(&proposals).cloned();
    tracing::debug!(
        conversation = %conversation_id,
        proposals = proposals.len(),
        winner = selected.as_ref().map(|m| m.sender.as_str()).unwrap_or("-"),
        "Contract-net round complete"
    );

    Ok(ContractNetOutcome {
        conversation_id,
        proposals,
        selected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::directory::AgentIdentifier;
    use crate::events::EventBus;
    use serde_json::json;
    use std::sync::Arc;

    fn directory() -> Arc<AgentDirectory> {
        Arc::new(AgentDirectory::new(&Settings::default(), EventBus::new(16)))
    }

    /// Spawn a participant that answers any cfp in its mailbox with a propose.
    fn spawn_bidder(dir: Arc<AgentDirectory>, name: &'static str, delay: Duration) {
        tokio::spawn(async move {
            loop {
                let inbox = dir.receive(name);
                if let Some(cfp) = inbox.iter().find(|m| m.performative == Performative::Cfp) {
                    tokio::time::sleep(delay).await;
                    let proposal = AclMessage::propose(
                        name,
                        &cfp.sender,
                        cfp.conversation_id.clone().unwrap(),
                        json!({"bidder": name}),
                    );
                    dir.send(proposal).unwrap();
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        });
    }

    #[tokio::test]
    async fn collects_proposals_and_selects_first() {
        let dir = directory();
        dir.register(AgentIdentifier::new("initiator"));
        for name in ["a", "b", "c"] {
            dir.register(AgentIdentifier::new(name));
        }

        // Two bidders reply inside the window; "c" never does.
        spawn_bidder(dir.clone(), "a", Duration::from_millis(10));
        spawn_bidder(dir.clone(), "b", Duration::from_millis(30));

        let outcome = call_for_proposals(
            &dir,
            "initiator",
            &["a".to_string(), "b".to_string(), "c".to_string()],
            json!({"task": "index the corpus"}),
            Duration::from_millis(300),
            &FirstProposal,
        )
        .await
        .unwrap();

        assert_eq!(outcome.proposals.len(), 2);
        let selected = outcome.selected.unwrap();
        assert_eq!(selected.id, outcome.proposals[0].id);
        assert_eq!(selected.sender, "a");
    }

    #[tokio::test]
    async fn no_proposals_is_a_timeout() {
        let dir = directory();
        dir.register(AgentIdentifier::new("initiator"));
        dir.register(AgentIdentifier::new("mute"));

        let result = call_for_proposals(
            &dir,
            "initiator",
            &["mute".to_string()],
            json!("anyone?"),
            Duration::from_millis(80),
            &FirstProposal,
        )
        .await;

        assert!(matches!(result, Err(Error::Timeout(_))));
    }

    #[tokio::test]
    async fn custom_ranking_overrides_first_wins() {
        struct HighestBid;
        impl ProposalRanking for HighestBid {
            fn select<'a>(&self, proposals: &'a [AclMessage]) -> Option<&'a AclMessage> {
                proposals.iter().max_by_key(|p| {
                    p.content
                        .as_ref()
                        .and_then(|c| c.get("bid"))
                        .and_then(|b| b.as_i64())
                        .unwrap_or(0)
                })
            }
        }

        let dir = directory();
        dir.register(AgentIdentifier::new("initiator"));
        for (name, bid, delay) in [("cheap", 1, 5u64), ("rich", 9, 40)] {
            dir.register(AgentIdentifier::new(name));
            let d = dir.clone();
            tokio::spawn(async move {
                loop {
                    let inbox = d.receive(name);
                    if let Some(cfp) = inbox.iter().find(|m| m.performative == Performative::Cfp) {
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                        let proposal = AclMessage::propose(
                            name,
                            &cfp.sender,
                            cfp.conversation_id.clone().unwrap(),
                            json!({"bid": bid}),
                        );
                        d.send(proposal).unwrap();
                        break;
                    }
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            });
        }

        let outcome = call_for_proposals(
            &dir,
            "initiator",
            &["cheap".to_string(), "rich".to_string()],
            json!("bids please"),
            Duration::from_millis(300),
            &HighestBid,
        )
        .await
        .unwrap();

        assert_eq!(outcome.proposals.len(), 2);
        assert_eq!(outcome.selected.unwrap().sender, "rich");
    }
}

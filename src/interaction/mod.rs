//! Interaction patterns built on the agent directory.
//!
//! - Request-response with correlated replies and deadlines
//! - Contract-Net negotiation with pluggable proposal ranking

pub mod contract_net;
pub mod request;

pub use contract_net::{
    call_for_proposals, ContractNetOutcome, FirstProposal, ProposalRanking,
};
pub use request::request;

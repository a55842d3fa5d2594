//! Signaling message protocol and channel contract.
//!
//! The signaling relay is a best-effort, user-addressed message channel used
//! only to bootstrap a direct media session. Delivery is at most once, there
//! is no cross-message ordering guarantee, and messages are addressed by user
//! id rather than session id — receivers must self-filter against the
//! identity of their current session.
//!
//! Outbound messages go through the [`SignalingChannel`] trait. Inbound
//! messages are delivered by calling
//! [`CallSessionManager::handle_signal`](crate::session::CallSessionManager::handle_signal).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::call::CallMeta;
use crate::error::CallResult;

/// Opaque offer/answer payload describing a proposed media session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionDescription(pub String);

impl SessionDescription {
    pub fn new(payload: impl Into<String>) -> Self {
        Self(payload.into())
    }
}

/// Opaque connectivity probe exchanged incrementally between peers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceCandidate {
    /// Candidate payload.
    pub candidate: String,
    /// Media stream identification tag, if provided by the engine.
    pub sdp_mid: Option<String>,
    /// Media description index, if provided by the engine.
    pub sdp_mline_index: Option<u32>,
}

/// A message relayed between two users over the signaling channel.
///
/// Every variant carries the sender and addressee user ids. An offer
/// additionally carries the proposed session description and caller metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalingMessage {
    /// Proposal to start a call.
    Offer {
        from: String,
        to: String,
        description: SessionDescription,
        meta: CallMeta,
    },
    /// Response to an offer after the callee accepted.
    Answer {
        from: String,
        to: String,
        description: SessionDescription,
    },
    /// Incremental connectivity probe.
    Candidate {
        from: String,
        to: String,
        candidate: IceCandidate,
    },
    /// The sender has left or refused the call.
    End { from: String, to: String },
}

impl SignalingMessage {
    /// User id of the sender.
    pub fn from_user(&self) -> &str {
        match self {
            SignalingMessage::Offer { from, .. }
            | SignalingMessage::Answer { from, .. }
            | SignalingMessage::Candidate { from, .. }
            | SignalingMessage::End { from, .. } => from,
        }
    }

    /// User id of the addressee.
    pub fn to_user(&self) -> &str {
        match self {
            SignalingMessage::Offer { to, .. }
            | SignalingMessage::Answer { to, .. }
            | SignalingMessage::Candidate { to, .. }
            | SignalingMessage::End { to, .. } => to,
        }
    }
}

/// Outbound half of the signaling relay, already connected and authenticated.
///
/// Implementations must not retry: the channel offers no delivery
/// acknowledgment, and an undelivered offer is observable only through the
/// ring timeout.
#[async_trait]
pub trait SignalingChannel: Send + Sync {
    /// Send an offer to `to`.
    async fn send_offer(
        &self,
        to: &str,
        description: SessionDescription,
        meta: CallMeta,
    ) -> CallResult<()>;

    /// Send an answer to `to`.
    async fn send_answer(&self, to: &str, description: SessionDescription) -> CallResult<()>;

    /// Send a connectivity probe to `to`.
    async fn send_candidate(&self, to: &str, candidate: IceCandidate) -> CallResult<()>;

    /// Tell `to` that the call has ended or was refused.
    async fn send_end(&self, to: &str) -> CallResult<()>;
}

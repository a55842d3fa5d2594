//! Core call session data model.
//!
//! This module provides the call state enumeration and lightweight session
//! views. All actual signaling and media operations are delegated to the
//! adapters consumed by [`crate::session::CallSessionManager`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

/// Unique identifier for a call session, generated locally.
pub type CallId = Uuid;

/// Current state of a call session.
///
/// Transitions are monotonic: a session never re-enters a prior non-terminal
/// state. `Idle` is terminal and is re-entered only as a fresh session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallState {
    /// No active session.
    Idle,
    /// Outgoing call, offer sent, waiting for an answer.
    Calling,
    /// Incoming offer stored, waiting for the user to accept or decline.
    Receiving,
    /// Descriptions exchanged, waiting for the media transport to connect.
    Connecting,
    /// Media transport established, call in progress.
    Connected,
}

impl CallState {
    /// Check whether no session is active.
    pub fn is_idle(&self) -> bool {
        matches!(self, CallState::Idle)
    }

    /// Check whether a session is in progress (any non-Idle state).
    pub fn is_in_progress(&self) -> bool {
        !self.is_idle()
    }

    /// Check whether the session can be accepted or declined by the user.
    pub fn can_accept(&self) -> bool {
        matches!(self, CallState::Receiving)
    }

    /// Check whether media is flowing.
    pub fn is_active(&self) -> bool {
        matches!(self, CallState::Connected)
    }
}

/// Direction of a call, from the local participant's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallDirection {
    /// Outgoing call (locally initiated).
    Outgoing,
    /// Incoming call (offer received from the remote party).
    Incoming,
}

/// Kind of media carried by a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// Audio only.
    Audio,
    /// Audio plus video.
    AudioVideo,
}

impl MediaKind {
    /// Whether this kind includes a video track.
    pub fn has_video(&self) -> bool {
        matches!(self, MediaKind::AudioVideo)
    }
}

/// Caller metadata carried on an offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallMeta {
    /// Display name of the caller, if known.
    pub display_name: Option<String>,
    /// Media kind the caller proposes.
    pub media_kind: MediaKind,
}

/// Read-only view of the active call session.
#[derive(Debug, Clone)]
pub struct CallSnapshot {
    /// Locally generated session identifier.
    pub session_id: CallId,
    /// Local participant's user id.
    pub local_user_id: String,
    /// Remote participant's user id.
    pub remote_user_id: String,
    /// Direction of the call.
    pub direction: CallDirection,
    /// Media kind negotiated for this call.
    pub media_kind: MediaKind,
    /// Current state.
    pub state: CallState,
    /// When the session was created.
    pub started_at: DateTime<Utc>,
    /// When the media transport connected, if it has.
    pub connected_at: Option<DateTime<Utc>>,
    /// Whether the local audio track is muted.
    pub muted: bool,
    /// Whether the local camera is enabled.
    pub camera_enabled: bool,
}

//! Media Engine adapter interface.
//!
//! The media engine is the platform capability that captures local
//! audio/video, negotiates a session description with the remote peer, and
//! establishes the direct media transport. Its internals (codecs, transport
//! security) stay behind these traits; the session core consumes only the
//! call contract below.
//!
//! Lifecycle events for a live media session — locally gathered connectivity
//! probes, the transport connect, the arrival of the remote stream, errors
//! and closure — are delivered on the [`mpsc`] receiver returned by
//! [`MediaEngine::create_session`]. The session core owns that receiver and
//! pumps it for exactly one session at a time.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::call::MediaKind;
use crate::error::CallResult;
use crate::signaling::{IceCandidate, SessionDescription};

/// Handle to a captured local or received remote stream.
///
/// A handle is owned exclusively by one call session; it is acquired and
/// released by that session and never shared across sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHandle {
    /// Engine-assigned stream identifier.
    pub id: String,
    /// Media kind carried by the stream.
    pub kind: MediaKind,
}

/// A video capture source available to the local participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDevice {
    /// Engine-assigned device identifier.
    pub id: String,
    /// Human-readable device label.
    pub label: String,
}

/// Lifecycle event emitted by a live media session.
#[derive(Debug, Clone)]
pub enum MediaSessionEvent {
    /// The engine gathered a local connectivity probe to relay to the peer.
    LocalCandidate(IceCandidate),
    /// The direct media transport is established.
    Connected,
    /// The remote party's stream became available.
    RemoteStream(StreamHandle),
    /// The engine failed; the session must be torn down.
    Error(String),
    /// The engine closed the session.
    Closed,
}

/// Platform media capability consumed by the session core.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Capture a local stream of the given kind.
    ///
    /// Fails with [`CallError::MediaUnavailable`](crate::CallError::MediaUnavailable)
    /// when permission is denied or no suitable device exists.
    async fn acquire(&self, kind: MediaKind) -> CallResult<StreamHandle>;

    /// Stop the tracks of a previously acquired local stream.
    async fn release(&self, stream: StreamHandle);

    /// Create a peer media session fed by the given local stream.
    ///
    /// Returns the session object plus the receiver for its lifecycle
    /// events. Dropping the session object without calling
    /// [`MediaSession::close`] is a leak on some platforms; the session core
    /// always closes explicitly during teardown.
    async fn create_session(
        &self,
        local: &StreamHandle,
    ) -> CallResult<(Arc<dyn MediaSession>, mpsc::Receiver<MediaSessionEvent>)>;

    /// Enumerate the available video capture sources.
    async fn list_video_devices(&self) -> CallResult<Vec<VideoDevice>>;
}

/// A live peer media session created by the engine.
#[async_trait]
pub trait MediaSession: Send + Sync {
    /// Produce an offer description for the local side.
    async fn create_offer(&self) -> CallResult<SessionDescription>;

    /// Apply `remote` as the remote description and derive an answer from it.
    async fn create_answer(&self, remote: &SessionDescription) -> CallResult<SessionDescription>;

    /// Apply the remote description received in an answer.
    async fn apply_remote_description(&self, description: &SessionDescription) -> CallResult<()>;

    /// Feed a connectivity probe received from the peer.
    ///
    /// Callers must only invoke this after a remote description has been
    /// applied; the session core buffers earlier arrivals.
    async fn add_remote_candidate(&self, candidate: &IceCandidate) -> CallResult<()>;

    /// Replace the outgoing video track with a capture from `device_id`.
    ///
    /// No renegotiation takes place and the audio track is untouched.
    async fn replace_video_track(&self, device_id: &str) -> CallResult<()>;

    /// Enable or disable the outgoing audio track.
    async fn set_muted(&self, muted: bool) -> CallResult<()>;

    /// Enable or disable the outgoing video track.
    async fn set_camera_enabled(&self, enabled: bool) -> CallResult<()>;

    /// Destroy the session object and its transport.
    async fn close(&self);
}

//! The call session manager: owner of the single active session.
//!
//! One `CallSessionManager` exists per local participant. It owns at most one
//! active call session at a time, consumes the signaling and media adapters,
//! and feeds terminal transitions to the call log store. All signaling
//! handlers, media engine events, user actions, and timer expiries funnel
//! through the mutex-guarded session slot, so every handler validates the
//! event against the current session before acting and teardown happens
//! exactly once no matter how many paths race to it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;

use crate::call::{CallDirection, CallId, CallMeta, CallSnapshot, CallState, MediaKind};
use crate::call_log::{CallLogEntry, CallLogStore, CallOutcome};
use crate::events::SessionEvent;
use crate::media::{MediaEngine, MediaSession, StreamHandle, VideoDevice};
use crate::signaling::{IceCandidate, SessionDescription, SignalingChannel};
use crate::session::config::SessionConfig;

/// Capacity of the UI event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Why a session is being terminated. Internal to the teardown path.
#[derive(Debug, Clone)]
pub(crate) enum EndReason {
    /// The local user hung up.
    LocalHangup,
    /// The local user declined an incoming call.
    LocalDecline,
    /// An End message arrived from the remote party.
    RemoteEnd,
    /// The ring/timeout supervisor expired while calling.
    RingTimeout,
    /// Media or signaling failed mid-session.
    Failed(String),
    /// The media engine closed the session underneath us.
    EngineClosed,
}

impl EndReason {
    /// Whether the remote party already knows the call is over.
    fn ended_by_remote(&self) -> bool {
        matches!(self, EndReason::RemoteEnd)
    }

    fn describe(&self) -> String {
        match self {
            EndReason::LocalHangup => "hangup".to_string(),
            EndReason::LocalDecline => "declined".to_string(),
            EndReason::RemoteEnd => "remote ended".to_string(),
            EndReason::RingTimeout => "ring timeout".to_string(),
            EndReason::Failed(reason) => format!("failure: {}", reason),
            EndReason::EngineClosed => "engine closed".to_string(),
        }
    }
}

/// The one active call session, owned exclusively by the manager.
pub(crate) struct ActiveCall {
    pub(crate) session_id: CallId,
    pub(crate) remote_user_id: String,
    pub(crate) direction: CallDirection,
    pub(crate) media_kind: MediaKind,
    pub(crate) state: CallState,
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) connected_at: Option<DateTime<Utc>>,
    /// Monotonic twin of `connected_at`, used for duration arithmetic.
    pub(crate) connected_monotonic: Option<tokio::time::Instant>,
    /// Offer description stored on `Receiving` until the user accepts.
    pub(crate) stored_offer: Option<SessionDescription>,
    pub(crate) local_stream: Option<StreamHandle>,
    pub(crate) remote_stream: Option<StreamHandle>,
    pub(crate) media: Option<Arc<dyn MediaSession>>,
    /// Set once a remote description has been applied; gates candidate flow.
    pub(crate) has_remote_description: bool,
    /// Locally gathered candidates waiting for the remote description.
    pub(crate) pending_local_candidates: Vec<IceCandidate>,
    /// Remote candidates that arrived before the remote description.
    pub(crate) pending_remote_candidates: Vec<IceCandidate>,
    pub(crate) muted: bool,
    pub(crate) camera_enabled: bool,
    /// Ring/timeout supervisor handle; Calling only.
    pub(crate) ring_timer: Option<JoinHandle<()>>,
    /// Duration heartbeat handle; Connected only.
    pub(crate) tick_task: Option<JoinHandle<()>>,
    /// Media engine event pump handle.
    pub(crate) media_pump: Option<JoinHandle<()>>,
    pub(crate) video_devices: Vec<VideoDevice>,
    pub(crate) video_device_index: usize,
}

impl ActiveCall {
    pub(crate) fn new(
        remote_user_id: String,
        direction: CallDirection,
        media_kind: MediaKind,
        state: CallState,
    ) -> Self {
        Self {
            session_id: CallId::new_v4(),
            remote_user_id,
            direction,
            media_kind,
            state,
            started_at: Utc::now(),
            connected_at: None,
            connected_monotonic: None,
            stored_offer: None,
            local_stream: None,
            remote_stream: None,
            media: None,
            has_remote_description: false,
            pending_local_candidates: Vec::new(),
            pending_remote_candidates: Vec::new(),
            muted: false,
            camera_enabled: media_kind.has_video(),
            ring_timer: None,
            tick_task: None,
            media_pump: None,
            video_devices: Vec::new(),
            video_device_index: 0,
        }
    }

    fn snapshot(&self, local_user_id: &str) -> CallSnapshot {
        CallSnapshot {
            session_id: self.session_id,
            local_user_id: local_user_id.to_string(),
            remote_user_id: self.remote_user_id.clone(),
            direction: self.direction,
            media_kind: self.media_kind,
            state: self.state,
            started_at: self.started_at,
            connected_at: self.connected_at,
            muted: self.muted,
            camera_enabled: self.camera_enabled,
        }
    }
}

/// Session state machine for one local participant.
///
/// Constructed through [`SessionBuilder`](super::SessionBuilder). All methods
/// are safe to call concurrently; operations that are invalid for the current
/// state fail with [`CallError::Busy`](crate::CallError::Busy) and leave any
/// existing session untouched.
pub struct CallSessionManager {
    pub(crate) config: SessionConfig,
    pub(crate) signaling: Arc<dyn SignalingChannel>,
    pub(crate) media: Arc<dyn MediaEngine>,
    pub(crate) call_log: Arc<dyn CallLogStore>,
    /// The single active session slot. Never a process-wide singleton: each
    /// participant gets their own manager instance.
    pub(crate) active: Mutex<Option<ActiveCall>>,
    pub(crate) event_tx: broadcast::Sender<SessionEvent>,
}

impl CallSessionManager {
    pub(crate) fn new(
        config: SessionConfig,
        signaling: Arc<dyn SignalingChannel>,
        media: Arc<dyn MediaEngine>,
        call_log: Arc<dyn CallLogStore>,
    ) -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            config,
            signaling,
            media,
            call_log,
            active: Mutex::new(None),
            event_tx,
        })
    }

    /// Subscribe to UI-facing session events.
    ///
    /// Each receiver is independent; dropping it unsubscribes.
    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// User id of the local participant this manager belongs to.
    pub fn local_user_id(&self) -> &str {
        &self.config.local_user_id
    }

    /// Current state of the session slot; `Idle` when no call is active.
    pub async fn current_state(&self) -> CallState {
        self.active
            .lock()
            .await
            .as_ref()
            .map(|call| call.state)
            .unwrap_or(CallState::Idle)
    }

    /// Read-only view of the active session, if any.
    pub async fn snapshot(&self) -> Option<CallSnapshot> {
        self.active
            .lock()
            .await
            .as_ref()
            .map(|call| call.snapshot(&self.config.local_user_id))
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        // A send error only means nobody is subscribed right now.
        let _ = self.event_tx.send(event);
    }

    /// Move the session to `new_state` and publish the transition.
    pub(crate) fn transition(
        &self,
        call: &mut ActiveCall,
        new_state: CallState,
        reason: impl Into<String>,
    ) {
        let previous = call.state;
        call.state = new_state;
        let reason = reason.into();
        tracing::info!(
            session_id = %call.session_id,
            from = ?previous,
            to = ?new_state,
            %reason,
            "call state changed"
        );
        self.emit(SessionEvent::StateChanged {
            session_id: call.session_id,
            new_state,
            previous_state: Some(previous),
            reason: Some(reason),
            timestamp: Utc::now(),
        });
    }

    /// The single teardown path back to `Idle`.
    ///
    /// Callers must have already taken the session out of the slot while
    /// holding the lock; racing invocations find the slot empty and become
    /// no-ops, which is what makes hangup idempotent. Stops tracks once,
    /// cancels timers once, emits exactly one log entry.
    pub(crate) async fn finish_call(&self, mut call: ActiveCall, reason: EndReason) {
        for handle in [
            call.ring_timer.take(),
            call.tick_task.take(),
            call.media_pump.take(),
        ]
        .into_iter()
        .flatten()
        {
            handle.abort();
        }

        let previous = call.state;

        if let Some(media) = call.media.take() {
            media.close().await;
        }
        if let Some(stream) = call.local_stream.take() {
            self.media.release(stream).await;
        }
        call.pending_local_candidates.clear();
        call.pending_remote_candidates.clear();

        if !reason.ended_by_remote() {
            if let Err(e) = self.signaling.send_end(&call.remote_user_id).await {
                tracing::warn!(
                    session_id = %call.session_id,
                    error = %e,
                    "failed to send end to remote party"
                );
            }
        }

        let ended_at = Utc::now();
        let outcome = outcome_for(previous, call.connected_at.is_some(), &reason);
        let duration_seconds = call
            .connected_monotonic
            .map(|connected| connected.elapsed().as_secs())
            .unwrap_or(0);
        let (caller_id, receiver_id) = match call.direction {
            CallDirection::Outgoing => (
                self.config.local_user_id.clone(),
                call.remote_user_id.clone(),
            ),
            CallDirection::Incoming => (
                call.remote_user_id.clone(),
                self.config.local_user_id.clone(),
            ),
        };
        let entry = CallLogEntry {
            caller_id,
            receiver_id,
            media_kind: call.media_kind,
            outcome,
            duration_seconds,
            started_at: call.started_at,
            ended_at,
        };

        // Fire-and-forget: a store failure must never delay or reverse the
        // transition to Idle.
        let store = Arc::clone(&self.call_log);
        let log_entry = entry.clone();
        let session_id = call.session_id;
        tokio::spawn(async move {
            if let Err(e) = store.append(log_entry).await {
                tracing::warn!(
                    session_id = %session_id,
                    error = %e,
                    "failed to record call log entry"
                );
            }
        });

        tracing::info!(
            session_id = %call.session_id,
            outcome = ?outcome,
            duration_seconds,
            reason = %reason.describe(),
            "call ended"
        );

        self.emit(SessionEvent::CallEnded {
            session_id: call.session_id,
            entry,
        });
        self.emit(SessionEvent::StateChanged {
            session_id: call.session_id,
            new_state: CallState::Idle,
            previous_state: Some(previous),
            reason: Some(reason.describe()),
            timestamp: ended_at,
        });
    }

    /// Enumerate video sources on first media acquisition, so the device
    /// switcher has a cycle order. Failures are not fatal to the call.
    pub(crate) async fn load_video_devices(&self, call: &mut ActiveCall) {
        if !call.media_kind.has_video() {
            return;
        }
        match self.media.list_video_devices().await {
            Ok(devices) => {
                tracing::debug!(
                    session_id = %call.session_id,
                    count = devices.len(),
                    "enumerated video capture devices"
                );
                call.video_devices = devices;
                call.video_device_index = 0;
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %call.session_id,
                    error = %e,
                    "failed to enumerate video devices"
                );
            }
        }
    }

    /// Build the caller metadata for an outgoing offer.
    pub(crate) fn offer_meta(&self, media_kind: MediaKind) -> CallMeta {
        CallMeta {
            display_name: self.config.display_name.clone(),
            media_kind,
        }
    }
}

/// Map a termination onto the recorded outcome.
///
/// A connected call always completes. Before connection: a ring timeout or a
/// caller giving up while ringing is `no_answer`; a decline is `rejected` on
/// both sides (the caller sees it as End while still `Calling`); everything
/// else that dies early is `missed`.
fn outcome_for(state: CallState, connected: bool, reason: &EndReason) -> CallOutcome {
    if connected {
        return CallOutcome::Completed;
    }
    match reason {
        EndReason::RingTimeout => CallOutcome::NoAnswer,
        EndReason::LocalDecline => CallOutcome::Rejected,
        EndReason::RemoteEnd => match state {
            CallState::Calling | CallState::Receiving => CallOutcome::Rejected,
            _ => CallOutcome::Missed,
        },
        EndReason::LocalHangup => match state {
            CallState::Calling => CallOutcome::NoAnswer,
            CallState::Receiving => CallOutcome::Rejected,
            _ => CallOutcome::Missed,
        },
        EndReason::Failed(_) | EndReason::EngineClosed => CallOutcome::Missed,
    }
}

//! Inbound event handling: signaling messages, media engine events, and the
//! ring/timeout supervisor.
//!
//! The signaling relay addresses messages by user id, not session id, and
//! guarantees no ordering, so every handler validates the sender against the
//! current session's remote user and state before touching anything. Events
//! that refer to an aborted or already-terminated session are dropped
//! silently (debug log only).

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::call::{CallDirection, CallId, CallMeta, CallState};
use crate::events::SessionEvent;
use crate::media::{MediaSessionEvent, StreamHandle};
use crate::signaling::{IceCandidate, SessionDescription, SignalingMessage};

use super::manager::{ActiveCall, CallSessionManager, EndReason};

impl CallSessionManager {
    /// Deliver an inbound signaling message to the state machine.
    ///
    /// The transport integration calls this for every message addressed to
    /// the local user. Messages for other users are dropped.
    pub async fn handle_signal(self: &Arc<Self>, message: SignalingMessage) {
        if message.to_user() != self.config.local_user_id {
            tracing::debug!(
                to = %message.to_user(),
                "dropping signaling message addressed to another user"
            );
            return;
        }
        match message {
            SignalingMessage::Offer { from, description, meta, .. } => {
                self.on_offer(from, description, meta).await;
            }
            SignalingMessage::Answer { from, description, .. } => {
                self.on_answer(from, description).await;
            }
            SignalingMessage::Candidate { from, candidate, .. } => {
                self.on_candidate(from, candidate).await;
            }
            SignalingMessage::End { from, .. } => {
                self.on_end(from).await;
            }
        }
    }

    /// Inbound offer: `Idle -> Receiving`, or a busy signal when a session
    /// is already in progress.
    async fn on_offer(self: &Arc<Self>, from: String, description: SessionDescription, meta: CallMeta) {
        let mut active = self.active.lock().await;
        if let Some(call) = active.as_ref() {
            if call.remote_user_id == from {
                tracing::debug!(
                    session_id = %call.session_id,
                    "dropping duplicate offer from current remote party"
                );
                return;
            }
            tracing::info!(
                from = %from,
                current_state = ?call.state,
                "refusing offer while busy"
            );
            if let Err(e) = self.signaling.send_end(&from).await {
                tracing::warn!(to = %from, error = %e, "failed to send busy signal");
            }
            return;
        }

        let mut call = ActiveCall::new(
            from.clone(),
            CallDirection::Incoming,
            meta.media_kind,
            CallState::Receiving,
        );
        call.stored_offer = Some(description);
        let session_id = call.session_id;

        tracing::info!(
            session_id = %session_id,
            caller = %from,
            kind = ?meta.media_kind,
            "incoming call"
        );
        self.emit(SessionEvent::StateChanged {
            session_id,
            new_state: CallState::Receiving,
            previous_state: None,
            reason: Some("offer received".to_string()),
            timestamp: Utc::now(),
        });
        self.emit(SessionEvent::IncomingCall {
            session_id,
            caller_id: from,
            meta,
            timestamp: Utc::now(),
        });

        *active = Some(call);
    }

    /// Inbound answer: `Calling -> Connecting`, then flush buffered
    /// candidates in both directions.
    async fn on_answer(self: &Arc<Self>, from: String, description: SessionDescription) {
        let mut active = self.active.lock().await;
        let mut call = match active.take() {
            Some(call) if call.remote_user_id == from && call.state == CallState::Calling => call,
            other => {
                tracing::debug!(from = %from, "dropping stale answer");
                *active = other;
                return;
            }
        };

        let media = match call.media.clone() {
            Some(media) => media,
            None => {
                tracing::warn!(session_id = %call.session_id, "answer arrived with no media session");
                *active = Some(call);
                return;
            }
        };
        if let Err(e) = media.apply_remote_description(&description).await {
            self.finish_call(call, EndReason::Failed(e.to_string())).await;
            return;
        }

        call.has_remote_description = true;
        // Answer received: the callee picked up, so the ring timer is done.
        if let Some(timer) = call.ring_timer.take() {
            timer.abort();
        }
        self.transition(&mut call, CallState::Connecting, "answer received");
        self.flush_pending_candidates(&mut call).await;
        *active = Some(call);
    }

    /// Inbound candidate: applied when a remote description exists, buffered
    /// while one is still pending, dropped when stale.
    async fn on_candidate(self: &Arc<Self>, from: String, candidate: IceCandidate) {
        let mut active = self.active.lock().await;
        let call = match active.as_mut() {
            Some(call) if call.remote_user_id == from && call.state.is_in_progress() => call,
            _ => {
                tracing::debug!(from = %from, "dropping candidate with no matching session");
                return;
            }
        };

        if call.has_remote_description {
            if let Some(media) = call.media.as_ref() {
                if let Err(e) = media.add_remote_candidate(&candidate).await {
                    tracing::warn!(
                        session_id = %call.session_id,
                        error = %e,
                        "failed to apply remote candidate"
                    );
                }
                return;
            }
        }
        call.pending_remote_candidates.push(candidate);
    }

    /// Inbound end: terminate whatever phase the session is in.
    async fn on_end(self: &Arc<Self>, from: String) {
        let mut active = self.active.lock().await;
        match active.take() {
            Some(call) if call.remote_user_id == from => {
                self.finish_call(call, EndReason::RemoteEnd).await;
            }
            other => {
                tracing::debug!(from = %from, "dropping end with no matching session");
                *active = other;
            }
        }
    }

    /// Flush both candidate queues the instant a remote description exists:
    /// locally gathered candidates go out over signaling, buffered remote
    /// candidates go into the media session. Runs under the session lock, so
    /// the flush is atomic with respect to every other handler.
    pub(crate) async fn flush_pending_candidates(&self, call: &mut ActiveCall) {
        for candidate in call.pending_local_candidates.drain(..) {
            if let Err(e) = self
                .signaling
                .send_candidate(&call.remote_user_id, candidate)
                .await
            {
                tracing::warn!(
                    session_id = %call.session_id,
                    error = %e,
                    "failed to send buffered local candidate"
                );
            }
        }
        if let Some(media) = call.media.as_ref() {
            for candidate in call.pending_remote_candidates.drain(..) {
                if let Err(e) = media.add_remote_candidate(&candidate).await {
                    tracing::warn!(
                        session_id = %call.session_id,
                        error = %e,
                        "failed to apply buffered remote candidate"
                    );
                }
            }
        }
    }

    /// Pump the media session's event stream into the state machine.
    ///
    /// Failure events hand off to a fresh task before the pump exits: the
    /// pump's own handle is aborted during teardown, and teardown must never
    /// run on the task it is about to cancel.
    pub(crate) fn spawn_media_pump(
        self: &Arc<Self>,
        session_id: CallId,
        mut events: mpsc::Receiver<MediaSessionEvent>,
    ) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    MediaSessionEvent::Error(reason) => {
                        let manager = Arc::clone(&manager);
                        tokio::spawn(async move {
                            manager
                                .handle_media_failure(session_id, Some(reason))
                                .await;
                        });
                        break;
                    }
                    MediaSessionEvent::Closed => {
                        let manager = Arc::clone(&manager);
                        tokio::spawn(async move {
                            manager.handle_media_failure(session_id, None).await;
                        });
                        break;
                    }
                    other => manager.handle_media_event(session_id, other).await,
                }
            }
        })
    }

    /// Non-fatal media session events.
    async fn handle_media_event(self: &Arc<Self>, session_id: CallId, event: MediaSessionEvent) {
        let mut active = self.active.lock().await;
        let call = match active.as_mut() {
            Some(call) if call.session_id == session_id => call,
            _ => {
                tracing::debug!(%session_id, "dropping media event for terminated session");
                return;
            }
        };

        match event {
            MediaSessionEvent::LocalCandidate(candidate) => {
                if call.has_remote_description {
                    if let Err(e) = self
                        .signaling
                        .send_candidate(&call.remote_user_id, candidate)
                        .await
                    {
                        tracing::warn!(
                            session_id = %call.session_id,
                            error = %e,
                            "failed to send local candidate"
                        );
                    }
                } else {
                    call.pending_local_candidates.push(candidate);
                }
            }
            MediaSessionEvent::Connected => {
                if call.state != CallState::Connecting {
                    tracing::debug!(
                        session_id = %call.session_id,
                        state = ?call.state,
                        "ignoring connect event outside Connecting"
                    );
                    return;
                }
                call.connected_at = Some(Utc::now());
                call.connected_monotonic = Some(tokio::time::Instant::now());
                call.tick_task = Some(self.spawn_duration_tick(session_id));
                self.transition(call, CallState::Connected, "media transport connected");
            }
            MediaSessionEvent::RemoteStream(stream) => {
                self.on_remote_stream(call, stream);
            }
            MediaSessionEvent::Error(_) | MediaSessionEvent::Closed => {
                // handled by the pump before dispatching here
            }
        }
    }

    fn on_remote_stream(&self, call: &mut ActiveCall, stream: StreamHandle) {
        tracing::debug!(
            session_id = %call.session_id,
            stream_id = %stream.id,
            "remote stream available"
        );
        call.remote_stream = Some(stream.clone());
        self.emit(SessionEvent::RemoteStream {
            session_id: call.session_id,
            stream,
        });
    }

    /// Terminal media engine events (`Error`, `Closed`).
    async fn handle_media_failure(self: &Arc<Self>, session_id: CallId, reason: Option<String>) {
        let mut active = self.active.lock().await;
        match active.take() {
            Some(call) if call.session_id == session_id => {
                let end_reason = match reason {
                    Some(reason) => EndReason::Failed(reason),
                    None => EndReason::EngineClosed,
                };
                self.finish_call(call, end_reason).await;
            }
            other => {
                tracing::debug!(%session_id, "dropping media failure for terminated session");
                *active = other;
            }
        }
    }

    /// Start the ring/timeout supervisor for an outgoing call.
    ///
    /// The stored handle is the sleeper only; expiry hands off to a fresh
    /// task, because teardown aborts the stored handle and must never cancel
    /// its own cleanup mid-flight.
    pub(crate) fn spawn_ring_timer(self: &Arc<Self>, session_id: CallId) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        let timeout = self.config.ring_timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            tokio::spawn(async move {
                manager.handle_ring_timeout(session_id).await;
            });
        })
    }

    /// Ring timer expiry: same teardown path as a local hangup, with
    /// `no_answer` as the outcome. Only valid while still `Calling`.
    async fn handle_ring_timeout(self: &Arc<Self>, session_id: CallId) {
        let mut active = self.active.lock().await;
        match active.take() {
            Some(call)
                if call.session_id == session_id && call.state == CallState::Calling =>
            {
                tracing::info!(%session_id, "outgoing call timed out with no answer");
                self.finish_call(call, EndReason::RingTimeout).await;
            }
            other => {
                tracing::debug!(%session_id, "ignoring ring timeout for stale session");
                *active = other;
            }
        }
    }

    /// Emit a `DurationTick` every tick interval while connected.
    fn spawn_duration_tick(self: &Arc<Self>, session_id: CallId) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        let interval = self.config.tick_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // the first tick of a tokio interval fires immediately
            ticker.tick().await;
            let mut seconds: u64 = 0;
            loop {
                ticker.tick().await;
                seconds += interval.as_secs().max(1);
                manager.emit(SessionEvent::DurationTick { session_id, seconds });
            }
        })
    }
}

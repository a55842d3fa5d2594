//! User-facing call operations.
//!
//! This module contains the operations a UI invokes directly: placing a
//! call, answering or declining an incoming one, hanging up, and reading
//! call history. Inbound signaling and media events are handled in
//! [`super::handlers`]; both funnel into the same mutex-guarded session slot
//! so user actions and remote events can race safely.

use std::sync::Arc;

use chrono::Utc;

use crate::call::{CallDirection, CallId, CallState, MediaKind};
use crate::call_log::{CallLogEntry, CallLogStats};
use crate::error::{CallError, CallResult};
use crate::events::SessionEvent;

use super::manager::{ActiveCall, CallSessionManager, EndReason};

impl CallSessionManager {
    /// Place an outgoing call to `remote_user_id`.
    ///
    /// Acquires local media, creates the media session, sends the offer over
    /// the signaling channel, and starts the ring/timeout supervisor. The
    /// session moves `Idle -> Calling`.
    ///
    /// # Errors
    ///
    /// * [`CallError::Busy`] - a session is already in progress; it is left
    ///   untouched
    /// * [`CallError::MediaUnavailable`] - capture failed; the slot reverts
    ///   to `Idle` and no call log entry is written (no offer was ever sent)
    /// * [`CallError::SignalingFailed`] - the relay rejected the offer
    pub async fn initiate(
        self: &Arc<Self>,
        remote_user_id: &str,
        media_kind: MediaKind,
    ) -> CallResult<CallId> {
        let mut active = self.active.lock().await;
        if let Some(call) = active.as_ref() {
            tracing::debug!(
                current_state = ?call.state,
                "initiate refused: a call is already in progress"
            );
            return Err(CallError::Busy { current_state: call.state });
        }

        let mut call = ActiveCall::new(
            remote_user_id.to_string(),
            CallDirection::Outgoing,
            media_kind,
            CallState::Calling,
        );
        let session_id = call.session_id;

        // The slot stays empty until every fallible setup step has passed;
        // a failure here reverts to Idle with no log entry.
        let local_stream = self.media.acquire(media_kind).await?;

        let (media, media_events) = match self.media.create_session(&local_stream).await {
            Ok(created) => created,
            Err(e) => {
                self.media.release(local_stream).await;
                return Err(e);
            }
        };

        let offer = match media.create_offer().await {
            Ok(description) => description,
            Err(e) => {
                media.close().await;
                self.media.release(local_stream).await;
                return Err(e);
            }
        };

        if let Err(e) = self
            .signaling
            .send_offer(remote_user_id, offer, self.offer_meta(media_kind))
            .await
        {
            media.close().await;
            self.media.release(local_stream).await;
            return Err(e);
        }

        call.local_stream = Some(local_stream);
        call.media = Some(media);
        call.media_pump = Some(self.spawn_media_pump(session_id, media_events));
        call.ring_timer = Some(self.spawn_ring_timer(session_id));
        self.load_video_devices(&mut call).await;

        tracing::info!(
            session_id = %session_id,
            remote = %remote_user_id,
            kind = ?media_kind,
            "outgoing call started"
        );
        self.emit(SessionEvent::StateChanged {
            session_id,
            new_state: CallState::Calling,
            previous_state: None,
            reason: Some("call initiated".to_string()),
            timestamp: Utc::now(),
        });

        *active = Some(call);
        Ok(session_id)
    }

    /// Accept the incoming call.
    ///
    /// Acquires local media, derives an answer from the stored offer, and
    /// sends it. The session moves `Receiving -> Connecting`.
    ///
    /// # Errors
    ///
    /// * [`CallError::Busy`] - there is no session in `Receiving`; nothing
    ///   is mutated
    /// * [`CallError::MediaUnavailable`] / [`CallError::NegotiationFailed`] -
    ///   setup failed; the session is torn down normally (End is sent, one
    ///   `missed` log entry is written)
    pub async fn accept(self: &Arc<Self>) -> CallResult<()> {
        let mut active = self.active.lock().await;

        // The session leaves the slot for the duration of the setup; the
        // lock is held throughout, so no other handler observes the gap.
        let mut call = match active.take() {
            Some(call) if call.state.can_accept() => call,
            Some(call) => {
                let current_state = call.state;
                *active = Some(call);
                return Err(CallError::Busy { current_state });
            }
            None => {
                return Err(CallError::Busy { current_state: CallState::Idle });
            }
        };

        let offer = match call.stored_offer.clone() {
            Some(offer) => offer,
            None => {
                *active = Some(call);
                return Err(CallError::internal_error(
                    "receiving session has no stored offer",
                ));
            }
        };

        let local_stream = match self.media.acquire(call.media_kind).await {
            Ok(stream) => stream,
            Err(e) => {
                self.finish_call(call, EndReason::Failed(e.to_string())).await;
                return Err(e);
            }
        };
        call.local_stream = Some(local_stream.clone());

        let (media, media_events) = match self.media.create_session(&local_stream).await {
            Ok(created) => created,
            Err(e) => {
                self.finish_call(call, EndReason::Failed(e.to_string())).await;
                return Err(e);
            }
        };

        let answer = match media.create_answer(&offer).await {
            Ok(description) => description,
            Err(e) => {
                call.media = Some(media);
                self.finish_call(call, EndReason::Failed(e.to_string())).await;
                return Err(e);
            }
        };

        if let Err(e) = self
            .signaling
            .send_answer(&call.remote_user_id, answer)
            .await
        {
            call.media = Some(media);
            self.finish_call(call, EndReason::Failed(e.to_string())).await;
            return Err(e);
        }

        call.media = Some(media);
        // create_answer applied the stored offer as the remote description,
        // so buffered remote candidates can flow now.
        call.has_remote_description = true;
        call.stored_offer = None;
        call.media_pump = Some(self.spawn_media_pump(call.session_id, media_events));
        self.transition(&mut call, CallState::Connecting, "call accepted");
        self.flush_pending_candidates(&mut call).await;
        self.load_video_devices(&mut call).await;

        *active = Some(call);
        Ok(())
    }

    /// Decline the incoming call.
    ///
    /// No media was ever acquired in `Receiving`, so teardown amounts to
    /// sending End and recording a `rejected` entry. Declining when no call
    /// is in `Receiving` is a no-op.
    pub async fn decline(&self) -> CallResult<()> {
        let mut active = self.active.lock().await;
        match active.take() {
            Some(call) if call.state.can_accept() => {
                self.finish_call(call, EndReason::LocalDecline).await;
                Ok(())
            }
            Some(call) => {
                tracing::debug!(
                    state = ?call.state,
                    "decline ignored: session already left Receiving"
                );
                *active = Some(call);
                Ok(())
            }
            None => {
                tracing::debug!("decline ignored: no active session");
                Ok(())
            }
        }
    }

    /// Hang up the active call, whatever its state.
    ///
    /// This is the single user-facing resource release path and it is
    /// idempotent: a second invocation (or a race with an inbound End,
    /// engine error, or ring timeout) finds the slot empty and does nothing.
    pub async fn hangup(&self) -> CallResult<()> {
        let mut active = self.active.lock().await;
        match active.take() {
            Some(call) => {
                self.finish_call(call, EndReason::LocalHangup).await;
                Ok(())
            }
            None => {
                tracing::debug!("hangup ignored: no active session");
                Ok(())
            }
        }
    }

    /// Most recent call log entries for the local participant, newest first.
    pub async fn call_history(&self, limit: usize) -> CallResult<Vec<CallLogEntry>> {
        self.call_log.list(&self.config.local_user_id, limit).await
    }

    /// Aggregate call statistics for the local participant.
    pub async fn call_stats(&self) -> CallResult<CallLogStats> {
        self.call_log.stats(&self.config.local_user_id).await
    }

    /// Delete the local participant's call history.
    pub async fn clear_history(&self) -> CallResult<()> {
        self.call_log.clear(&self.config.local_user_id).await
    }
}

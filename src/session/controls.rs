//! In-call controls: mute, camera toggle, and the video device switcher.

use std::sync::Arc;

use crate::call::CallState;
use crate::error::{CallError, CallResult};
use crate::media::{MediaSession, VideoDevice};

use super::manager::{ActiveCall, CallSessionManager};

/// Session slot view for a control operation: the session plus its live
/// media, or the state error to return.
fn live_media<'a>(
    call: Option<&'a mut ActiveCall>,
    expected: &str,
    needs_video: bool,
) -> CallResult<(&'a mut ActiveCall, Arc<dyn MediaSession>)> {
    let call = match call {
        Some(call) => call,
        None => {
            return Err(CallError::InvalidCallState {
                expected: expected.to_string(),
                actual: CallState::Idle,
            });
        }
    };
    if needs_video && !call.media_kind.has_video() {
        return Err(CallError::InvalidCallState {
            expected: expected.to_string(),
            actual: call.state,
        });
    }
    match call.media.clone() {
        Some(media) => Ok((call, media)),
        None => Err(CallError::InvalidCallState {
            expected: expected.to_string(),
            actual: call.state,
        }),
    }
}

impl CallSessionManager {
    /// Mute or unmute the outgoing audio track.
    pub async fn set_muted(&self, muted: bool) -> CallResult<()> {
        let mut active = self.active.lock().await;
        let (call, media) = live_media(active.as_mut(), "a session with live media", false)?;

        media.set_muted(muted).await?;
        call.muted = muted;
        tracing::debug!(session_id = %call.session_id, muted, "microphone mute changed");
        Ok(())
    }

    /// Enable or disable the outgoing video track.
    pub async fn set_camera_enabled(&self, enabled: bool) -> CallResult<()> {
        let mut active = self.active.lock().await;
        let (call, media) =
            live_media(active.as_mut(), "a video session with live media", true)?;

        media.set_camera_enabled(enabled).await?;
        call.camera_enabled = enabled;
        tracing::debug!(session_id = %call.session_id, enabled, "camera changed");
        Ok(())
    }

    /// Switch the outgoing video to the next capture source.
    ///
    /// Replaces only the outgoing video track on the live media session: no
    /// renegotiation, the session id does not change, and the audio track is
    /// untouched. Returns the device now in use.
    pub async fn cycle_camera(&self) -> CallResult<VideoDevice> {
        let mut active = self.active.lock().await;
        let (call, media) =
            live_media(active.as_mut(), "a video session with live media", true)?;

        if call.video_devices.is_empty() {
            // enumeration can have failed at acquisition time; retry once
            call.video_devices = self.media.list_video_devices().await?;
        }
        if call.video_devices.is_empty() {
            return Err(CallError::media_unavailable("no video capture devices"));
        }

        let next_index = (call.video_device_index + 1) % call.video_devices.len();
        let device = call.video_devices[next_index].clone();
        media.replace_video_track(&device.id).await?;
        call.video_device_index = next_index;

        tracing::info!(
            session_id = %call.session_id,
            device = %device.label,
            "switched video capture source"
        );
        Ok(device)
    }

    /// Video capture sources enumerated for the active session.
    pub async fn video_devices(&self) -> Vec<VideoDevice> {
        self.active
            .lock()
            .await
            .as_ref()
            .map(|call| call.video_devices.clone())
            .unwrap_or_default()
    }
}

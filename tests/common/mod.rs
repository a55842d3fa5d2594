//! Shared mock adapters for the integration tests.
//!
//! `MockSignaling` records every outbound message; `MockMediaEngine` hands
//! out controllable media sessions whose lifecycle events the tests inject
//! by hand. Both are cheap enough that every test builds its own manager.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use peercall_core::media::{
    MediaEngine, MediaSession, MediaSessionEvent, StreamHandle, VideoDevice,
};
use peercall_core::signaling::{
    IceCandidate, SessionDescription, SignalingChannel, SignalingMessage,
};
use peercall_core::{
    CallError, CallLogStore, CallMeta, CallResult, CallSessionManager, MediaKind,
    MemoryCallLogStore, SessionBuilder,
};

/// Outbound message recorded by the mock signaling channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Offer { to: String, description: SessionDescription, meta: CallMeta },
    Answer { to: String, description: SessionDescription },
    Candidate { to: String, candidate: IceCandidate },
    End { to: String },
}

#[derive(Default)]
pub struct MockSignaling {
    sent: Mutex<Vec<Sent>>,
}

impl MockSignaling {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn ends_sent_to(&self, user: &str) -> usize {
        self.sent()
            .iter()
            .filter(|m| matches!(m, Sent::End { to } if to == user))
            .count()
    }

    pub fn candidates_sent_to(&self, user: &str) -> Vec<IceCandidate> {
        self.sent()
            .iter()
            .filter_map(|m| match m {
                Sent::Candidate { to, candidate } if to == user => Some(candidate.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl SignalingChannel for MockSignaling {
    async fn send_offer(
        &self,
        to: &str,
        description: SessionDescription,
        meta: CallMeta,
    ) -> CallResult<()> {
        self.sent.lock().unwrap().push(Sent::Offer {
            to: to.to_string(),
            description,
            meta,
        });
        Ok(())
    }

    async fn send_answer(&self, to: &str, description: SessionDescription) -> CallResult<()> {
        self.sent.lock().unwrap().push(Sent::Answer {
            to: to.to_string(),
            description,
        });
        Ok(())
    }

    async fn send_candidate(&self, to: &str, candidate: IceCandidate) -> CallResult<()> {
        self.sent.lock().unwrap().push(Sent::Candidate {
            to: to.to_string(),
            candidate,
        });
        Ok(())
    }

    async fn send_end(&self, to: &str) -> CallResult<()> {
        self.sent.lock().unwrap().push(Sent::End { to: to.to_string() });
        Ok(())
    }
}

/// Controllable media session handed out by [`MockMediaEngine`].
pub struct MockMediaSession {
    events: mpsc::Sender<MediaSessionEvent>,
    pub applied_remote: Mutex<Vec<SessionDescription>>,
    pub remote_candidates: Mutex<Vec<IceCandidate>>,
    pub replaced_tracks: Mutex<Vec<String>>,
    pub mute_calls: Mutex<Vec<bool>>,
    pub camera_calls: Mutex<Vec<bool>>,
    pub closed: AtomicBool,
}

impl MockMediaSession {
    /// Inject a lifecycle event, as the platform engine would.
    pub async fn push(&self, event: MediaSessionEvent) {
        self.events.send(event).await.expect("event pump gone");
    }

    pub fn remote_candidate_count(&self) -> usize {
        self.remote_candidates.lock().unwrap().len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaSession for MockMediaSession {
    async fn create_offer(&self) -> CallResult<SessionDescription> {
        Ok(SessionDescription::new("mock-offer"))
    }

    async fn create_answer(&self, remote: &SessionDescription) -> CallResult<SessionDescription> {
        self.applied_remote.lock().unwrap().push(remote.clone());
        Ok(SessionDescription::new("mock-answer"))
    }

    async fn apply_remote_description(&self, description: &SessionDescription) -> CallResult<()> {
        self.applied_remote.lock().unwrap().push(description.clone());
        Ok(())
    }

    async fn add_remote_candidate(&self, candidate: &IceCandidate) -> CallResult<()> {
        self.remote_candidates.lock().unwrap().push(candidate.clone());
        Ok(())
    }

    async fn replace_video_track(&self, device_id: &str) -> CallResult<()> {
        self.replaced_tracks.lock().unwrap().push(device_id.to_string());
        Ok(())
    }

    async fn set_muted(&self, muted: bool) -> CallResult<()> {
        self.mute_calls.lock().unwrap().push(muted);
        Ok(())
    }

    async fn set_camera_enabled(&self, enabled: bool) -> CallResult<()> {
        self.camera_calls.lock().unwrap().push(enabled);
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

pub struct MockMediaEngine {
    pub deny_media: AtomicBool,
    pub acquired: AtomicUsize,
    pub released: Mutex<Vec<StreamHandle>>,
    pub devices: Mutex<Vec<VideoDevice>>,
    sessions: Mutex<Vec<Arc<MockMediaSession>>>,
}

impl MockMediaEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            deny_media: AtomicBool::new(false),
            acquired: AtomicUsize::new(0),
            released: Mutex::new(Vec::new()),
            devices: Mutex::new(vec![
                VideoDevice { id: "cam-front".into(), label: "Front Camera".into() },
                VideoDevice { id: "cam-back".into(), label: "Back Camera".into() },
            ]),
            sessions: Mutex::new(Vec::new()),
        })
    }

    pub fn deny(&self) {
        self.deny_media.store(true, Ordering::SeqCst);
    }

    /// The most recently created media session.
    pub fn session(&self) -> Arc<MockMediaSession> {
        self.sessions
            .lock()
            .unwrap()
            .last()
            .expect("no media session created")
            .clone()
    }

    pub fn sessions_created(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn released_count(&self) -> usize {
        self.released.lock().unwrap().len()
    }
}

#[async_trait]
impl MediaEngine for MockMediaEngine {
    async fn acquire(&self, kind: MediaKind) -> CallResult<StreamHandle> {
        if self.deny_media.load(Ordering::SeqCst) {
            return Err(CallError::media_unavailable("permission denied"));
        }
        let n = self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(StreamHandle { id: format!("local-{}", n), kind })
    }

    async fn release(&self, stream: StreamHandle) {
        self.released.lock().unwrap().push(stream);
    }

    async fn create_session(
        &self,
        _local: &StreamHandle,
    ) -> CallResult<(Arc<dyn MediaSession>, mpsc::Receiver<MediaSessionEvent>)> {
        let (tx, rx) = mpsc::channel(32);
        let session = Arc::new(MockMediaSession {
            events: tx,
            applied_remote: Mutex::new(Vec::new()),
            remote_candidates: Mutex::new(Vec::new()),
            replaced_tracks: Mutex::new(Vec::new()),
            mute_calls: Mutex::new(Vec::new()),
            camera_calls: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        });
        self.sessions.lock().unwrap().push(session.clone());
        Ok((session, rx))
    }

    async fn list_video_devices(&self) -> CallResult<Vec<VideoDevice>> {
        Ok(self.devices.lock().unwrap().clone())
    }
}

/// Everything a test needs: the manager plus handles to all three mocks.
pub struct Harness {
    pub session: Arc<CallSessionManager>,
    pub signaling: Arc<MockSignaling>,
    pub engine: Arc<MockMediaEngine>,
    pub store: Arc<MemoryCallLogStore>,
}

/// Build a manager for `local_user` wired to fresh mocks.
pub fn harness(local_user: &str) -> Harness {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("peercall_core=debug")
        .with_test_writer()
        .try_init();

    let signaling = MockSignaling::new();
    let engine = MockMediaEngine::new();
    let store = Arc::new(MemoryCallLogStore::new());
    let session = SessionBuilder::new()
        .local_user(local_user)
        .display_name("Test User")
        .signaling(signaling.clone())
        .media_engine(engine.clone())
        .call_log(store.clone())
        .build()
        .expect("failed to build session manager");
    Harness { session, signaling, engine, store }
}

/// An inbound offer from `from`, addressed to `to`.
pub fn offer_from(from: &str, to: &str, kind: MediaKind) -> SignalingMessage {
    SignalingMessage::Offer {
        from: from.to_string(),
        to: to.to_string(),
        description: SessionDescription::new("remote-offer"),
        meta: CallMeta { display_name: Some(from.to_string()), media_kind: kind },
    }
}

pub fn answer_from(from: &str, to: &str) -> SignalingMessage {
    SignalingMessage::Answer {
        from: from.to_string(),
        to: to.to_string(),
        description: SessionDescription::new("remote-answer"),
    }
}

pub fn candidate_from(from: &str, to: &str, payload: &str) -> SignalingMessage {
    SignalingMessage::Candidate {
        from: from.to_string(),
        to: to.to_string(),
        candidate: IceCandidate {
            candidate: payload.to_string(),
            sdp_mid: Some("0".to_string()),
            sdp_mline_index: Some(0),
        },
    }
}

pub fn end_from(from: &str, to: &str) -> SignalingMessage {
    SignalingMessage::End { from: from.to_string(), to: to.to_string() }
}

/// Wait for the session slot to reach `state`.
pub async fn wait_for_state(session: &CallSessionManager, state: peercall_core::CallState) {
    for _ in 0..200 {
        if session.current_state().await == state {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!(
        "session never reached {:?}, still {:?}",
        state,
        session.current_state().await
    );
}

/// Poll `predicate` until it holds or the (virtual) deadline passes.
pub async fn wait_until<F>(mut predicate: F)
where
    F: FnMut() -> bool,
{
    for _ in 0..200 {
        if predicate() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

/// Wait until the log for `user` holds `count` entries, then return them.
pub async fn wait_for_entries(
    store: &MemoryCallLogStore,
    user: &str,
    count: usize,
) -> Vec<peercall_core::CallLogEntry> {
    for _ in 0..200 {
        let entries = store.list(user, 16).await.unwrap();
        if entries.len() >= count {
            return entries;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("call log never reached {} entries for {}", count, user);
}

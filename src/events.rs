//! UI-facing events published by the session core.
//!
//! Events are fanned out over a [`tokio::sync::broadcast`] channel obtained
//! from [`CallSessionManager::subscribe_events`](crate::session::CallSessionManager::subscribe_events).
//! Each receiver is a disposable handle: dropping it unsubscribes, so a
//! listener can never outlive the screen that created it.
//!
//! # Example
//!
//! ```rust,no_run
//! # use peercall_core::{SessionEvent, CallState};
//! # use peercall_core::session::CallSessionManager;
//! # use std::sync::Arc;
//! # async fn example(session: Arc<CallSessionManager>) {
//! let mut events = session.subscribe_events();
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv().await {
//!         match event {
//!             SessionEvent::IncomingCall { caller_id, .. } => {
//!                 println!("incoming call from {}", caller_id);
//!             }
//!             SessionEvent::StateChanged { new_state: CallState::Idle, .. } => break,
//!             _ => {}
//!         }
//!     }
//! });
//! # }
//! ```

use chrono::{DateTime, Utc};

use crate::call::{CallId, CallMeta, CallState};
use crate::call_log::CallLogEntry;
use crate::media::StreamHandle;

/// Event published by the session core for UI consumption.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The session moved to a new state.
    StateChanged {
        session_id: CallId,
        new_state: CallState,
        previous_state: Option<CallState>,
        /// Why the transition happened (e.g. "answer received", "ring timeout").
        reason: Option<String>,
        timestamp: DateTime<Utc>,
    },
    /// An inbound offer created a new `Receiving` session.
    IncomingCall {
        session_id: CallId,
        caller_id: String,
        meta: CallMeta,
        timestamp: DateTime<Utc>,
    },
    /// The remote party's stream became available for rendering.
    RemoteStream {
        session_id: CallId,
        stream: StreamHandle,
    },
    /// One-second heartbeat while the call is connected.
    DurationTick {
        session_id: CallId,
        seconds: u64,
    },
    /// The session terminated and its log entry was produced.
    CallEnded {
        session_id: CallId,
        entry: CallLogEntry,
    },
}

//! peercall-core: call session negotiation and state-management core
//!
//! This crate turns a user's intent to start a voice/video call into a live
//! peer media session, tracks it to completion, and records its outcome. The
//! signaling relay, the platform media engine, and the durable call log are
//! external collaborators consumed through traits.
//!
//! ## Layer separation
//! ```text
//! UI -> CallSessionManager -> {SignalingChannel, MediaEngine}
//!                          -> CallLogStore (terminal transitions only)
//! ```
//!
//! The core focuses on:
//! - The session state machine (`Idle -> Calling/Receiving -> Connecting ->
//!   Connected -> Idle`) with monotonic transitions
//! - Racing inputs: signaling messages, media engine events, user actions,
//!   and the ring timer all funnel into one guarded session slot
//! - Idempotent teardown with exactly one call log entry per session
//! - Event publication for UI integration

pub mod call;
pub mod call_log;
pub mod error;
pub mod events;
pub mod media;
pub mod session;
pub mod signaling;

// Public API exports
pub use call::{CallDirection, CallId, CallMeta, CallSnapshot, CallState, MediaKind};
pub use call_log::{CallLogEntry, CallLogStats, CallLogStore, CallOutcome, MemoryCallLogStore};
pub use error::{CallError, CallResult};
pub use events::SessionEvent;
pub use media::{MediaEngine, MediaSession, MediaSessionEvent, StreamHandle, VideoDevice};
pub use session::{CallSessionManager, SessionBuilder, SessionConfig};
pub use signaling::{IceCandidate, SessionDescription, SignalingChannel, SignalingMessage};

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

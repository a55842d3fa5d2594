//! Error types and handling for the call session core.
//!
//! Errors are categorized to help with handling strategies:
//!
//! - **State errors** (`Busy`, `InvalidCallState`) — the operation is not
//!   valid right now; returned synchronously and never mutate an existing
//!   session.
//! - **Media errors** (`MediaUnavailable`, `NegotiationFailed`) — surface to
//!   the UI and force an immediate teardown of the affected session.
//! - **Signaling errors** (`SignalingFailed`) — the relay could not accept an
//!   outbound message; there is no delivery acknowledgment beyond this.
//!
//! A ring timeout is a normal terminal transition, not an error, and no
//! operation in this crate is retried automatically.
//!
//! # Basic pattern
//!
//! ```rust,no_run
//! # use peercall_core::{CallError, MediaKind};
//! # use peercall_core::session::CallSessionManager;
//! # use std::sync::Arc;
//! # async fn example(session: Arc<CallSessionManager>) {
//! match session.initiate("bob", MediaKind::AudioVideo).await {
//!     Ok(call_id) => println!("calling, session {}", call_id),
//!     Err(CallError::Busy { current_state }) => {
//!         eprintln!("already in a call ({:?})", current_state);
//!     }
//!     Err(CallError::MediaUnavailable { reason }) => {
//!         eprintln!("no camera/microphone: {}", reason);
//!     }
//!     Err(e) => eprintln!("call failed: {}", e),
//! }
//! # }
//! ```

use thiserror::Error;

use crate::call::CallState;

/// Result type alias for call session operations.
pub type CallResult<T> = Result<T, CallError>;

/// Error types for call session operations.
#[derive(Error, Debug, Clone)]
pub enum CallError {
    /// A session is already in progress; the existing session is untouched.
    #[error("busy: a call is already in progress (state {current_state:?})")]
    Busy { current_state: CallState },

    /// The operation requires a different session state.
    #[error("invalid call state: expected {expected}, got {actual:?}")]
    InvalidCallState { expected: String, actual: CallState },

    /// Local capture failed: permission denied or no such device.
    #[error("media unavailable: {reason}")]
    MediaUnavailable { reason: String },

    /// The media engine failed to negotiate or maintain the session.
    #[error("negotiation failed: {reason}")]
    NegotiationFailed { reason: String },

    /// The signaling relay rejected an outbound message.
    #[error("signaling failed: {reason}")]
    SignalingFailed { reason: String },

    /// The call log store rejected a write or read.
    #[error("call log failed: {reason}")]
    CallLogFailed { reason: String },

    /// A required piece of configuration or wiring is missing.
    #[error("missing required configuration: {field}")]
    MissingConfiguration { field: String },

    /// Unexpected internal error.
    #[error("internal error: {message}")]
    InternalError { message: String },
}

impl CallError {
    /// Create a media unavailable error.
    pub fn media_unavailable(reason: impl Into<String>) -> Self {
        Self::MediaUnavailable { reason: reason.into() }
    }

    /// Create a negotiation failed error.
    pub fn negotiation_failed(reason: impl Into<String>) -> Self {
        Self::NegotiationFailed { reason: reason.into() }
    }

    /// Create a signaling failed error.
    pub fn signaling_failed(reason: impl Into<String>) -> Self {
        Self::SignalingFailed { reason: reason.into() }
    }

    /// Create a call log failed error.
    pub fn call_log_failed(reason: impl Into<String>) -> Self {
        Self::CallLogFailed { reason: reason.into() }
    }

    /// Create an internal error.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError { message: message.into() }
    }

    /// Check if this error forces a teardown of the affected session.
    pub fn is_media_error(&self) -> bool {
        matches!(
            self,
            CallError::MediaUnavailable { .. } | CallError::NegotiationFailed { .. }
        )
    }

    /// Check if this error is a synchronous state guard (no session mutated).
    pub fn is_state_error(&self) -> bool {
        matches!(
            self,
            CallError::Busy { .. } | CallError::InvalidCallState { .. }
        )
    }

    /// Get error category for metrics/logging.
    pub fn category(&self) -> &'static str {
        match self {
            CallError::Busy { .. } |
            CallError::InvalidCallState { .. } => "state",

            CallError::MediaUnavailable { .. } |
            CallError::NegotiationFailed { .. } => "media",

            CallError::SignalingFailed { .. } => "signaling",

            CallError::CallLogFailed { .. } => "call_log",

            CallError::MissingConfiguration { .. } => "configuration",

            CallError::InternalError { .. } => "system",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        let busy = CallError::Busy { current_state: CallState::Calling };
        assert_eq!(busy.category(), "state");
        assert!(busy.is_state_error());
        assert!(!busy.is_media_error());

        let media = CallError::media_unavailable("permission denied");
        assert_eq!(media.category(), "media");
        assert!(media.is_media_error());
    }
}

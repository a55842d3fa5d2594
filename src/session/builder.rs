//! Builder for wiring a [`CallSessionManager`] to its adapters.
//!
//! # Example
//!
//! ```rust,no_run
//! # use peercall_core::SessionBuilder;
//! # use peercall_core::signaling::SignalingChannel;
//! # use peercall_core::media::MediaEngine;
//! # use std::sync::Arc;
//! # use std::time::Duration;
//! # fn example(
//! #     signaling: Arc<dyn SignalingChannel>,
//! #     engine: Arc<dyn MediaEngine>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let session = SessionBuilder::new()
//!     .local_user("alice")
//!     .display_name("Alice")
//!     .ring_timeout(Duration::from_secs(45))
//!     .signaling(signaling)
//!     .media_engine(engine)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::call_log::{CallLogStore, MemoryCallLogStore};
use crate::error::{CallError, CallResult};
use crate::media::MediaEngine;
use crate::signaling::SignalingChannel;

use super::config::SessionConfig;
use super::manager::CallSessionManager;

/// Builder for [`CallSessionManager`].
///
/// The signaling channel and media engine are required; the call log store
/// defaults to an in-process [`MemoryCallLogStore`].
#[derive(Default)]
pub struct SessionBuilder {
    local_user_id: Option<String>,
    display_name: Option<String>,
    ring_timeout: Option<Duration>,
    tick_interval: Option<Duration>,
    signaling: Option<Arc<dyn SignalingChannel>>,
    media: Option<Arc<dyn MediaEngine>>,
    call_log: Option<Arc<dyn CallLogStore>>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// User id of the local participant (required).
    pub fn local_user(mut self, user_id: impl Into<String>) -> Self {
        self.local_user_id = Some(user_id.into());
        self
    }

    /// Display name sent on outgoing offers.
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Override the 60-second ring timeout.
    pub fn ring_timeout(mut self, timeout: Duration) -> Self {
        self.ring_timeout = Some(timeout);
        self
    }

    /// Override the 1-second duration tick interval.
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = Some(interval);
        self
    }

    /// Signaling relay adapter (required).
    pub fn signaling(mut self, channel: Arc<dyn SignalingChannel>) -> Self {
        self.signaling = Some(channel);
        self
    }

    /// Media engine adapter (required).
    pub fn media_engine(mut self, engine: Arc<dyn MediaEngine>) -> Self {
        self.media = Some(engine);
        self
    }

    /// Call log store; defaults to [`MemoryCallLogStore`].
    pub fn call_log(mut self, store: Arc<dyn CallLogStore>) -> Self {
        self.call_log = Some(store);
        self
    }

    /// Build the session manager.
    pub fn build(self) -> CallResult<Arc<CallSessionManager>> {
        let local_user_id = self.local_user_id.ok_or(CallError::MissingConfiguration {
            field: "local_user".to_string(),
        })?;
        let signaling = self.signaling.ok_or(CallError::MissingConfiguration {
            field: "signaling".to_string(),
        })?;
        let media = self.media.ok_or(CallError::MissingConfiguration {
            field: "media_engine".to_string(),
        })?;
        let call_log = self
            .call_log
            .unwrap_or_else(|| Arc::new(MemoryCallLogStore::new()));

        let mut config = SessionConfig::new(local_user_id);
        if let Some(name) = self.display_name {
            config = config.with_display_name(name);
        }
        if let Some(timeout) = self.ring_timeout {
            config = config.with_ring_timeout(timeout);
        }
        if let Some(interval) = self.tick_interval {
            config = config.with_tick_interval(interval);
        }

        Ok(CallSessionManager::new(config, signaling, media, call_log))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_requires_adapters() {
        let err = SessionBuilder::new().build().err().expect("build must fail");
        assert!(matches!(err, CallError::MissingConfiguration { ref field } if field == "local_user"));

        let err = SessionBuilder::new()
            .local_user("alice")
            .build()
            .err()
            .expect("build must fail");
        assert!(matches!(err, CallError::MissingConfiguration { ref field } if field == "signaling"));
    }
}

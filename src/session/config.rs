//! Session configuration.

use std::time::Duration;

/// Configuration for one [`CallSessionManager`](super::CallSessionManager).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// User id of the local participant.
    pub local_user_id: String,
    /// Display name sent on outgoing offers.
    pub display_name: Option<String>,
    /// How long an outgoing call rings before giving up with `no_answer`.
    pub ring_timeout: Duration,
    /// Interval of the `DurationTick` heartbeat while connected.
    pub tick_interval: Duration,
}

impl SessionConfig {
    /// Create a configuration for the given local participant with the
    /// default 60-second ring timeout and 1-second duration tick.
    pub fn new(local_user_id: impl Into<String>) -> Self {
        Self {
            local_user_id: local_user_id.into(),
            display_name: None,
            ring_timeout: Duration::from_secs(60),
            tick_interval: Duration::from_secs(1),
        }
    }

    /// Set the display name sent on outgoing offers.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Override the ring timeout.
    pub fn with_ring_timeout(mut self, timeout: Duration) -> Self {
        self.ring_timeout = timeout;
        self
    }

    /// Override the duration tick interval.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }
}

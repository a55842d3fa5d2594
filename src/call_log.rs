//! Call log entries and the durable store contract.
//!
//! Exactly one [`CallLogEntry`] is written per terminated session, on its
//! transition into `Idle`. The write is fire-and-forget: a store failure is
//! logged locally and never blocks, delays, or reverses the state machine's
//! terminal transition.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::call::MediaKind;
use crate::error::CallResult;

/// How a terminated call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    /// Media connected and the call ran until either side hung up.
    Completed,
    /// The call ended abnormally before media connected.
    Missed,
    /// The callee declined, or the caller saw the decline.
    Rejected,
    /// The caller gave up before the callee responded.
    NoAnswer,
}

/// Immutable record of one terminated call session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallLogEntry {
    /// User id of the party that initiated the call.
    pub caller_id: String,
    /// User id of the party that was called.
    pub receiver_id: String,
    /// Media kind of the call.
    pub media_kind: MediaKind,
    /// How the call ended.
    pub outcome: CallOutcome,
    /// Talk time in seconds; zero unless the call connected.
    pub duration_seconds: u64,
    /// When the session was created.
    pub started_at: DateTime<Utc>,
    /// When the session terminated.
    pub ended_at: DateTime<Utc>,
}

/// Aggregate statistics over a user's call log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallLogStats {
    pub total_calls: usize,
    pub completed: usize,
    pub missed: usize,
    pub rejected: usize,
    pub no_answer: usize,
    /// Sum of talk time across completed calls, in seconds.
    pub total_duration_seconds: u64,
}

/// Durable append/read/delete store for call log entries.
#[async_trait]
pub trait CallLogStore: Send + Sync {
    /// Append one entry.
    async fn append(&self, entry: CallLogEntry) -> CallResult<()>;

    /// List the most recent entries involving `user_id`, newest first.
    async fn list(&self, user_id: &str, limit: usize) -> CallResult<Vec<CallLogEntry>>;

    /// Aggregate statistics for `user_id`.
    async fn stats(&self, user_id: &str) -> CallResult<CallLogStats>;

    /// Delete all entries involving `user_id`.
    async fn clear(&self, user_id: &str) -> CallResult<()>;
}

/// In-process call log store, keyed by user id.
///
/// Used as the default store and by the integration tests. Each entry is
/// indexed under both participants, matching how the durable backends fan
/// out per-user history.
#[derive(Debug, Default)]
pub struct MemoryCallLogStore {
    entries: DashMap<String, Vec<CallLogEntry>>,
}

impl MemoryCallLogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CallLogStore for MemoryCallLogStore {
    async fn append(&self, entry: CallLogEntry) -> CallResult<()> {
        self.entries
            .entry(entry.caller_id.clone())
            .or_default()
            .push(entry.clone());
        if entry.receiver_id != entry.caller_id {
            self.entries
                .entry(entry.receiver_id.clone())
                .or_default()
                .push(entry);
        }
        Ok(())
    }

    async fn list(&self, user_id: &str, limit: usize) -> CallResult<Vec<CallLogEntry>> {
        let mut entries = self
            .entries
            .get(user_id)
            .map(|e| e.value().clone())
            .unwrap_or_default();
        entries.reverse();
        entries.truncate(limit);
        Ok(entries)
    }

    async fn stats(&self, user_id: &str) -> CallResult<CallLogStats> {
        let mut stats = CallLogStats::default();
        if let Some(entries) = self.entries.get(user_id) {
            for entry in entries.value() {
                stats.total_calls += 1;
                match entry.outcome {
                    CallOutcome::Completed => {
                        stats.completed += 1;
                        stats.total_duration_seconds += entry.duration_seconds;
                    }
                    CallOutcome::Missed => stats.missed += 1,
                    CallOutcome::Rejected => stats.rejected += 1,
                    CallOutcome::NoAnswer => stats.no_answer += 1,
                }
            }
        }
        Ok(stats)
    }

    async fn clear(&self, user_id: &str) -> CallResult<()> {
        self.entries.remove(user_id);
        Ok(())
    }
}

//! Warm-state tracking
//!
//! Records whether this instance has handled an invocation yet and when it was
//! last accessed. The state lives for as long as the platform keeps reusing the
//! process; nothing is persisted.
//!
//! The platform normally delivers one invocation at a time per instance, but
//! the tracker does not rely on it: the read-then-write in
//! [`WarmState::record_access`] happens under a single mutex.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

/// Instance warm state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceState {
    /// Set on first invocation, never reset
    pub is_warm: bool,

    /// Time of the most recent invocation, `None` before the first one
    pub last_accessed_at: Option<DateTime<Utc>>,
}

/// State as it was before an access was recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessSnapshot {
    pub was_warm: bool,
    pub last_accessed_at: Option<DateTime<Utc>>,
}

impl AccessSnapshot {
    /// Seconds between the previous access and `now`, 0 if never accessed
    pub fn seconds_since_last_access(&self, now: DateTime<Utc>) -> f64 {
        match self.last_accessed_at {
            Some(previous) => {
                let elapsed = now - previous;
                elapsed.num_milliseconds().max(0) as f64 / 1000.0
            }
            None => 0.0,
        }
    }
}

/// Process-wide warm state, shared by every invocation on this instance
#[derive(Debug, Default)]
pub struct WarmState {
    inner: Mutex<InstanceState>,
}

impl WarmState {
    /// Cold state: not warm, never accessed
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the instance warm and accessed now, returning the prior state
    pub fn record_access(&self) -> AccessSnapshot {
        self.record_access_at(Utc::now())
    }

    /// Mark the instance warm and accessed at `now`, returning the prior state
    pub fn record_access_at(&self, now: DateTime<Utc>) -> AccessSnapshot {
        let mut state = self.lock();
        let previous = AccessSnapshot {
            was_warm: state.is_warm,
            last_accessed_at: state.last_accessed_at,
        };
        state.is_warm = true;
        state.last_accessed_at = Some(now);
        previous
    }

    /// Current state without recording an access
    pub fn snapshot(&self) -> InstanceState {
        *self.lock()
    }

    pub fn is_warm(&self) -> bool {
        self.lock().is_warm
    }

    // Both fields are written together under the lock, so a poisoned guard
    // still holds a consistent value.
    fn lock(&self) -> MutexGuard<'_, InstanceState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

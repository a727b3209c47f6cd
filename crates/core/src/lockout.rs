//! Failed-attempt tracking and time-boxed account lock.
//!
//! Lock state is evaluated lazily on each attempt against the caller's
//! notion of "now"; there is no background timer. The repository layer
//! applies [`LockoutPolicy::register_failure`] under a row lock so that
//! concurrent failures never lose an increment.

use chrono::Duration;

use crate::error::CoreError;
use crate::types::Timestamp;

/// Consecutive failures that trigger a lock.
pub const DEFAULT_MAX_FAILED_ATTEMPTS: i32 = 5;

/// Length of the lock window, in minutes.
pub const DEFAULT_LOCK_DURATION_MINS: i64 = 60;

/// Persisted per-user counters relevant to lockout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginCounters {
    pub failed_login_count: i32,
    pub locked_until: Option<Timestamp>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    pub max_failed_attempts: i32,
    pub lock_duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_failed_attempts: DEFAULT_MAX_FAILED_ATTEMPTS,
            lock_duration: Duration::minutes(DEFAULT_LOCK_DURATION_MINS),
        }
    }
}

/// Return `Err(AccountLocked)` while `now` is inside the lock window.
pub fn ensure_not_locked(locked_until: Option<Timestamp>, now: Timestamp) -> Result<(), CoreError> {
    match locked_until {
        Some(until) if now < until => Err(CoreError::AccountLocked { until }),
        _ => Ok(()),
    }
}

/// `true` when a lock was set and its window has already elapsed.
pub fn lock_expired(locked_until: Option<Timestamp>, now: Timestamp) -> bool {
    matches!(locked_until, Some(until) if now >= until)
}

impl LockoutPolicy {
    /// Compute the counters after one more failed attempt.
    ///
    /// An elapsed lock is cleared first, so the failure opens a fresh window
    /// with a count of 1. Reaching the threshold sets `locked_until`.
    pub fn register_failure(&self, current: LoginCounters, now: Timestamp) -> LoginCounters {
        let (base_count, base_lock) = if lock_expired(current.locked_until, now) {
            (0, None)
        } else {
            (current.failed_login_count, current.locked_until)
        };

        let failed_login_count = base_count.saturating_add(1);
        let locked_until = if failed_login_count >= self.max_failed_attempts {
            Some(now + self.lock_duration)
        } else {
            base_lock
        };

        LoginCounters {
            failed_login_count,
            locked_until,
        }
    }

    /// Counters after a successful login.
    pub fn register_success(&self) -> LoginCounters {
        LoginCounters {
            failed_login_count: 0,
            locked_until: None,
        }
    }
}

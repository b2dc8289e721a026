//! Auto-lock policy.
//!
//! Tracks the configured delay and the most recent unlock, and decides when
//! an auto-lock is due. The door condition is checked by the controller;
//! this type only knows about time.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct UnlockMark {
    at: Instant,
    wall: DateTime<Utc>,
}

/// Auto-lock configuration plus the unlock window it is timing.
///
/// A window opens at each recorded unlock and is consumed either by firing
/// or by the lock being locked some other way. A consumed window never
/// fires again; only a later unlock re-arms the policy.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use chrono::Utc;
/// use smartlock_controller::AutoLockPolicy;
/// use tokio::time::Instant;
///
/// let mut policy = AutoLockPolicy::new(10);
/// let t0 = Instant::now();
/// policy.record_unlock(t0, Utc::now());
///
/// assert!(!policy.is_due(t0 + Duration::from_secs(9)));
/// assert!(policy.is_due(t0 + Duration::from_secs(10)));
///
/// policy.consume();
/// assert!(!policy.is_due(t0 + Duration::from_secs(60)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct AutoLockPolicy {
    delay: Option<Duration>,
    last_unlock: Option<UnlockMark>,
    consumed: bool,
}

impl AutoLockPolicy {
    /// `seconds == 0` creates a disabled policy.
    pub fn new(seconds: u64) -> Self {
        Self {
            delay: (seconds > 0).then(|| Duration::from_secs(seconds)),
            last_unlock: None,
            consumed: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.delay.is_some()
    }

    /// Configured delay, `0` when disabled.
    pub fn delay_seconds(&self) -> u64 {
        self.delay.map_or(0, |d| d.as_secs())
    }

    /// Change the delay. Disabling clears the unlock window. Enabling while
    /// the lock is known to be unlocked and no window is open starts one at
    /// `now`.
    pub fn set_delay(
        &mut self,
        seconds: u64,
        now: Instant,
        wall: DateTime<Utc>,
        currently_unlocked: bool,
    ) {
        if seconds == 0 {
            *self = Self::new(0);
            return;
        }
        self.delay = Some(Duration::from_secs(seconds));
        if currently_unlocked && self.last_unlock.is_none() {
            self.record_unlock(now, wall);
        }
    }

    /// Open a new window at `now`.
    ///
    /// Ignored while disabled, and ignored if `now` is earlier than the
    /// window already open. Returns whether the window moved.
    pub fn record_unlock(&mut self, now: Instant, wall: DateTime<Utc>) -> bool {
        if !self.is_enabled() {
            return false;
        }
        if let Some(mark) = self.last_unlock
            && now < mark.at
        {
            return false;
        }
        self.last_unlock = Some(UnlockMark { at: now, wall });
        self.consumed = false;
        true
    }

    /// Close the current window without firing.
    pub fn consume(&mut self) {
        self.consumed = true;
    }

    /// Monotonic time of the last recorded unlock.
    pub fn last_unlock_at(&self) -> Option<Instant> {
        self.last_unlock.map(|mark| mark.at)
    }

    /// Wall-clock time of the last recorded unlock.
    pub fn last_unlock_wall(&self) -> Option<DateTime<Utc>> {
        self.last_unlock.map(|mark| mark.wall)
    }

    /// Whether a window is open and not yet consumed.
    pub fn is_armed(&self) -> bool {
        self.is_enabled() && self.last_unlock.is_some() && !self.consumed
    }

    /// Whether the time condition for an auto-lock holds at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        match (self.delay, self.last_unlock) {
            (Some(delay), Some(mark)) if !self.consumed => {
                now.saturating_duration_since(mark.at) >= delay
            }
            _ => false,
        }
    }

    /// Time left until the window is due, if armed.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        if !self.is_armed() {
            return None;
        }
        let delay = self.delay?;
        let mark = self.last_unlock?;
        Some(delay.saturating_sub(now.saturating_duration_since(mark.at)))
    }
}

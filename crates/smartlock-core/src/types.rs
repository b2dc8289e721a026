use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Lock bolt state as reported by the lock-state reed switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    Locked,
    Unlocked,
    /// Sensor absent, disabled, failing, or not yet settled.
    Unknown,
}

impl LockState {
    /// Map a debounced switch reading (`true` = switch ON = locked).
    #[must_use]
    pub fn from_reading(reading: Option<bool>) -> Self {
        match reading {
            Some(true) => LockState::Locked,
            Some(false) => LockState::Unlocked,
            None => LockState::Unknown,
        }
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LockState::Locked => "locked",
            LockState::Unlocked => "unlocked",
            LockState::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// Door leaf state as reported by the door-state reed switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorState {
    Open,
    Closed,
    Unknown,
}

impl DoorState {
    /// Map a debounced switch reading (`true` = switch ON = closed).
    #[must_use]
    pub fn from_reading(reading: Option<bool>) -> Self {
        match reading {
            Some(true) => DoorState::Closed,
            Some(false) => DoorState::Open,
            None => DoorState::Unknown,
        }
    }
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DoorState::Open => "open",
            DoorState::Closed => "closed",
            DoorState::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// Commanded actuation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Lock,
    Unlock,
}

impl Direction {
    /// Lock state the lock-state switch should settle to after this motion.
    #[must_use]
    pub fn expected_state(self) -> LockState {
        match self {
            Direction::Lock => LockState::Locked,
            Direction::Unlock => LockState::Unlocked,
        }
    }

    /// Raw switch reading that confirms this motion.
    #[must_use]
    pub fn expected_reading(self) -> bool {
        matches!(self, Direction::Lock)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Lock => write!(f, "lock"),
            Direction::Unlock => write!(f, "unlock"),
        }
    }
}

/// Non-fatal advisory attached to an otherwise successful action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionWarning {
    /// The lock-state switch did not report the commanded state in time.
    ConfirmationTimeout {
        expected: LockState,
        timeout: Duration,
    },

    /// There is no lock-state switch to confirm against.
    ConfirmationUnavailable { expected: LockState },
}

impl fmt::Display for ActionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionWarning::ConfirmationTimeout { expected, timeout } => write!(
                f,
                "Lock state was not confirmed as {expected} within {:.1}s",
                timeout.as_secs_f64()
            ),
            ActionWarning::ConfirmationUnavailable { expected } => write!(
                f,
                "Lock state sensor unavailable; could not confirm {expected}"
            ),
        }
    }
}

/// Result of a completed `lock`/`unlock`/`toggle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub direction: Direction,
    pub lock_state: LockState,
    pub warning: Option<ActionWarning>,
}

impl ActionOutcome {
    #[must_use]
    pub fn confirmed(direction: Direction) -> Self {
        Self {
            direction,
            lock_state: direction.expected_state(),
            warning: None,
        }
    }

    #[must_use]
    pub fn unconfirmed(direction: Direction, lock_state: LockState, warning: ActionWarning) -> Self {
        Self {
            direction,
            lock_state,
            warning: Some(warning),
        }
    }

    /// Whether the lock-state switch confirmed the motion.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        self.warning.is_none()
    }
}

/// Read-only projection of the controller state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerSnapshot {
    pub lock_state: LockState,
    pub door_state: DoorState,
    pub auto_lock_enabled: bool,
    pub auto_lock_seconds: u64,
    pub last_action_warning: Option<String>,
    pub busy: bool,
    pub last_unlock_at: Option<DateTime<Utc>>,
    pub auto_lock_remaining_seconds: Option<u64>,
}

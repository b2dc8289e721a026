//! Default timings and limits shared across the smart lock crates.
//!
//! All durations are expressed in milliseconds unless the name says
//! otherwise. The values mirror the behaviour of common reed switches and
//! hobby servos (MG996R class) driven from a Raspberry Pi.

// ============================================================================
// Sensors
// ============================================================================

/// Settle window a raw edge must persist before it is accepted.
///
/// Reed switches bounce for a few milliseconds when the magnet moves; 50ms
/// rejects that without delaying manual operation noticeably.
pub const DEFAULT_DEBOUNCE_MS: u64 = 50;

/// Interval between raw samples of a sensor input.
pub const DEFAULT_SENSOR_POLL_MS: u64 = 10;

/// Capacity of each sensor's change broadcast channel.
pub const SENSOR_CHANNEL_CAPACITY: usize = 16;

// ============================================================================
// Servo
// ============================================================================

/// Outbound stroke duration.
pub const DEFAULT_ROTATION_TIME_MS: u64 = 500;

/// Return stroke duration relative to the outbound stroke.
pub const DEFAULT_RETURN_TIME_RATIO: f32 = 1.0;

/// Normalized drive speed for the lock direction.
pub const DEFAULT_LOCK_SPEED: f32 = -1.0;

/// Normalized drive speed for the unlock direction.
pub const DEFAULT_UNLOCK_SPEED: f32 = 1.0;

/// Hobby servo PWM period (50 Hz).
pub const DEFAULT_PWM_PERIOD_NS: u64 = 20_000_000;

/// Pulse width at full speed in the negative direction (seconds).
pub const DEFAULT_MIN_PULSE_WIDTH: f64 = 0.0005;

/// Pulse width at full speed in the positive direction (seconds).
pub const DEFAULT_MAX_PULSE_WIDTH: f64 = 0.0025;

// ============================================================================
// Controller
// ============================================================================

/// How long to wait for the lock-state switch after a motion.
pub const DEFAULT_CONFIRM_TIMEOUT_MS: u64 = 3_000;

/// Auto-lock evaluation interval.
pub const DEFAULT_AUTO_LOCK_CHECK_MS: u64 = 500;

/// Auto-lock delay used when none is configured (disabled).
pub const DEFAULT_AUTO_LOCK_SECONDS: u64 = 0;

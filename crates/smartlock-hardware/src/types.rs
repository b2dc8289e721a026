//! Common types shared across hardware device implementations.
//!
//! This module defines device metadata and the runtime configuration of the
//! two reed-switch inputs, the servo motion profile, and the PWM channel.

use std::time::Duration;

use smartlock_core::Direction;
use smartlock_core::constants::{
    DEFAULT_DEBOUNCE_MS, DEFAULT_LOCK_SPEED, DEFAULT_MAX_PULSE_WIDTH, DEFAULT_MIN_PULSE_WIDTH,
    DEFAULT_PWM_PERIOD_NS, DEFAULT_RETURN_TIME_RATIO, DEFAULT_ROTATION_TIME_MS,
    DEFAULT_SENSOR_POLL_MS, DEFAULT_UNLOCK_SPEED,
};

use crate::error::{HardwareError, Result};

/// Generic device information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Device name (e.g., "GPIO 17", "Mock Servo").
    pub name: String,

    /// Backend identifier (e.g., "sysfs-gpio", "mock").
    pub backend: String,
}

impl DeviceInfo {
    /// Create a new DeviceInfo.
    pub fn new(name: impl Into<String>, backend: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            backend: backend.into(),
        }
    }
}

/// Configuration of one reed-switch input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorConfig {
    /// Name used in logs ("lock", "door").
    pub name: String,

    /// BCM GPIO number.
    pub pin: u32,

    /// Switch ON pulls the line low.
    pub active_low: bool,

    /// Internal pull-up requested for the line.
    pub pull_up: bool,

    /// When `false` the sensor never reports a value.
    pub enabled: bool,

    /// Settle window for a raw edge.
    pub debounce: Duration,

    /// Raw sampling interval.
    pub poll_interval: Duration,
}

impl SensorConfig {
    /// Enabled sensor with default polarity (active-low, pull-up) and timings.
    pub fn new(name: impl Into<String>, pin: u32) -> Self {
        Self {
            name: name.into(),
            pin,
            active_low: true,
            pull_up: true,
            enabled: true,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            poll_interval: Duration::from_millis(DEFAULT_SENSOR_POLL_MS),
        }
    }

    /// Disabled sensor placeholder.
    pub fn disabled(name: impl Into<String>) -> Self {
        Self {
            enabled: false,
            ..Self::new(name, 0)
        }
    }

    pub fn with_active_low(mut self, active_low: bool) -> Self {
        self.active_low = active_low;
        self
    }

    pub fn with_pull_up(mut self, pull_up: bool) -> Self {
        self.pull_up = pull_up;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Convert a raw electrical level into the logical switch state.
    pub fn logical_level(&self, raw_high: bool) -> bool {
        raw_high != self.active_low
    }
}

/// Motion profile for the momentary servo actuation.
///
/// A motion drives at the direction's speed for `rotation_time`, drives at
/// the opposite sign for `rotation_time * return_time_ratio`, then releases.
#[derive(Debug, Clone, PartialEq)]
pub struct ServoConfig {
    /// BCM GPIO number the servo signal is wired to (informational).
    pub pin: u32,

    /// Normalized speed (-1.0..=1.0) for the lock stroke.
    pub lock_speed: f32,

    /// Normalized speed (-1.0..=1.0) for the unlock stroke.
    pub unlock_speed: f32,

    /// Outbound stroke duration.
    pub rotation_time: Duration,

    /// Return stroke duration relative to the outbound stroke.
    pub return_time_ratio: f32,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            pin: 12,
            lock_speed: DEFAULT_LOCK_SPEED,
            unlock_speed: DEFAULT_UNLOCK_SPEED,
            rotation_time: Duration::from_millis(DEFAULT_ROTATION_TIME_MS),
            return_time_ratio: DEFAULT_RETURN_TIME_RATIO,
        }
    }
}

impl ServoConfig {
    /// Check speeds and timings.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a speed is outside -1.0..=1.0 or
    /// zero, the rotation time is zero, or the return ratio is negative.
    pub fn validate(&self) -> Result<()> {
        for (name, speed) in [("lock_speed", self.lock_speed), ("unlock_speed", self.unlock_speed)] {
            if !(-1.0..=1.0).contains(&speed) || speed == 0.0 {
                return Err(HardwareError::configuration(format!(
                    "{name} must be non-zero and within -1.0..=1.0, got {speed}"
                )));
            }
        }
        if self.rotation_time.is_zero() {
            return Err(HardwareError::configuration("rotation_time must be positive"));
        }
        if !self.return_time_ratio.is_finite() || self.return_time_ratio < 0.0 {
            return Err(HardwareError::configuration(format!(
                "return_time_ratio must be >= 0, got {}",
                self.return_time_ratio
            )));
        }
        Ok(())
    }

    /// Outbound speed for a direction.
    pub fn speed_for(&self, direction: Direction) -> f32 {
        match direction {
            Direction::Lock => self.lock_speed,
            Direction::Unlock => self.unlock_speed,
        }
    }

    /// Duration of the return stroke.
    pub fn return_time(&self) -> Duration {
        self.rotation_time
            .mul_f64(f64::from(self.return_time_ratio))
    }

    /// Total time a single motion takes.
    pub fn motion_time(&self) -> Duration {
        self.rotation_time + self.return_time()
    }
}

/// Linux PWM channel settings for a servo signal.
#[derive(Debug, Clone, PartialEq)]
pub struct PwmConfig {
    /// `/sys/class/pwm/pwmchip<chip>`.
    pub chip: u32,

    /// Channel exported on the chip.
    pub channel: u32,

    /// PWM period in nanoseconds.
    pub period_ns: u64,

    /// Pulse width at speed -1.0 (seconds).
    pub min_pulse_width: f64,

    /// Pulse width at speed 1.0 (seconds).
    pub max_pulse_width: f64,
}

impl Default for PwmConfig {
    fn default() -> Self {
        Self {
            chip: 0,
            channel: 0,
            period_ns: DEFAULT_PWM_PERIOD_NS,
            min_pulse_width: DEFAULT_MIN_PULSE_WIDTH,
            max_pulse_width: DEFAULT_MAX_PULSE_WIDTH,
        }
    }
}

impl PwmConfig {
    /// # Errors
    ///
    /// Returns a configuration error if the pulse range is empty or does
    /// not fit in the period.
    pub fn validate(&self) -> Result<()> {
        if self.min_pulse_width <= 0.0 || self.min_pulse_width >= self.max_pulse_width {
            return Err(HardwareError::configuration(format!(
                "pulse widths must satisfy 0 < min < max, got {}..{}",
                self.min_pulse_width, self.max_pulse_width
            )));
        }
        if self.max_pulse_width * 1e9 >= self.period_ns as f64 {
            return Err(HardwareError::configuration(
                "max_pulse_width must be shorter than the PWM period",
            ));
        }
        Ok(())
    }

    /// Duty cycle in nanoseconds for a normalized speed. Speed 0 is the
    /// midpoint of the pulse range (neutral).
    pub fn duty_for_speed(&self, speed: f32) -> u64 {
        let speed = f64::from(speed.clamp(-1.0, 1.0));
        let mid = (self.min_pulse_width + self.max_pulse_width) / 2.0;
        let half = (self.max_pulse_width - self.min_pulse_width) / 2.0;
        ((mid + speed * half) * 1e9).round() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(true, true, false)]
    #[case(true, false, true)]
    #[case(false, true, true)]
    #[case(false, false, false)]
    fn test_polarity(#[case] active_low: bool, #[case] raw_high: bool, #[case] logical: bool) {
        let config = SensorConfig::new("lock", 17).with_active_low(active_low);
        assert_eq!(config.logical_level(raw_high), logical);
    }

    #[test]
    fn test_disabled_sensor_config() {
        let config = SensorConfig::disabled("door");
        assert!(!config.enabled);
        assert_eq!(config.name, "door");
    }

    #[test]
    fn test_servo_motion_time() {
        let config = ServoConfig {
            rotation_time: Duration::from_millis(400),
            return_time_ratio: 0.5,
            ..ServoConfig::default()
        };
        assert_eq!(config.return_time(), Duration::from_millis(200));
        assert_eq!(config.motion_time(), Duration::from_millis(600));
        assert_eq!(config.speed_for(Direction::Lock), DEFAULT_LOCK_SPEED);
        assert_eq!(config.speed_for(Direction::Unlock), DEFAULT_UNLOCK_SPEED);
    }

    #[rstest]
    #[case(1.5, 1.0, Duration::from_millis(500), 1.0)]
    #[case(0.0, 1.0, Duration::from_millis(500), 1.0)]
    #[case(-1.0, 1.0, Duration::ZERO, 1.0)]
    #[case(-1.0, 1.0, Duration::from_millis(500), -0.1)]
    fn test_servo_config_rejects(
        #[case] lock_speed: f32,
        #[case] unlock_speed: f32,
        #[case] rotation_time: Duration,
        #[case] return_time_ratio: f32,
    ) {
        let config = ServoConfig {
            lock_speed,
            unlock_speed,
            rotation_time,
            return_time_ratio,
            ..ServoConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_configs_are_valid() {
        assert!(ServoConfig::default().validate().is_ok());
        assert!(PwmConfig::default().validate().is_ok());
    }

    #[test]
    fn test_duty_for_speed() {
        let pwm = PwmConfig::default();
        assert_eq!(pwm.duty_for_speed(0.0), 1_500_000);
        assert_eq!(pwm.duty_for_speed(1.0), 2_500_000);
        assert_eq!(pwm.duty_for_speed(-1.0), 500_000);
        assert_eq!(pwm.duty_for_speed(7.0), 2_500_000);
    }

    #[test]
    fn test_pwm_config_rejects_inverted_range() {
        let pwm = PwmConfig {
            min_pulse_width: 0.002,
            max_pulse_width: 0.001,
            ..PwmConfig::default()
        };
        assert!(pwm.validate().is_err());
    }
}

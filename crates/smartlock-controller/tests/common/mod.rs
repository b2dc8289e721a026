//! Shared fixtures for controller integration tests.
//!
//! A [`Rig`] wires two mock reed switches and a mock servo into a
//! [`LockController`]. Both switches are active-high so the raw level is
//! the logical reading: lock pin high = locked, door pin high = closed.
//!
//! With `follow_servo` the lock switch tracks the servo the way a real bolt
//! would: each stroke moves the switch to the commanded state.

#![allow(dead_code)]

use std::time::Duration;

use smartlock_controller::{ControllerConfig, LockController};
use smartlock_hardware::mock::{MockInputPin, MockInputPinHandle, MockServo, MockServoHandle};
use smartlock_hardware::{DigitalSensor, SensorConfig, ServoActuator, ServoConfig};

pub const DEBOUNCE: Duration = Duration::from_millis(50);
pub const POLL: Duration = Duration::from_millis(10);
pub const ROTATION: Duration = Duration::from_millis(300);
pub const CONFIRM_TIMEOUT: Duration = Duration::from_secs(3);
pub const CHECK_INTERVAL: Duration = Duration::from_millis(500);

/// Full motion time for the rig's servo config.
pub const MOTION: Duration = Duration::from_millis(600);

pub struct Rig {
    pub controller: LockController,
    pub lock_pin: MockInputPinHandle,
    pub door_pin: MockInputPinHandle,
    pub servo: MockServoHandle,
}

pub struct RigBuilder {
    locked: bool,
    door_closed: bool,
    follow_servo: bool,
    auto_lock_seconds: u64,
}

impl Default for RigBuilder {
    fn default() -> Self {
        Self {
            locked: false,
            door_closed: true,
            follow_servo: true,
            auto_lock_seconds: 0,
        }
    }
}

impl RigBuilder {
    pub fn locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    pub fn door_closed(mut self, closed: bool) -> Self {
        self.door_closed = closed;
        self
    }

    pub fn follow_servo(mut self, follow: bool) -> Self {
        self.follow_servo = follow;
        self
    }

    pub fn auto_lock(mut self, seconds: u64) -> Self {
        self.auto_lock_seconds = seconds;
        self
    }

    /// Build the rig. Must run inside a Tokio runtime.
    pub fn build(self) -> Rig {
        let (lock_pin, lock_handle) = MockInputPin::with_name("lock", self.locked);
        let (door_pin, door_handle) = MockInputPin::with_name("door", self.door_closed);

        let (servo, servo_handle) = MockServo::new();
        let servo = if self.follow_servo {
            let bolt = lock_handle.clone();
            servo.with_feedback(move |speed| bolt.set_level(speed < 0.0))
        } else {
            servo
        };

        let controller = LockController::new(
            DigitalSensor::spawn(sensor_config("lock"), lock_pin.into()),
            DigitalSensor::spawn(sensor_config("door"), door_pin.into()),
            ServoActuator::new(servo_config(), servo.into()).unwrap(),
            controller_config(self.auto_lock_seconds),
        );

        Rig {
            controller,
            lock_pin: lock_handle,
            door_pin: door_handle,
            servo: servo_handle,
        }
    }
}

pub fn rig() -> RigBuilder {
    RigBuilder::default()
}

pub fn sensor_config(name: &str) -> SensorConfig {
    SensorConfig::new(name, 0)
        .with_active_low(false)
        .with_debounce(DEBOUNCE)
        .with_poll_interval(POLL)
}

pub fn servo_config() -> ServoConfig {
    ServoConfig {
        rotation_time: ROTATION,
        return_time_ratio: 1.0,
        ..ServoConfig::default()
    }
}

pub fn controller_config(auto_lock_seconds: u64) -> ControllerConfig {
    ControllerConfig {
        confirm_timeout: CONFIRM_TIMEOUT,
        auto_lock_check_interval: CHECK_INTERVAL,
        auto_lock_seconds,
    }
}

/// Controller with both sensors disabled and a dry-run servo.
pub fn sensorless(auto_lock_seconds: u64) -> LockController {
    LockController::new(
        DigitalSensor::disabled("lock"),
        DigitalSensor::disabled("door"),
        ServoActuator::dry_run(servo_config()).unwrap(),
        controller_config(auto_lock_seconds),
    )
}

/// Long enough for any pin change to pass the debouncer.
pub async fn settle() {
    tokio::time::sleep(DEBOUNCE * 2).await;
}

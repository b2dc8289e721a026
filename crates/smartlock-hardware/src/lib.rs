//! Hardware abstraction layer for the smart lock.
//!
//! This crate provides trait-based abstractions for the two kinds of
//! peripherals a servo-driven lock needs: digital inputs (the lock-state and
//! door-state reed switches) and a servo drive signal. On top of those it
//! builds the two leaf components the controller owns:
//!
//! - [`DigitalSensor`]: polls an [`InputPin`], debounces it, and exposes the
//!   current value plus a change stream.
//! - [`ServoActuator`]: performs a serialized neutral → target → neutral
//!   motion on a [`ServoDriver`], or simulates its timing in dry-run mode.
//!
//! # Design Philosophy
//!
//! - **Async-first**: all I/O uses native `async fn` in traits (Rust 1.90 +
//!   Edition 2024 RPITIT).
//! - **Enum dispatch**: backends are selected at startup and wrapped in
//!   [`AnyInputPin`] / [`AnyServoDriver`].
//! - **Degrade, don't crash**: an input that cannot be opened becomes a
//!   disabled sensor reporting unknown.
//!
//! # Backends
//!
//! - [`mock`]: programmable devices for tests and development.
//! - [`sysfs`]: Linux `/sys/class/gpio` inputs and `/sys/class/pwm` servo.
//!
//! [`DigitalSensor`]: sensor::DigitalSensor
//! [`ServoActuator`]: actuator::ServoActuator
//! [`InputPin`]: traits::InputPin
//! [`ServoDriver`]: traits::ServoDriver
//! [`AnyInputPin`]: devices::AnyInputPin
//! [`AnyServoDriver`]: devices::AnyServoDriver

pub mod actuator;
pub mod debounce;
pub mod devices;
pub mod error;
pub mod mock;
pub mod sensor;
pub mod sysfs;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use actuator::ServoActuator;
pub use devices::{AnyInputPin, AnyServoDriver};
pub use error::{HardwareError, Result};
pub use sensor::{DigitalSensor, SensorSubscription};
pub use traits::{InputPin, ServoDriver};
pub use types::{DeviceInfo, PwmConfig, SensorConfig, ServoConfig};

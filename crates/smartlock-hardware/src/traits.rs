//! Hardware device trait definitions.
//!
//! These traits are the contract between the lock controller and the GPIO
//! backends. They are deliberately narrow: an input pin can report its raw
//! electrical level, and a servo driver can be driven at a normalized speed
//! or released. Debouncing, polarity and motion timing live above this
//! layer in [`DigitalSensor`](crate::sensor::DigitalSensor) and
//! [`ServoActuator`](crate::actuator::ServoActuator).
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT).

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::types::DeviceInfo;

/// A single digital input line.
///
/// # Object Safety and Dynamic Dispatch
///
/// This trait is NOT object-safe because `async fn` methods return
/// `impl Future`. Use [`AnyInputPin`](crate::devices::AnyInputPin) when the
/// concrete backend is chosen at runtime.
///
/// # Examples
///
/// ```no_run
/// use smartlock_hardware::traits::InputPin;
/// use smartlock_hardware::error::Result;
///
/// async fn sample<P: InputPin>(pin: &mut P) -> Result<bool> {
///     pin.read_level().await
/// }
/// ```
pub trait InputPin: Send + Sync {
    /// Read the raw electrical level (`true` = high).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read (disconnected,
    /// permission denied, unexpected contents).
    async fn read_level(&mut self) -> Result<bool>;

    /// Get device information.
    async fn get_info(&self) -> Result<DeviceInfo>;
}

/// Continuous-rotation (or speed-mapped standard) servo signal.
///
/// # Object Safety and Dynamic Dispatch
///
/// Not object-safe, see [`InputPin`]. Use
/// [`AnyServoDriver`](crate::devices::AnyServoDriver) for runtime dispatch.
pub trait ServoDriver: Send + Sync {
    /// Drive at a normalized speed in `-1.0..=1.0`; `0.0` is neutral.
    ///
    /// # Errors
    ///
    /// Returns an error if the drive signal cannot be updated.
    async fn set_speed(&mut self, speed: f32) -> Result<()>;

    /// Stop driving the signal so the mechanism can be turned by hand.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be disabled.
    async fn release(&mut self) -> Result<()>;

    /// Get device information.
    async fn get_info(&self) -> Result<DeviceInfo>;
}

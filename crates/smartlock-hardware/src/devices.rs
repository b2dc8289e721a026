//! Enum wrappers for hardware device dispatch.
//!
//! Native `async fn` in traits are not object-safe, so `Box<dyn InputPin>`
//! is not an option. These enums give concrete type dispatch instead, which
//! also keeps the futures `Send` so sensor polling can run in spawned tasks.
//!
//! # Examples
//!
//! ```
//! use smartlock_hardware::devices::AnyInputPin;
//! use smartlock_hardware::mock::MockInputPin;
//!
//! let (pin, _handle) = MockInputPin::new(false);
//! let any_pin = AnyInputPin::Mock(pin);
//! ```

use crate::mock::{MockInputPin, MockServo};
use crate::sysfs::{SysfsInputPin, SysfsPwmServo};
use crate::traits::{InputPin, ServoDriver};
use crate::{DeviceInfo, Result};

/// Enum wrapper for input pin dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyInputPin {
    /// Mock pin for development and testing.
    Mock(MockInputPin),

    /// Linux sysfs GPIO.
    Sysfs(SysfsInputPin),
}

impl InputPin for AnyInputPin {
    async fn read_level(&mut self) -> Result<bool> {
        match self {
            Self::Mock(pin) => pin.read_level().await,
            Self::Sysfs(pin) => pin.read_level().await,
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(pin) => pin.get_info().await,
            Self::Sysfs(pin) => pin.get_info().await,
        }
    }
}

impl From<MockInputPin> for AnyInputPin {
    fn from(pin: MockInputPin) -> Self {
        Self::Mock(pin)
    }
}

impl From<SysfsInputPin> for AnyInputPin {
    fn from(pin: SysfsInputPin) -> Self {
        Self::Sysfs(pin)
    }
}

/// Enum wrapper for servo driver dispatch.
///
/// # Examples
///
/// ```
/// use smartlock_hardware::devices::AnyServoDriver;
/// use smartlock_hardware::traits::ServoDriver;
/// use smartlock_hardware::mock::MockServo;
///
/// #[tokio::main]
/// async fn main() -> smartlock_hardware::Result<()> {
///     let (servo, handle) = MockServo::new();
///     let mut driver = AnyServoDriver::Mock(servo);
///
///     driver.set_speed(0.5).await?;
///     assert_eq!(handle.current_speed(), 0.5);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyServoDriver {
    /// Mock servo for development and testing.
    Mock(MockServo),

    /// Linux sysfs PWM channel.
    Sysfs(SysfsPwmServo),
}

impl ServoDriver for AnyServoDriver {
    async fn set_speed(&mut self, speed: f32) -> Result<()> {
        match self {
            Self::Mock(servo) => servo.set_speed(speed).await,
            Self::Sysfs(servo) => servo.set_speed(speed).await,
        }
    }

    async fn release(&mut self) -> Result<()> {
        match self {
            Self::Mock(servo) => servo.release().await,
            Self::Sysfs(servo) => servo.release().await,
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(servo) => servo.get_info().await,
            Self::Sysfs(servo) => servo.get_info().await,
        }
    }
}

impl From<MockServo> for AnyServoDriver {
    fn from(servo: MockServo) -> Self {
        Self::Mock(servo)
    }
}

impl From<SysfsPwmServo> for AnyServoDriver {
    fn from(servo: SysfsPwmServo) -> Self {
        Self::Sysfs(servo)
    }
}

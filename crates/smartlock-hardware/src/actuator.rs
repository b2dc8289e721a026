//! Momentary servo actuation.
//!
//! Each motion goes neutral → target → neutral: drive at the direction's
//! speed for `rotation_time`, drive back at the opposite sign for
//! `rotation_time * return_time_ratio`, stop, then release the signal so
//! the thumb-turn stays free for manual use.

use smartlock_core::Direction;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::devices::AnyServoDriver;
use crate::error::Result;
use crate::traits::ServoDriver;
use crate::types::{DeviceInfo, ServoConfig};

/// Servo actuator with internal serialization.
///
/// Concurrent [`actuate`](Self::actuate) calls queue on a fair mutex and
/// run one after another. Without a driver (dry run) the same timing is
/// simulated, so callers observe identical durations either way.
///
/// # Examples
///
/// ```
/// use smartlock_core::Direction;
/// use smartlock_hardware::actuator::ServoActuator;
/// use smartlock_hardware::mock::MockServo;
/// use smartlock_hardware::types::ServoConfig;
///
/// #[tokio::main]
/// async fn main() -> smartlock_hardware::Result<()> {
///     let (servo, handle) = MockServo::new();
///     let actuator = ServoActuator::new(ServoConfig::default(), servo.into())?;
///
///     actuator.actuate(Direction::Lock).await?;
///     assert_eq!(handle.stroke_count(), 1);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct ServoActuator {
    config: ServoConfig,
    driver: Mutex<Option<AnyServoDriver>>,
}

impl ServoActuator {
    /// Create an actuator driving `driver`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` is invalid.
    pub fn new(config: ServoConfig, driver: AnyServoDriver) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            driver: Mutex::new(Some(driver)),
        })
    }

    /// Create an actuator with no drive signal attached.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` is invalid.
    pub fn dry_run(config: ServoConfig) -> Result<Self> {
        config.validate()?;
        warn!("Dry-run mode: servo output is disabled");
        Ok(Self {
            config,
            driver: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &ServoConfig {
        &self.config
    }

    /// Whether motions are simulated.
    pub async fn is_dry_run(&self) -> bool {
        self.driver.lock().await.is_none()
    }

    /// Backend description; `None` in dry run.
    pub async fn driver_info(&self) -> Option<DeviceInfo> {
        match self.driver.lock().await.as_ref() {
            Some(servo) => servo.get_info().await.ok(),
            None => None,
        }
    }

    /// Perform one full motion in `direction`.
    ///
    /// The signal is released afterwards even if driving failed.
    ///
    /// # Errors
    ///
    /// Returns the driver error if any speed update or the release fails.
    pub async fn actuate(&self, direction: Direction) -> Result<()> {
        let mut driver = self.driver.lock().await;
        let speed = self.config.speed_for(direction);

        info!(
            "Servo {} stroke: speed={:.2}, rotation={}ms, return={}ms",
            direction,
            speed,
            self.config.rotation_time.as_millis(),
            self.config.return_time().as_millis()
        );

        let Some(servo) = driver.as_mut() else {
            debug!("Dry-run: simulating {} motion", direction);
            tokio::time::sleep(self.config.motion_time()).await;
            return Ok(());
        };

        let result = self.stroke(servo, speed).await;
        if let Err(e) = &result {
            warn!("Servo {} stroke failed: {}", direction, e);
        }

        match servo.release().await {
            Ok(()) => result,
            Err(e) => {
                warn!("Servo release failed: {}", e);
                result.and(Err(e))
            }
        }
    }

    async fn stroke(&self, servo: &mut AnyServoDriver, speed: f32) -> Result<()> {
        servo.set_speed(speed).await?;
        tokio::time::sleep(self.config.rotation_time).await;

        let return_time = self.config.return_time();
        if !return_time.is_zero() {
            servo.set_speed(-speed).await?;
            tokio::time::sleep(return_time).await;
        }

        servo.set_speed(0.0).await
    }

    /// Release the drive signal; used on shutdown.
    ///
    /// # Errors
    ///
    /// Returns the driver error if the output cannot be disabled.
    pub async fn release(&self) -> Result<()> {
        match self.driver.lock().await.as_mut() {
            Some(servo) => servo.release().await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockServo, ServoCommand};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;

    fn config() -> ServoConfig {
        ServoConfig {
            lock_speed: -1.0,
            unlock_speed: 0.8,
            rotation_time: Duration::from_millis(400),
            return_time_ratio: 0.5,
            ..ServoConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_lock_motion_sequence() {
        let (servo, handle) = MockServo::new();
        let actuator = ServoActuator::new(config(), servo.into()).unwrap();

        let start = Instant::now();
        actuator.actuate(Direction::Lock).await.unwrap();

        assert_eq!(start.elapsed(), Duration::from_millis(600));
        assert_eq!(
            handle.commands(),
            vec![
                ServoCommand::Speed(-1.0),
                ServoCommand::Speed(1.0),
                ServoCommand::Speed(0.0),
                ServoCommand::Release,
            ]
        );
    }

    #[tokio::test]
    async fn test_driver_info() {
        let (servo, _handle) = MockServo::new();
        let actuator = ServoActuator::new(config(), servo.into()).unwrap();
        assert_eq!(actuator.driver_info().await.unwrap().backend, "mock");

        let dry = ServoActuator::dry_run(config()).unwrap();
        assert!(dry.driver_info().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_return_ratio_skips_return_stroke() {
        let (servo, handle) = MockServo::new();
        let config = ServoConfig {
            return_time_ratio: 0.0,
            ..config()
        };
        let actuator = ServoActuator::new(config, servo.into()).unwrap();

        actuator.actuate(Direction::Unlock).await.unwrap();
        assert_eq!(
            handle.commands(),
            vec![
                ServoCommand::Speed(0.8),
                ServoCommand::Speed(0.0),
                ServoCommand::Release,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_dry_run_keeps_timing() {
        let actuator = ServoActuator::dry_run(config()).unwrap();
        assert!(actuator.is_dry_run().await);

        let start = Instant::now();
        actuator.actuate(Direction::Unlock).await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_motions_are_serialized() {
        let (servo, handle) = MockServo::new();
        let actuator = Arc::new(ServoActuator::new(config(), servo.into()).unwrap());

        let start = Instant::now();
        let a = tokio::spawn({
            let actuator = Arc::clone(&actuator);
            async move { actuator.actuate(Direction::Lock).await }
        });
        let b = tokio::spawn({
            let actuator = Arc::clone(&actuator);
            async move { actuator.actuate(Direction::Unlock).await }
        });
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        assert_eq!(start.elapsed(), Duration::from_millis(1200));
        assert_eq!(handle.stroke_count(), 2);

        // Each motion ends with a release before the next one starts.
        let commands = handle.commands();
        assert_eq!(commands.len(), 8);
        assert_eq!(commands[3], ServoCommand::Release);
        assert_eq!(commands[7], ServoCommand::Release);
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_failure_still_releases() {
        let (servo, handle) = MockServo::new();
        let actuator = ServoActuator::new(config(), servo.into()).unwrap();
        handle.set_failing(true);

        assert!(actuator.actuate(Direction::Lock).await.is_err());
        assert_eq!(handle.commands(), vec![ServoCommand::Release]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ServoConfig {
            lock_speed: 2.0,
            ..ServoConfig::default()
        };
        assert!(ServoActuator::dry_run(config).is_err());
    }
}

//! Hardware backend selection.
//!
//! Sensors fall back to disabled (state `unknown`) and the servo falls back
//! to dry-run timing when the sysfs device cannot be opened, so the service
//! still starts and serves status on a machine without the hardware.

use smartlock_core::Result;
use smartlock_hardware::sysfs::{SysfsInputPin, SysfsPwmServo};
use smartlock_hardware::{DigitalSensor, PwmConfig, SensorConfig, ServoActuator, ServoConfig};
use tracing::{info, warn};

/// Open a reed-switch sensor, or a disabled placeholder.
pub async fn open_sensor(config: SensorConfig, dry_run: bool) -> DigitalSensor {
    if !config.enabled {
        info!("Sensor '{}' not configured", config.name);
        return DigitalSensor::disabled(config.name);
    }
    if dry_run {
        info!("Dry-run: sensor '{}' disabled", config.name);
        return DigitalSensor::disabled(config.name);
    }

    let backend = SysfsInputPin::open(config.pin).await.map(Into::into);
    DigitalSensor::from_backend(config, backend)
}

/// Open the servo actuator.
///
/// # Errors
///
/// Returns a configuration error if `servo` is invalid. PWM open failures
/// are not errors.
pub async fn open_actuator(
    servo: ServoConfig,
    pwm: PwmConfig,
    dry_run: bool,
) -> Result<ServoActuator> {
    if dry_run {
        return Ok(ServoActuator::dry_run(servo)?);
    }

    match SysfsPwmServo::open(pwm.clone()).await {
        Ok(driver) => {
            let actuator = ServoActuator::new(servo, driver.into())?;
            if let Some(info) = actuator.driver_info().await {
                info!("Servo driver: {} ({})", info.name, info.backend);
            }
            Ok(actuator)
        }
        Err(e) => {
            warn!(
                "PWM pwmchip{}/pwm{} unavailable: {}; falling back to dry-run",
                pwm.chip, pwm.channel, e
            );
            Ok(ServoActuator::dry_run(servo)?)
        }
    }
}

//! Linux sysfs backends.
//!
//! Inputs use the legacy GPIO interface (`/sys/class/gpio`), the servo uses
//! a hardware PWM channel (`/sys/class/pwm`). Both only need file access, so
//! they work on any board whose kernel exposes these classes. The sysfs GPIO
//! interface cannot configure bias, so `pull_up` must be provided by the
//! device tree or an external resistor.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{HardwareError, Result};
use crate::traits::{InputPin, ServoDriver};
use crate::types::{DeviceInfo, PwmConfig};

/// Default GPIO class root.
pub const GPIO_ROOT: &str = "/sys/class/gpio";

/// Default PWM class root.
pub const PWM_ROOT: &str = "/sys/class/pwm";

async fn write_attr(path: &Path, value: &str) -> Result<()> {
    tokio::fs::write(path, value)
        .await
        .map_err(|e| HardwareError::communication(format!("write {}: {e}", path.display())))
}

/// Export `index` through `export_file` unless `target` already exists.
async fn ensure_exported(export_file: &Path, target: &Path, index: u32) -> Result<()> {
    if tokio::fs::try_exists(target).await.unwrap_or(false) {
        return Ok(());
    }
    debug!("Exporting {} via {}", index, export_file.display());
    tokio::fs::write(export_file, index.to_string())
        .await
        .map_err(|e| {
            HardwareError::initialization_failed(format!(
                "export {index} via {}: {e}",
                export_file.display()
            ))
        })?;
    if tokio::fs::try_exists(target).await.unwrap_or(false) {
        Ok(())
    } else {
        Err(HardwareError::initialization_failed(format!(
            "{} did not appear after export",
            target.display()
        )))
    }
}

/// GPIO input read through `/sys/class/gpio/gpio<N>/value`.
#[derive(Debug)]
pub struct SysfsInputPin {
    pin: u32,
    value_path: PathBuf,
}

impl SysfsInputPin {
    /// Export and configure `pin` as an input under [`GPIO_ROOT`].
    ///
    /// # Errors
    ///
    /// Returns an initialization error if the pin cannot be exported,
    /// switched to input, or read.
    pub async fn open(pin: u32) -> Result<Self> {
        Self::open_at(GPIO_ROOT, pin).await
    }

    /// Same as [`open`](Self::open) with a custom class root.
    pub async fn open_at(root: impl AsRef<Path>, pin: u32) -> Result<Self> {
        let root = root.as_ref();
        let dir = root.join(format!("gpio{pin}"));
        ensure_exported(&root.join("export"), &dir, pin).await?;

        write_attr(&dir.join("direction"), "in")
            .await
            .map_err(|e| HardwareError::initialization_failed(format!("GPIO {pin}: {e}")))?;

        let mut input = Self {
            pin,
            value_path: dir.join("value"),
        };
        input
            .read_level()
            .await
            .map_err(|e| HardwareError::initialization_failed(format!("GPIO {pin}: {e}")))?;

        info!("GPIO {} opened as input", pin);
        Ok(input)
    }
}

impl InputPin for SysfsInputPin {
    async fn read_level(&mut self) -> Result<bool> {
        let raw = tokio::fs::read_to_string(&self.value_path).await?;
        match raw.trim() {
            "0" => Ok(false),
            "1" => Ok(true),
            other => Err(HardwareError::invalid_data(format!(
                "GPIO {} value '{other}'",
                self.pin
            ))),
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(format!("GPIO {}", self.pin), "sysfs-gpio"))
    }
}

/// Servo signal on a sysfs PWM channel.
#[derive(Debug)]
pub struct SysfsPwmServo {
    config: PwmConfig,
    channel_dir: PathBuf,
    enabled: bool,
}

impl SysfsPwmServo {
    /// Export and configure the channel under [`PWM_ROOT`].
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an invalid pulse range, or an
    /// initialization error if the channel cannot be exported or set up.
    pub async fn open(config: PwmConfig) -> Result<Self> {
        Self::open_at(PWM_ROOT, config).await
    }

    /// Same as [`open`](Self::open) with a custom class root.
    pub async fn open_at(root: impl AsRef<Path>, config: PwmConfig) -> Result<Self> {
        config.validate()?;

        let chip_dir = root.as_ref().join(format!("pwmchip{}", config.chip));
        let channel_dir = chip_dir.join(format!("pwm{}", config.channel));
        ensure_exported(&chip_dir.join("export"), &channel_dir, config.channel).await?;

        let servo = Self {
            channel_dir,
            enabled: false,
            config,
        };
        servo
            .write("period", &servo.config.period_ns.to_string())
            .await
            .map_err(|e| HardwareError::initialization_failed(e.to_string()))?;
        servo
            .write("duty_cycle", &servo.config.duty_for_speed(0.0).to_string())
            .await
            .map_err(|e| HardwareError::initialization_failed(e.to_string()))?;

        info!(
            "PWM servo opened on pwmchip{}/pwm{}",
            servo.config.chip, servo.config.channel
        );
        Ok(servo)
    }

    async fn write(&self, attr: &str, value: &str) -> Result<()> {
        write_attr(&self.channel_dir.join(attr), value).await
    }
}

impl ServoDriver for SysfsPwmServo {
    async fn set_speed(&mut self, speed: f32) -> Result<()> {
        let duty = self.config.duty_for_speed(speed);
        self.write("duty_cycle", &duty.to_string()).await?;
        if !self.enabled {
            self.write("enable", "1").await?;
            self.enabled = true;
        }
        Ok(())
    }

    async fn release(&mut self) -> Result<()> {
        self.write("enable", "0").await?;
        self.enabled = false;
        Ok(())
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(
            format!("pwmchip{}/pwm{}", self.config.chip, self.config.channel),
            "sysfs-pwm",
        ))
    }
}

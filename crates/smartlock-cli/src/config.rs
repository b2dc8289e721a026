//! Service configuration.
//!
//! Loaded from a JSON file. Every field has a default, so a partial file
//! (or `{}`) is valid. Command-line flags are applied on top with
//! [`Config::apply_overrides`].
//!
//! ```json
//! {
//!   "servo": { "pwm_chip": 0, "pwm_channel": 0, "rotation_time_seconds": 0.5 },
//!   "sensors": {
//!     "lock_switch": { "pin": 17 },
//!     "door_switch": { "pin": 27, "active_low": true }
//!   },
//!   "features": { "auto_lock_seconds": 30, "action_confirm_timeout_seconds": 3.0 },
//!   "web": { "host": "0.0.0.0", "port": 8080 },
//!   "logging": { "level": "info" },
//!   "dry_run": false
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use smartlock_controller::ControllerConfig;
use smartlock_core::constants::{
    DEFAULT_AUTO_LOCK_CHECK_MS, DEFAULT_CONFIRM_TIMEOUT_MS, DEFAULT_DEBOUNCE_MS,
    DEFAULT_LOCK_SPEED, DEFAULT_MAX_PULSE_WIDTH, DEFAULT_MIN_PULSE_WIDTH, DEFAULT_PWM_PERIOD_NS,
    DEFAULT_RETURN_TIME_RATIO, DEFAULT_ROTATION_TIME_MS, DEFAULT_UNLOCK_SPEED,
};
use smartlock_core::{Error, Result};
use smartlock_hardware::{PwmConfig, SensorConfig, ServoConfig};

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub servo: ServoSection,
    pub sensors: SensorsSection,
    pub features: FeaturesSection,
    pub web: WebSection,
    pub logging: LoggingSection,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServoSection {
    pub pwm_chip: u32,
    pub pwm_channel: u32,
    /// BCM pin the signal is wired to; informational with sysfs PWM.
    pub pin: u32,
    pub lock_speed: f32,
    pub unlock_speed: f32,
    pub rotation_time_seconds: f64,
    pub return_time_ratio: f32,
    pub min_pulse_width: f64,
    pub max_pulse_width: f64,
    pub period_ns: u64,
}

impl Default for ServoSection {
    fn default() -> Self {
        Self {
            pwm_chip: 0,
            pwm_channel: 0,
            pin: 12,
            lock_speed: DEFAULT_LOCK_SPEED,
            unlock_speed: DEFAULT_UNLOCK_SPEED,
            rotation_time_seconds: DEFAULT_ROTATION_TIME_MS as f64 / 1000.0,
            return_time_ratio: DEFAULT_RETURN_TIME_RATIO,
            min_pulse_width: DEFAULT_MIN_PULSE_WIDTH,
            max_pulse_width: DEFAULT_MAX_PULSE_WIDTH,
            period_ns: DEFAULT_PWM_PERIOD_NS,
        }
    }
}

/// A missing switch section means that sensor is not installed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SensorsSection {
    pub lock_switch: Option<SwitchSection>,
    pub door_switch: Option<SwitchSection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwitchSection {
    pub pin: u32,
    #[serde(default = "default_true")]
    pub active_low: bool,
    #[serde(default = "default_true")]
    pub pull_up: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Debounce window in seconds.
    #[serde(default = "default_bounce_time")]
    pub bounce_time: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeaturesSection {
    pub auto_lock_seconds: u64,
    pub action_confirm_timeout_seconds: f64,
    pub auto_lock_check_interval_seconds: f64,
}

impl Default for FeaturesSection {
    fn default() -> Self {
        Self {
            auto_lock_seconds: 0,
            action_confirm_timeout_seconds: DEFAULT_CONFIRM_TIMEOUT_MS as f64 / 1000.0,
            auto_lock_check_interval_seconds: DEFAULT_AUTO_LOCK_CHECK_MS as f64 / 1000.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebSection {
    pub host: String,
    pub port: u16,
}

impl Default for WebSection {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: Option<String>,
}

/// Command-line values layered over the file. `None` keeps the file value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub dry_run: bool,
    pub pin: Option<u32>,
    pub min_pulse_width: Option<f64>,
    pub max_pulse_width: Option<f64>,
    pub rotation_time: Option<f64>,
    pub return_time_ratio: Option<f32>,
}

fn default_true() -> bool {
    true
}

fn default_bounce_time() -> f64 {
    DEFAULT_DEBOUNCE_MS as f64 / 1000.0
}

impl Config {
    /// Read and parse a config file.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the file cannot be read, [`Error::Config`] if it is
    /// not valid JSON for this schema.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    /// # Errors
    ///
    /// [`Error::Config`] on malformed JSON or wrong field types.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| Error::Config(e.to_string()))
    }

    /// Apply command-line overrides. `dry_run` can only be switched on.
    pub fn apply_overrides(&mut self, overrides: Overrides) {
        if let Some(host) = overrides.host {
            self.web.host = host;
        }
        if let Some(port) = overrides.port {
            self.web.port = port;
        }
        if overrides.log_level.is_some() {
            self.logging.level = overrides.log_level;
        }
        if let Some(pin) = overrides.pin {
            self.servo.pin = pin;
        }
        if let Some(width) = overrides.min_pulse_width {
            self.servo.min_pulse_width = width;
        }
        if let Some(width) = overrides.max_pulse_width {
            self.servo.max_pulse_width = width;
        }
        if let Some(seconds) = overrides.rotation_time {
            self.servo.rotation_time_seconds = seconds;
        }
        if let Some(ratio) = overrides.return_time_ratio {
            self.servo.return_time_ratio = ratio;
        }
        self.dry_run |= overrides.dry_run;
    }

    /// Check every section that has constraints.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] naming the first invalid value.
    pub fn validate(&self) -> Result<()> {
        self.servo_config()?.validate()?;
        self.pwm_config().validate()?;
        self.controller_config()?;
        for (name, switch) in [
            ("lock_switch", &self.sensors.lock_switch),
            ("door_switch", &self.sensors.door_switch),
        ] {
            if let Some(switch) = switch {
                seconds(&format!("sensors.{name}.bounce_time"), switch.bounce_time)?;
            }
        }
        Ok(())
    }

    /// # Errors
    ///
    /// [`Error::Config`] if `rotation_time_seconds` is negative or not finite.
    pub fn servo_config(&self) -> Result<ServoConfig> {
        Ok(ServoConfig {
            pin: self.servo.pin,
            lock_speed: self.servo.lock_speed,
            unlock_speed: self.servo.unlock_speed,
            rotation_time: seconds(
                "servo.rotation_time_seconds",
                self.servo.rotation_time_seconds,
            )?,
            return_time_ratio: self.servo.return_time_ratio,
        })
    }

    pub fn pwm_config(&self) -> PwmConfig {
        PwmConfig {
            chip: self.servo.pwm_chip,
            channel: self.servo.pwm_channel,
            period_ns: self.servo.period_ns,
            min_pulse_width: self.servo.min_pulse_width,
            max_pulse_width: self.servo.max_pulse_width,
        }
    }

    pub fn lock_sensor_config(&self) -> SensorConfig {
        switch_config("lock", self.sensors.lock_switch.as_ref())
    }

    pub fn door_sensor_config(&self) -> SensorConfig {
        switch_config("door", self.sensors.door_switch.as_ref())
    }

    /// # Errors
    ///
    /// [`Error::Config`] if the confirm timeout or check interval is not
    /// a positive number of seconds.
    pub fn controller_config(&self) -> Result<ControllerConfig> {
        let confirm_timeout = seconds(
            "features.action_confirm_timeout_seconds",
            self.features.action_confirm_timeout_seconds,
        )?;
        let auto_lock_check_interval = seconds(
            "features.auto_lock_check_interval_seconds",
            self.features.auto_lock_check_interval_seconds,
        )?;
        if confirm_timeout.is_zero() || auto_lock_check_interval.is_zero() {
            return Err(Error::Config(
                "confirm timeout and auto-lock check interval must be positive".into(),
            ));
        }

        Ok(ControllerConfig {
            confirm_timeout,
            auto_lock_check_interval,
            auto_lock_seconds: self.features.auto_lock_seconds,
        })
    }
}

fn switch_config(name: &str, section: Option<&SwitchSection>) -> SensorConfig {
    let Some(section) = section else {
        return SensorConfig::disabled(name);
    };

    let mut config = SensorConfig::new(name, section.pin)
        .with_active_low(section.active_low)
        .with_pull_up(section.pull_up);
    // Out-of-range values are rejected by `validate`.
    if let Ok(debounce) = Duration::try_from_secs_f64(section.bounce_time) {
        config = config.with_debounce(debounce);
    }
    config.enabled = section.enabled;
    config
}

fn seconds(field: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value)
        .map_err(|_| Error::Config(format!("{field} must be a non-negative number, got {value}")))
}

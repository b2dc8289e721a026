//! Debounced digital sensor.
//!
//! A [`DigitalSensor`] owns one input pin and a polling task. The task
//! samples the raw level, corrects polarity, runs it through a
//! [`Debouncer`], and publishes each accepted value twice: into a `watch`
//! slot (the current reading) and into a bounded `broadcast` channel (the
//! change stream handed out by [`DigitalSensor::subscribe`]).
//!
//! ```text
//! ┌──────────┐  raw   ┌───────────┐ stable ┌─────────────┐
//! │ InputPin │──────► │ Debouncer │──────► │ watch slot  │──► read()
//! └──────────┘        └───────────┘   │    └─────────────┘
//!                                     └──► broadcast ──────► subscribe()
//! ```
//!
//! A disabled sensor, or one whose backend could not be opened, reports
//! `None` forever and its subscriptions never yield.

use std::time::Duration;

use smartlock_core::constants::SENSOR_CHANNEL_CAPACITY;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::debounce::Debouncer;
use crate::devices::AnyInputPin;
use crate::error::Result;
use crate::traits::InputPin;
use crate::types::SensorConfig;

/// Debounced, polarity-corrected view of one digital input.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use smartlock_hardware::mock::MockInputPin;
/// use smartlock_hardware::sensor::DigitalSensor;
/// use smartlock_hardware::types::SensorConfig;
///
/// #[tokio::main]
/// async fn main() {
///     let (pin, handle) = MockInputPin::new(true);
///     let config = SensorConfig::new("lock", 17).with_active_low(false);
///     let sensor = DigitalSensor::spawn(config, pin.into());
///
///     assert!(sensor.wait_for(true, Duration::from_secs(1)).await);
///     assert_eq!(sensor.read(), Some(true));
///     # drop(handle);
/// }
/// ```
#[derive(Debug)]
pub struct DigitalSensor {
    name: String,
    enabled: bool,
    state: watch::Receiver<Option<bool>>,
    changes: broadcast::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl DigitalSensor {
    /// Start polling `pin` according to `config`.
    ///
    /// Must be called from within a Tokio runtime. A config with
    /// `enabled = false` yields a disabled sensor and drops the pin.
    pub fn spawn(config: SensorConfig, pin: AnyInputPin) -> Self {
        if !config.enabled {
            return Self::disabled(config.name);
        }

        let (state_tx, state) = watch::channel(None);
        let (changes, _) = broadcast::channel(SENSOR_CHANNEL_CAPACITY);

        info!(
            "Sensor '{}' polling GPIO {} (active_low={}, pull_up={}, debounce={}ms)",
            config.name,
            config.pin,
            config.active_low,
            config.pull_up,
            config.debounce.as_millis()
        );

        let name = config.name.clone();
        let task = tokio::spawn(poll_task(config, pin, state_tx, changes.clone()));

        Self {
            name,
            enabled: true,
            state,
            changes,
            task: Some(task),
        }
    }

    /// Start polling if the backend opened, otherwise degrade to disabled.
    pub fn from_backend(config: SensorConfig, backend: Result<AnyInputPin>) -> Self {
        match backend {
            Ok(pin) => Self::spawn(config, pin),
            Err(e) => {
                warn!(
                    "Sensor '{}' unavailable on GPIO {}: {}; reporting unknown",
                    config.name, config.pin, e
                );
                Self::disabled(config.name)
            }
        }
    }

    /// A sensor that never reports a value.
    pub fn disabled(name: impl Into<String>) -> Self {
        let (_, state) = watch::channel(None);
        let (changes, _) = broadcast::channel(1);
        Self {
            name: name.into(),
            enabled: false,
            state,
            changes,
            task: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a backend is attached and being polled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Current debounced value; `None` while disabled, failing, or not yet
    /// settled.
    pub fn read(&self) -> Option<bool> {
        *self.state.borrow()
    }

    /// Stream of debounced changes from now on.
    pub fn subscribe(&self) -> SensorSubscription {
        SensorSubscription {
            name: self.name.clone(),
            rx: self.changes.subscribe(),
        }
    }

    /// Wait until the debounced value equals `value`, up to `timeout`.
    ///
    /// Returns immediately if it already does. Returns `false` on timeout
    /// or if the sensor is disabled and `timeout` elapses.
    pub async fn wait_for(&self, value: bool, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.clone();
        // The watch guard must not outlive this statement.
        let result = tokio::time::timeout_at(deadline, state.wait_for(|v| *v == Some(value)))
            .await
            .map(|r| r.map(|_| ()));
        match result {
            Ok(Ok(())) => true,
            // Sender gone: the polling task ended, nothing will change.
            Ok(Err(_)) => {
                tokio::time::sleep_until(deadline).await;
                false
            }
            Err(_) => false,
        }
    }
}

impl Drop for DigitalSensor {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Receiver side of a sensor's change stream.
#[derive(Debug)]
pub struct SensorSubscription {
    name: String,
    rx: broadcast::Receiver<bool>,
}

impl SensorSubscription {
    /// Next debounced value. Returns `None` once the sensor is dropped.
    /// A disabled sensor never yields.
    pub async fn recv(&mut self) -> Option<bool> {
        loop {
            match self.rx.recv().await {
                Ok(value) => return Some(value),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Sensor '{}' subscriber lagged, skipped {}", self.name, skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

async fn poll_task(
    config: SensorConfig,
    mut pin: AnyInputPin,
    state_tx: watch::Sender<Option<bool>>,
    changes: broadcast::Sender<bool>,
) {
    let mut debouncer = Debouncer::new(config.debounce);
    let mut ticker = tokio::time::interval(config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut failing = false;

    if let Ok(info) = pin.get_info().await {
        debug!("Sensor '{}' backend: {} ({})", config.name, info.name, info.backend);
    }

    loop {
        ticker.tick().await;

        match pin.read_level().await {
            Ok(raw) => {
                if failing {
                    info!("Sensor '{}' readable again", config.name);
                    failing = false;
                }
                let level = config.logical_level(raw);
                if let Some(stable) = debouncer.update(level, Instant::now()) {
                    debug!("Sensor '{}' settled at {}", config.name, stable);
                    state_tx.send_replace(Some(stable));
                    // No subscribers is fine.
                    let _ = changes.send(stable);
                }
            }
            Err(e) => {
                if !failing {
                    warn!("Sensor '{}' read failed: {}; reporting unknown", config.name, e);
                    failing = true;
                }
                debouncer.reset();
                state_tx.send_replace(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HardwareError;
    use crate::mock::MockInputPin;

    fn config() -> SensorConfig {
        SensorConfig::new("test", 17)
            .with_active_low(false)
            .with_debounce(Duration::from_millis(50))
            .with_poll_interval(Duration::from_millis(10))
    }

    #[tokio::test(start_paused = true)]
    async fn test_sensor_settles_initial_value() {
        let (pin, _handle) = MockInputPin::new(true);
        let sensor = DigitalSensor::spawn(config(), pin.into());

        assert_eq!(sensor.read(), None);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(sensor.read(), Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sensor_applies_active_low() {
        let (pin, _handle) = MockInputPin::new(false);
        let sensor = DigitalSensor::spawn(config().with_active_low(true), pin.into());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(sensor.read(), Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribe_sees_changes_not_bounces() {
        let (pin, handle) = MockInputPin::new(false);
        let sensor = DigitalSensor::spawn(config(), pin.into());
        tokio::time::sleep(Duration::from_millis(100)).await;

        let mut changes = sensor.subscribe();

        // 20ms glitch is filtered.
        handle.set_level(true);
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.set_level(false);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(sensor.read(), Some(false));

        handle.set_level(true);
        let value = tokio::time::timeout(Duration::from_secs(1), changes.recv())
            .await
            .unwrap();
        assert_eq!(value, Some(true));
        assert_eq!(sensor.read(), Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_sensor_is_silent() {
        let sensor = DigitalSensor::disabled("door");
        let mut changes = sensor.subscribe();

        assert!(!sensor.is_enabled());
        assert_eq!(sensor.read(), None);
        assert!(
            tokio::time::timeout(Duration::from_secs(5), changes.recv())
                .await
                .is_err()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_config_disabled_drops_pin() {
        let (pin, handle) = MockInputPin::new(true);
        let sensor = DigitalSensor::spawn(config_disabled(), pin.into());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(sensor.read(), None);
        assert_eq!(handle.read_count(), 0);
    }

    fn config_disabled() -> SensorConfig {
        SensorConfig {
            enabled: false,
            ..config()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_backend_failure_degrades() {
        let sensor = DigitalSensor::from_backend(
            config(),
            Err(HardwareError::initialization_failed("no gpio")),
        );
        assert!(!sensor.is_enabled());
        assert_eq!(sensor.read(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_failure_reports_unknown_then_recovers() {
        let (pin, handle) = MockInputPin::new(true);
        let sensor = DigitalSensor::spawn(config(), pin.into());
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(sensor.read(), Some(true));

        handle.disconnect();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(sensor.read(), None);

        handle.reconnect();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(sensor.read(), Some(true));
    }

    fn assert_send<T: Send>(_: &T) {}

    #[tokio::test]
    async fn test_wait_for_future_is_send() {
        let sensor = DigitalSensor::disabled("lock");
        let wait = sensor.wait_for(true, Duration::from_millis(1));
        assert_send(&wait);
        assert!(!wait.await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_spawned() {
        let (pin, handle) = MockInputPin::new(false);
        let sensor = std::sync::Arc::new(DigitalSensor::spawn(config(), pin.into()));

        let waiter = std::sync::Arc::clone(&sensor);
        let task =
            tokio::spawn(async move { waiter.wait_for(true, Duration::from_secs(1)).await });
        handle.set_level(true);
        assert!(task.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_stops_at_deadline_when_polling_ends() {
        let (pin, _handle) = MockInputPin::new(false);
        let sensor = DigitalSensor::spawn(config(), pin.into());
        let poll = sensor.task.as_ref().unwrap().abort_handle();
        let sensor = std::sync::Arc::new(sensor);

        let started = Instant::now();
        let waiter = std::sync::Arc::clone(&sensor);
        let task =
            tokio::spawn(async move { waiter.wait_for(true, Duration::from_secs(3)).await });

        tokio::time::sleep(Duration::from_secs(1)).await;
        poll.abort();

        assert!(!task.await.unwrap());
        assert!(started.elapsed() <= Duration::from_secs(3) + Duration::from_millis(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for() {
        let (pin, handle) = MockInputPin::new(false);
        let sensor = DigitalSensor::spawn(config(), pin.into());

        assert!(!sensor.wait_for(true, Duration::from_millis(200)).await);

        handle.set_level(true);
        assert!(sensor.wait_for(true, Duration::from_millis(200)).await);
    }
}

//! Lock controller.
//!
//! The controller owns both reed-switch sensors and the servo actuator and
//! is the only component that touches them. It combines three event
//! sources: commands from the API layer, debounced sensor changes, and the
//! periodic auto-lock check.
//!
//! # Composite state
//!
//! There is no single state enum. The observable state is the triple
//! `(LockState, DoorState, busy)`:
//!
//! - `LockState` / `DoorState` are read straight from the sensors' debounced
//!   values, so they are always the freshest reading, busy or not.
//! - `busy` is set for the whole actuation + confirmation cycle. Exactly one
//!   caller wins it; everyone else gets [`Error::Busy`] immediately.
//!
//! # Safety policies
//!
//! - **Door interlock**: `lock` is refused with [`Error::DoorOpen`] when the
//!   door sensor reports `Open`. `DoorState::Unknown` does **not** block
//!   locking. This is a fail-open choice so that a missing or broken door
//!   switch cannot brick the lock; review it before installing on a real
//!   door.
//! - `unlock` is never interlocked.
//! - `toggle` treats `Unknown` as unlocked and attempts to lock.
//!
//! # Confirmation
//!
//! After a motion the controller waits up to the confirm timeout for the
//! lock-state switch to report the commanded state. A timeout never fails
//! the command and never retries or reverts the motion: the result carries
//! an [`ActionWarning`] instead.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use smartlock_core::constants::{
    DEFAULT_AUTO_LOCK_CHECK_MS, DEFAULT_AUTO_LOCK_SECONDS, DEFAULT_CONFIRM_TIMEOUT_MS,
};
use smartlock_core::{
    ActionOutcome, ActionWarning, ControllerSnapshot, Direction, DoorState, Error, LockState,
    Result,
};
use smartlock_hardware::{DigitalSensor, ServoActuator};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::policy::AutoLockPolicy;
use crate::tasks::ControllerTasks;

/// Controller timing configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// How long to wait for the lock-state switch after a motion.
    pub confirm_timeout: Duration,

    /// Auto-lock evaluation interval.
    pub auto_lock_check_interval: Duration,

    /// Initial auto-lock delay; `0` disables auto-lock.
    pub auto_lock_seconds: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            confirm_timeout: Duration::from_millis(DEFAULT_CONFIRM_TIMEOUT_MS),
            auto_lock_check_interval: Duration::from_millis(DEFAULT_AUTO_LOCK_CHECK_MS),
            auto_lock_seconds: DEFAULT_AUTO_LOCK_SECONDS,
        }
    }
}

/// One actuation + confirmation cycle.
#[derive(Debug, Clone, Copy)]
pub struct ActuationRequest {
    pub direction: Direction,
    pub requested_at: Instant,
}

impl ActuationRequest {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            requested_at: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.requested_at.elapsed()
    }
}

#[derive(Debug)]
struct ControllerState {
    policy: AutoLockPolicy,
    last_warning: Option<String>,
    /// Last lock reading seen, to detect transitions.
    observed_lock: Option<bool>,
    observed_door: Option<bool>,
}

#[derive(Debug)]
struct Inner {
    lock_sensor: DigitalSensor,
    door_sensor: DigitalSensor,
    actuator: ServoActuator,
    config: ControllerConfig,
    busy: AtomicBool,
    state: Mutex<ControllerState>,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Clears the busy flag when dropped, on every exit path.
struct BusyGuard {
    inner: Arc<Inner>,
}

impl BusyGuard {
    fn acquire(inner: &Arc<Inner>) -> Option<Self> {
        inner
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                inner: Arc::clone(inner),
            })
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.inner.busy.store(false, Ordering::Release);
    }
}

/// Process-wide lock controller. Cloning yields another handle to the
/// same instance.
///
/// # Examples
///
/// ```
/// use smartlock_controller::{ControllerConfig, LockController};
/// use smartlock_core::{DoorState, LockState};
/// use smartlock_hardware::{DigitalSensor, ServoActuator, ServoConfig};
///
/// #[tokio::main]
/// async fn main() -> smartlock_core::Result<()> {
///     let controller = LockController::new(
///         DigitalSensor::disabled("lock"),
///         DigitalSensor::disabled("door"),
///         ServoActuator::dry_run(ServoConfig::default())?,
///         ControllerConfig::default(),
///     );
///
///     let status = controller.status();
///     assert_eq!(status.lock_state, LockState::Unknown);
///     assert_eq!(status.door_state, DoorState::Unknown);
///
///     // Unknown door does not block locking; with no lock switch the
///     // result carries a warning instead of a confirmation.
///     let outcome = controller.lock().await?;
///     assert!(outcome.warning.is_some());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct LockController {
    inner: Arc<Inner>,
}

impl LockController {
    pub fn new(
        lock_sensor: DigitalSensor,
        door_sensor: DigitalSensor,
        actuator: ServoActuator,
        config: ControllerConfig,
    ) -> Self {
        let policy = AutoLockPolicy::new(config.auto_lock_seconds);
        info!(
            "Lock controller ready: lock sensor {}, door sensor {}, auto-lock {}s, confirm timeout {}ms",
            enabled_str(lock_sensor.is_enabled()),
            enabled_str(door_sensor.is_enabled()),
            policy.delay_seconds(),
            config.confirm_timeout.as_millis()
        );

        Self {
            inner: Arc::new(Inner {
                lock_sensor,
                door_sensor,
                actuator,
                config,
                busy: AtomicBool::new(false),
                state: Mutex::new(ControllerState {
                    policy,
                    last_warning: None,
                    observed_lock: None,
                    observed_door: None,
                }),
            }),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    /// Current lock state from the debounced lock-state switch.
    pub fn lock_state(&self) -> LockState {
        LockState::from_reading(self.inner.lock_sensor.read())
    }

    /// Current door state from the debounced door-state switch.
    pub fn door_state(&self) -> DoorState {
        DoorState::from_reading(self.inner.door_sensor.read())
    }

    /// Whether an actuation or confirmation is in progress.
    pub fn is_busy(&self) -> bool {
        self.inner.busy.load(Ordering::Acquire)
    }

    /// Lock the door.
    ///
    /// # Errors
    ///
    /// - [`Error::Busy`] if another command is in progress.
    /// - [`Error::DoorOpen`] if the door sensor reports open. No motion.
    /// - [`Error::ActuatorUnavailable`] if the servo drive failed.
    pub async fn lock(&self) -> Result<ActionOutcome> {
        self.perform(Direction::Lock).await
    }

    /// Unlock the door. Never interlocked.
    ///
    /// # Errors
    ///
    /// - [`Error::Busy`] if another command is in progress.
    /// - [`Error::ActuatorUnavailable`] if the servo drive failed.
    pub async fn unlock(&self) -> Result<ActionOutcome> {
        self.perform(Direction::Unlock).await
    }

    /// Unlock when locked; otherwise (unlocked or unknown) lock.
    ///
    /// # Errors
    ///
    /// Same as [`lock`](Self::lock) or [`unlock`](Self::unlock).
    pub async fn toggle(&self) -> Result<ActionOutcome> {
        match self.lock_state() {
            LockState::Locked => self.unlock().await,
            state => {
                debug!("Toggle from {}: attempting lock", state);
                self.lock().await
            }
        }
    }

    /// Set the auto-lock delay; `0` disables auto-lock.
    pub fn set_auto_lock(&self, seconds: u64) {
        let currently_unlocked = self.lock_state() == LockState::Unlocked;
        let mut state = self.inner.state();
        state
            .policy
            .set_delay(seconds, Instant::now(), Utc::now(), currently_unlocked);

        if seconds == 0 {
            info!("Auto-lock disabled");
        } else {
            info!("Auto-lock set to {}s", seconds);
        }
    }

    /// Read-only snapshot. Never waits on the actuator.
    pub fn status(&self) -> ControllerSnapshot {
        let lock_state = self.lock_state();
        let door_state = self.door_state();
        let busy = self.is_busy();
        let now = Instant::now();
        let state = self.inner.state();

        ControllerSnapshot {
            lock_state,
            door_state,
            auto_lock_enabled: state.policy.is_enabled(),
            auto_lock_seconds: state.policy.delay_seconds(),
            last_action_warning: state.last_warning.clone(),
            busy,
            last_unlock_at: state.policy.last_unlock_wall(),
            auto_lock_remaining_seconds: state
                .policy
                .remaining(now)
                .map(|d| d.as_secs_f64().ceil() as u64),
        }
    }

    /// Monotonic time of the last recorded unlock, while auto-lock is on.
    pub fn last_unlock_at(&self) -> Option<Instant> {
        self.inner.state().policy.last_unlock_at()
    }

    /// Spawn the sensor reconciliation loops and the auto-lock task.
    ///
    /// Must be called once, from within a Tokio runtime.
    pub fn start(&self) -> ControllerTasks {
        let lock_changes = self.inner.lock_sensor.subscribe();
        let door_changes = self.inner.door_sensor.subscribe();
        {
            let mut state = self.inner.state();
            state.observed_lock = self.inner.lock_sensor.read();
            state.observed_door = self.inner.door_sensor.read();
        }
        if self.lock_state() == LockState::Unlocked {
            self.record_unlock();
        }

        ControllerTasks::spawn(self.clone(), lock_changes, door_changes)
    }

    /// Release the servo signal; used on shutdown.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ActuatorUnavailable`] if the release fails.
    pub async fn release_actuator(&self) -> Result<()> {
        self.inner
            .actuator
            .release()
            .await
            .map_err(|e| Error::ActuatorUnavailable(e.to_string()))
    }

    async fn perform(&self, direction: Direction) -> Result<ActionOutcome> {
        let Some(guard) = BusyGuard::acquire(&self.inner) else {
            debug!("Refusing {}: busy", direction);
            return Err(Error::Busy);
        };

        if direction == Direction::Lock && self.door_state() == DoorState::Open {
            warn!("Refusing to lock: door is open");
            return Err(Error::DoorOpen);
        }

        // The cycle runs in its own task so dropping the caller's future
        // cannot stop the servo mid-stroke.
        let controller = self.clone();
        tokio::spawn(async move {
            let _guard = guard;
            controller.run(ActuationRequest::new(direction)).await
        })
        .await
        .map_err(|e| {
            error!("Actuation task failed: {}", e);
            Error::ActuatorUnavailable(format!("actuation task failed: {e}"))
        })?
    }

    async fn run(&self, request: ActuationRequest) -> Result<ActionOutcome> {
        let direction = request.direction;

        if let Err(e) = self.inner.actuator.actuate(direction).await {
            error!("Servo {} failed: {}", direction, e);
            self.inner.state().last_warning = Some(format!("Actuation failed: {e}"));
            return Err(Error::ActuatorUnavailable(e.to_string()));
        }

        let outcome = self.confirm(direction).await;

        {
            let mut state = self.inner.state();
            match direction {
                Direction::Unlock if outcome.is_confirmed() => {
                    state.policy.record_unlock(Instant::now(), Utc::now());
                }
                Direction::Unlock => {}
                Direction::Lock => state.policy.consume(),
            }
            state.last_warning = outcome.warning.as_ref().map(ToString::to_string);
        }

        info!(
            "{} finished in {}ms ({})",
            direction,
            request.elapsed().as_millis(),
            if outcome.is_confirmed() {
                "confirmed"
            } else {
                "unconfirmed"
            }
        );
        Ok(outcome)
    }

    async fn confirm(&self, direction: Direction) -> ActionOutcome {
        let expected = direction.expected_state();

        if !self.inner.lock_sensor.is_enabled() {
            warn!("No lock-state sensor; {} cannot be confirmed", direction);
            return ActionOutcome::unconfirmed(
                direction,
                LockState::Unknown,
                ActionWarning::ConfirmationUnavailable { expected },
            );
        }

        let timeout = self.inner.config.confirm_timeout;
        if self
            .inner
            .lock_sensor
            .wait_for(direction.expected_reading(), timeout)
            .await
        {
            self.observe_lock(direction.expected_reading());
            return ActionOutcome::confirmed(direction);
        }

        let observed = self.lock_state();
        warn!(
            "{} not confirmed within {}ms (lock state {})",
            direction,
            timeout.as_millis(),
            observed
        );
        ActionOutcome::unconfirmed(
            direction,
            observed,
            ActionWarning::ConfirmationTimeout { expected, timeout },
        )
    }

    fn record_unlock(&self) {
        let mut state = self.inner.state();
        if state.policy.record_unlock(Instant::now(), Utc::now()) {
            debug!("Auto-lock window opened");
        }
    }

    /// Apply a debounced lock-state reading, whatever its source.
    pub(crate) fn observe_lock(&self, reading: bool) {
        let mut state = self.inner.state();
        let previous = state.observed_lock.replace(reading);
        if previous == Some(reading) {
            return;
        }

        info!(
            "Lock state {} -> {}",
            LockState::from_reading(previous),
            LockState::from_reading(Some(reading))
        );
        if reading {
            state.policy.consume();
        } else {
            state.policy.record_unlock(Instant::now(), Utc::now());
        }
    }

    /// Apply a debounced door-state reading. No side effects beyond logging.
    pub(crate) fn observe_door(&self, reading: bool) {
        let mut state = self.inner.state();
        let previous = state.observed_door.replace(reading);
        if previous != Some(reading) {
            info!(
                "Door {} -> {}",
                DoorState::from_reading(previous),
                DoorState::from_reading(Some(reading))
            );
        }
    }

    /// One auto-lock evaluation.
    pub(crate) async fn auto_lock_tick(&self) {
        let (due, delay) = {
            let state = self.inner.state();
            (state.policy.is_due(Instant::now()), state.policy.delay_seconds())
        };
        if !due {
            return;
        }

        let door = self.door_state();
        if door != DoorState::Closed {
            debug!("Auto-lock due but door is {}", door);
            return;
        }

        if self.lock_state() == LockState::Locked {
            debug!("Auto-lock due but already locked");
            self.inner.state().policy.consume();
            return;
        }

        info!("Auto-lock: {}s since last unlock, door closed", delay);
        match self.lock().await {
            Ok(outcome) => {
                if let Some(warning) = outcome.warning {
                    warn!("Auto-lock: {}", warning);
                }
            }
            // Retried on the next tick.
            Err(Error::Busy | Error::DoorOpen) => {}
            Err(e) => {
                error!("Auto-lock failed: {}", e);
                self.inner.state().policy.consume();
            }
        }
    }
}

fn enabled_str(enabled: bool) -> &'static str {
    if enabled { "enabled" } else { "disabled" }
}

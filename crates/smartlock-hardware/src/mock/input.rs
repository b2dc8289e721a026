//! Mock input pin for testing and development.
//!
//! The pin level lives behind an atomic shared with a [`MockInputPinHandle`],
//! so tests can flip a reed switch while the sensor task keeps polling.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::{HardwareError, Result, traits::InputPin, types::DeviceInfo};

#[derive(Debug)]
struct PinState {
    level: AtomicBool,
    connected: AtomicBool,
    reads: AtomicU64,
}

/// Mock GPIO input.
///
/// # Examples
///
/// ```
/// use smartlock_hardware::mock::MockInputPin;
/// use smartlock_hardware::traits::InputPin;
///
/// #[tokio::main]
/// async fn main() -> smartlock_hardware::Result<()> {
///     let (mut pin, handle) = MockInputPin::new(false);
///     assert!(!pin.read_level().await?);
///
///     handle.set_level(true);
///     assert!(pin.read_level().await?);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockInputPin {
    state: Arc<PinState>,
    name: String,
}

impl MockInputPin {
    /// Create a mock pin with the given initial raw level.
    pub fn new(initial_level: bool) -> (Self, MockInputPinHandle) {
        Self::with_name("Mock Input", initial_level)
    }

    /// Create a named mock pin.
    pub fn with_name(name: impl Into<String>, initial_level: bool) -> (Self, MockInputPinHandle) {
        let state = Arc::new(PinState {
            level: AtomicBool::new(initial_level),
            connected: AtomicBool::new(true),
            reads: AtomicU64::new(0),
        });
        let pin = Self {
            state: Arc::clone(&state),
            name: name.into(),
        };
        (pin, MockInputPinHandle { state })
    }
}

impl InputPin for MockInputPin {
    async fn read_level(&mut self) -> Result<bool> {
        if !self.state.connected.load(Ordering::SeqCst) {
            return Err(HardwareError::disconnected(self.name.clone()));
        }
        self.state.reads.fetch_add(1, Ordering::Relaxed);
        Ok(self.state.level.load(Ordering::SeqCst))
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.name.clone(), "mock"))
    }
}

/// Handle for controlling a mock input pin. Cheap to clone.
#[derive(Debug, Clone)]
pub struct MockInputPinHandle {
    state: Arc<PinState>,
}

impl MockInputPinHandle {
    /// Set the raw electrical level.
    pub fn set_level(&self, level: bool) {
        self.state.level.store(level, Ordering::SeqCst);
    }

    /// Current raw electrical level.
    pub fn level(&self) -> bool {
        self.state.level.load(Ordering::SeqCst)
    }

    /// Make subsequent reads fail as if the line vanished.
    pub fn disconnect(&self) {
        self.state.connected.store(false, Ordering::SeqCst);
    }

    /// Undo [`disconnect`](Self::disconnect).
    pub fn reconnect(&self) {
        self.state.connected.store(true, Ordering::SeqCst);
    }

    /// Number of successful reads so far.
    pub fn read_count(&self) -> u64 {
        self.state.reads.load(Ordering::Relaxed)
    }
}

//! Mock servo driver for testing and development.
//!
//! Records every command it receives and counts strokes (a transition from
//! neutral or released to a non-zero speed). An optional feedback callback
//! runs at the start of each stroke, which lets tests move a mock reed
//! switch the way a real bolt would follow the servo.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::{HardwareError, Result, traits::ServoDriver, types::DeviceInfo};

/// A command observed by the mock servo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ServoCommand {
    Speed(f32),
    Release,
}

type Feedback = Arc<dyn Fn(f32) + Send + Sync>;

#[derive(Debug, Default)]
struct ServoState {
    speed: f32,
    commands: Vec<ServoCommand>,
    strokes: usize,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<ServoState>,
    failing: AtomicBool,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, ServoState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Mock servo driver.
///
/// # Examples
///
/// ```
/// use smartlock_hardware::mock::{MockServo, ServoCommand};
/// use smartlock_hardware::traits::ServoDriver;
///
/// #[tokio::main]
/// async fn main() -> smartlock_hardware::Result<()> {
///     let (mut servo, handle) = MockServo::new();
///     servo.set_speed(1.0).await?;
///     servo.release().await?;
///
///     assert_eq!(handle.stroke_count(), 1);
///     assert_eq!(handle.commands(), vec![ServoCommand::Speed(1.0), ServoCommand::Release]);
///     Ok(())
/// }
/// ```
pub struct MockServo {
    shared: Arc<Shared>,
    feedback: Option<Feedback>,
    name: String,
}

impl fmt::Debug for MockServo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockServo")
            .field("name", &self.name)
            .field("feedback", &self.feedback.is_some())
            .finish()
    }
}

impl MockServo {
    pub fn new() -> (Self, MockServoHandle) {
        let shared = Arc::new(Shared::default());
        let servo = Self {
            shared: Arc::clone(&shared),
            feedback: None,
            name: "Mock Servo".to_string(),
        };
        (servo, MockServoHandle { shared })
    }

    /// Install a callback invoked with the outbound speed of every stroke.
    pub fn with_feedback(mut self, feedback: impl Fn(f32) + Send + Sync + 'static) -> Self {
        self.feedback = Some(Arc::new(feedback));
        self
    }
}

impl Default for MockServo {
    fn default() -> Self {
        Self::new().0
    }
}

impl ServoDriver for MockServo {
    async fn set_speed(&mut self, speed: f32) -> Result<()> {
        if self.shared.failing.load(Ordering::SeqCst) {
            return Err(HardwareError::communication("mock servo write failed"));
        }

        let stroke_started = {
            let mut state = self.shared.lock();
            state.commands.push(ServoCommand::Speed(speed));
            let started = state.speed == 0.0 && speed != 0.0;
            if started {
                state.strokes += 1;
            }
            state.speed = speed;
            started
        };

        if stroke_started && let Some(feedback) = &self.feedback {
            feedback(speed);
        }
        Ok(())
    }

    async fn release(&mut self) -> Result<()> {
        let mut state = self.shared.lock();
        state.commands.push(ServoCommand::Release);
        state.speed = 0.0;
        Ok(())
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.name.clone(), "mock"))
    }
}

/// Handle for inspecting and controlling a mock servo. Cheap to clone.
#[derive(Debug, Clone)]
pub struct MockServoHandle {
    shared: Arc<Shared>,
}

impl MockServoHandle {
    /// All commands received so far.
    pub fn commands(&self) -> Vec<ServoCommand> {
        self.shared.lock().commands.clone()
    }

    /// Number of strokes started.
    pub fn stroke_count(&self) -> usize {
        self.shared.lock().strokes
    }

    /// Speed currently applied (0.0 when released).
    pub fn current_speed(&self) -> f32 {
        self.shared.lock().speed
    }

    /// Make `set_speed` fail until cleared.
    pub fn set_failing(&self, failing: bool) {
        self.shared.failing.store(failing, Ordering::SeqCst);
    }
}

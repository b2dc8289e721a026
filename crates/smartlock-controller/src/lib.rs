//! Lock control logic for the smart lock.
//!
//! This crate ties the debounced reed-switch sensors and the servo actuator
//! from `smartlock-hardware` into a single [`LockController`]:
//!
//! - `lock` / `unlock` / `toggle` commands with single-flight busy
//!   rejection and a door-open interlock on locking
//! - post-motion confirmation against the lock-state switch, reported as a
//!   warning rather than an error when it times out
//! - reconciliation of manual thumb-turn operation from the sensor change
//!   streams
//! - auto-lock after a configurable delay, only while the door is closed
//!
//! # Example
//!
//! ```no_run
//! use smartlock_controller::{ControllerConfig, LockController};
//! use smartlock_hardware::{DigitalSensor, ServoActuator, ServoConfig};
//!
//! #[tokio::main]
//! async fn main() -> smartlock_core::Result<()> {
//!     let controller = LockController::new(
//!         DigitalSensor::disabled("lock"),
//!         DigitalSensor::disabled("door"),
//!         ServoActuator::dry_run(ServoConfig::default())?,
//!         ControllerConfig::default(),
//!     );
//!
//!     let tasks = controller.start();
//!     controller.set_auto_lock(30);
//!     controller.unlock().await?;
//!
//!     tasks.shutdown().await?;
//!     controller.release_actuator().await
//! }
//! ```

pub mod controller;
pub mod policy;
pub mod tasks;

pub use controller::{ActuationRequest, ControllerConfig, LockController};
pub use policy::AutoLockPolicy;
pub use tasks::ControllerTasks;

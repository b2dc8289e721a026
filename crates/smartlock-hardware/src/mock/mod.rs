//! Mock device implementations for testing and development.
//!
//! This module provides simulated devices that can be controlled
//! programmatically without requiring physical hardware.

pub mod input;
pub mod servo;

// Re-export commonly used types
pub use input::{MockInputPin, MockInputPinHandle};
pub use servo::{MockServo, MockServoHandle, ServoCommand};

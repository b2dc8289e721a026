//! Error types for hardware operations.
//!
//! This module defines error types specific to GPIO inputs and the servo
//! drive, covering device absence, I/O failures on the backend and
//! invalid configuration.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware device operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Device communication error.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// Invalid data received from device.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Device initialization failed.
    #[error("Initialization failed: {message}")]
    InitializationFailed { message: String },

    /// Device configuration error.
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    /// Create a new invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create a new initialization failed error.
    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }
}

/// Disconnected pins and unreadable levels come from the reed-switch
/// inputs; every other backend failure is charged to the servo drive.
impl From<HardwareError> for smartlock_core::Error {
    fn from(error: HardwareError) -> Self {
        match error {
            HardwareError::ConfigurationError { message } => smartlock_core::Error::Config(message),
            HardwareError::Disconnected { .. } | HardwareError::InvalidData { .. } => {
                smartlock_core::Error::SensorUnavailable(error.to_string())
            }
            other => smartlock_core::Error::ActuatorUnavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_error() {
        let error = HardwareError::disconnected("GPIO 17");
        assert!(matches!(error, HardwareError::Disconnected { .. }));
        assert_eq!(error.to_string(), "Device disconnected: GPIO 17");
    }

    #[test]
    fn test_invalid_data_error() {
        let error = HardwareError::invalid_data("unexpected value '7'");
        assert_eq!(error.to_string(), "Invalid data: unexpected value '7'");
    }

    #[test]
    fn test_conversion_into_core_error() {
        let core: smartlock_core::Error = HardwareError::communication("write failed").into();
        assert!(matches!(core, smartlock_core::Error::ActuatorUnavailable(_)));

        let core: smartlock_core::Error = HardwareError::configuration("bad speed").into();
        assert!(matches!(core, smartlock_core::Error::Config(_)));
    }

    #[test]
    fn test_input_errors_become_sensor_unavailable() {
        let core: smartlock_core::Error = HardwareError::disconnected("GPIO 17").into();
        assert!(matches!(core, smartlock_core::Error::SensorUnavailable(_)));
        assert_eq!(core.code(), "sensor_unavailable");

        let core: smartlock_core::Error = HardwareError::invalid_data("unexpected value '7'").into();
        assert!(matches!(core, smartlock_core::Error::SensorUnavailable(_)));

        let core: smartlock_core::Error = HardwareError::initialization_failed("pwmchip0").into();
        assert!(matches!(core, smartlock_core::Error::ActuatorUnavailable(_)));
    }
}

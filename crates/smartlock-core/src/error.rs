use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Command refusals
    #[error("Door is open; refusing to lock")]
    DoorOpen,

    #[error("Another lock operation is in progress")]
    Busy,

    // Hardware errors
    #[error("Actuator unavailable: {0}")]
    ActuatorUnavailable(String),

    #[error("Sensor unavailable: {0}")]
    SensorUnavailable(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Error::DoorOpen => "door_open",
            Error::Busy => "busy",
            Error::ActuatorUnavailable(_) => "actuator_unavailable",
            Error::SensorUnavailable(_) => "sensor_unavailable",
            Error::Io(_) => "io_error",
            Error::Config(_) => "config_error",
        }
    }

    /// Returns `true` for refusals that happen before any motion is issued.
    pub fn is_refusal(&self) -> bool {
        matches!(self, Error::DoorOpen | Error::Busy)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ControlError {
    #[error("actuator fault: {0}")]
    Actuator(String),
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("timeout waiting for sensor")]
    Timeout,
    #[error("motor already released")]
    Released,
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing climate sensor")]
    MissingClimateSensor,
    #[error("missing range sensor")]
    MissingRangeSensor,
    #[error("missing motor")]
    MissingMotor,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;

//! Collaborator traits shared by the core control loop and the hardware drivers.
pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// One DHT-style climate reading. Either channel may be missing on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Climate {
    pub temperature_c: Option<f32>,
    pub humidity_pct: Option<f32>,
}

/// Host telemetry snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SystemSample {
    /// SoC temperature; absent when the thermal zone cannot be read.
    pub cpu_temp_c: Option<f32>,
    pub cpu_percent: f32,
    pub ram_percent: f32,
}

pub trait ClimateSensor {
    fn read(&mut self) -> Result<Climate, Box<dyn std::error::Error + Send + Sync>>;
}

pub trait RangeSensor {
    /// Distance to the nearest obstacle in centimetres. Must give up after `timeout`.
    fn read_cm(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<f32, Box<dyn std::error::Error + Send + Sync>>;
}

pub trait SystemStats {
    fn sample(&mut self) -> Result<SystemSample, Box<dyn std::error::Error + Send + Sync>>;
}

/// H-bridge driven DC motor.
pub trait Motor {
    /// Drive the direction pins for forward rotation.
    fn forward(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    /// Set the enable-pin PWM duty cycle in percent (0.0..=100.0).
    fn set_duty_cycle(
        &mut self,
        percent: f32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    /// Put every output in a safe state and give the pins back.
    fn release(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: ClimateSensor + ?Sized> ClimateSensor for Box<T> {
    fn read(&mut self) -> Result<Climate, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read()
    }
}

impl<T: RangeSensor + ?Sized> RangeSensor for Box<T> {
    fn read_cm(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<f32, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read_cm(timeout)
    }
}

impl<T: SystemStats + ?Sized> SystemStats for Box<T> {
    fn sample(&mut self) -> Result<SystemSample, Box<dyn std::error::Error + Send + Sync>> {
        (**self).sample()
    }
}

impl<T: Motor + ?Sized> Motor for Box<T> {
    fn forward(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).forward()
    }

    fn set_duty_cycle(
        &mut self,
        percent: f32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_duty_cycle(percent)
    }

    fn release(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).release()
    }
}

use rppal::gpio::{Gpio, OutputPin};
use tracing::debug;

use crate::error::{HwError, Result};

/// L298N-style H-bridge channel: two direction inputs and a PWM enable line.
pub struct HBridgeMotor {
    in1: OutputPin,
    in2: OutputPin,
    ena: OutputPin,
    pwm_hz: f64,
    released: bool,
}

impl HBridgeMotor {
    /// Claim the pins and start PWM on ENA at 0 % duty.
    pub fn open(in1_pin: u8, in2_pin: u8, ena_pin: u8, pwm_hz: f64) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let claim = |pin: u8| -> Result<OutputPin> {
            let mut out = gpio
                .get(pin)
                .map_err(|e| HwError::Gpio(format!("open motor pin {pin}: {e}")))?
                .into_output_low();
            out.set_reset_on_drop(true);
            Ok(out)
        };
        let mut motor = Self {
            in1: claim(in1_pin)?,
            in2: claim(in2_pin)?,
            ena: claim(ena_pin)?,
            pwm_hz,
            released: false,
        };
        motor.apply_duty(0.0)?;
        Ok(motor)
    }

    fn apply_duty(&mut self, percent: f32) -> Result<()> {
        let duty = f64::from(percent.clamp(0.0, 100.0)) / 100.0;
        self.ena
            .set_pwm_frequency(self.pwm_hz, duty)
            .map_err(|e| HwError::Pwm(e.to_string()))
    }

    fn shutdown(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        let pwm = self.ena.clear_pwm().map_err(|e| HwError::Pwm(e.to_string()));
        self.ena.set_low();
        self.in1.set_low();
        self.in2.set_low();
        debug!("h-bridge outputs released");
        pwm
    }
}

impl Drop for HBridgeMotor {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

impl proxmotor_traits::Motor for HBridgeMotor {
    fn forward(&mut self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.in1.set_high();
        self.in2.set_low();
        Ok(())
    }

    fn set_duty_cycle(
        &mut self,
        percent: f32,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.apply_duty(percent)?)
    }

    fn release(&mut self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.shutdown()?)
    }
}

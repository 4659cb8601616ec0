use std::time::Duration;
use tracing::trace;

use crate::error::{HwError, Result};
use crate::util::{echo_to_cm, wait_for_level_with_timeout};

/// HC-SR04 ultrasonic ranger on two GPIO lines.
pub struct HcSr04 {
    trig: rppal::gpio::OutputPin,
    echo: rppal::gpio::InputPin,
    settle: Duration,
}

impl HcSr04 {
    pub fn new(
        mut trig: rppal::gpio::OutputPin,
        echo: rppal::gpio::InputPin,
        settle: Duration,
    ) -> Self {
        trig.set_low();
        Self { trig, echo, settle }
    }

    pub fn open(trig_pin: u8, echo_pin: u8, settle: Duration) -> Result<Self> {
        let gpio = rppal::gpio::Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let trig = gpio
            .get(trig_pin)
            .map_err(|e| HwError::Gpio(format!("open hc-sr04 trig {trig_pin}: {e}")))?
            .into_output();
        let echo = gpio
            .get(echo_pin)
            .map_err(|e| HwError::Gpio(format!("open hc-sr04 echo {echo_pin}: {e}")))?
            .into_input();
        Ok(Self::new(trig, echo, settle))
    }

    /// Fire one ping and time the echo. Each edge wait is bounded by `timeout`.
    pub fn read_with_timeout(&mut self, timeout: Duration) -> Result<f32> {
        self.trig.set_low();
        std::thread::sleep(self.settle);
        self.trig.set_high();
        std::thread::sleep(Duration::from_micros(10));
        self.trig.set_low();

        let echo = &self.echo;
        // Rising edge: start of the echo pulse
        wait_for_level_with_timeout(|| echo.is_high(), true, timeout, Duration::ZERO)
            .map_err(|_| HwError::EchoTimeout)?;
        // Falling edge: pulse width is the round trip time
        let pulse = wait_for_level_with_timeout(|| echo.is_high(), false, timeout, Duration::ZERO)
            .map_err(|_| HwError::EchoTimeout)?;

        let cm = echo_to_cm(pulse);
        trace!(pulse_us = pulse.as_micros() as u64, cm, "hc-sr04 echo");
        Ok(cm)
    }
}

impl proxmotor_traits::RangeSensor for HcSr04 {
    fn read_cm(
        &mut self,
        timeout: Duration,
    ) -> std::result::Result<f32, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.read_with_timeout(timeout)?)
    }
}

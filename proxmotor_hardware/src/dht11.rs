use std::time::Duration;
use tracing::trace;

use rppal::gpio::{IoPin, Mode};

use crate::error::{HwError, Result};
use crate::util::{decode_dht11, dht_pulses_to_bytes, wait_for_level_with_timeout};

/// Host start signal: hold the line low for at least 18 ms.
const START_LOW: Duration = Duration::from_millis(18);
/// Generous upper bound for any single edge of the response.
const EDGE_TIMEOUT: Duration = Duration::from_micros(200);

/// DHT11 temperature/humidity sensor on a single bidirectional line.
pub struct Dht11 {
    pin: IoPin,
}

impl Dht11 {
    pub fn new(mut pin: IoPin) -> Self {
        pin.set_mode(Mode::Output);
        pin.set_high();
        Self { pin }
    }

    pub fn open(data_pin: u8) -> Result<Self> {
        let gpio = rppal::gpio::Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let pin = gpio
            .get(data_pin)
            .map_err(|e| HwError::Gpio(format!("open dht11 {data_pin}: {e}")))?
            .into_io(Mode::Output);
        Ok(Self::new(pin))
    }

    /// Run one full transaction and return `(temperature_c, humidity_pct)`.
    pub fn read_frame(&mut self) -> Result<(f32, f32)> {
        self.pin.set_mode(Mode::Output);
        self.pin.set_low();
        std::thread::sleep(START_LOW);
        self.pin.set_high();
        self.pin.set_mode(Mode::Input);

        let pin = &self.pin;
        let wait = |level: bool| {
            wait_for_level_with_timeout(|| pin.is_high(), level, EDGE_TIMEOUT, Duration::ZERO)
                .map_err(|_| HwError::DhtTimeout)
        };

        // Sensor acknowledges with ~80 µs low then ~80 µs high.
        wait(false)?;
        wait(true)?;
        wait(false)?;

        let mut pulses = [Duration::ZERO; 40];
        for p in pulses.iter_mut() {
            wait(true)?;
            *p = wait(false)?;
        }

        let frame = dht_pulses_to_bytes(&pulses);
        trace!(?frame, "dht11 frame");
        decode_dht11(frame)
    }
}

impl Drop for Dht11 {
    fn drop(&mut self) {
        self.pin.set_mode(Mode::Input);
    }
}

impl proxmotor_traits::ClimateSensor for Dht11 {
    fn read(
        &mut self,
    ) -> std::result::Result<proxmotor_traits::Climate, Box<dyn std::error::Error + Send + Sync>>
    {
        let (temperature_c, humidity_pct) = self.read_frame()?;
        Ok(proxmotor_traits::Climate {
            temperature_c: Some(temperature_c),
            humidity_pct: Some(humidity_pct),
        })
    }
}

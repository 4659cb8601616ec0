//! Sensor boundary: every collaborator failure becomes an absent value plus a log line.

use std::time::Duration;

use proxmotor_traits::{ClimateSensor, RangeSensor, SystemSample, SystemStats};
use tracing::{trace, warn};

use crate::error::ControlError;
use crate::hw_error::map_hw_error;

/// Non-finite readings are as good as no reading.
#[inline]
fn finite(v: Option<f32>) -> Option<f32> {
    v.filter(|x| x.is_finite())
}

fn kind(e: &ControlError) -> &'static str {
    match e {
        ControlError::Timeout => "timeout",
        _ => "fault",
    }
}

/// Wraps the raw climate and range sensors so the control path only ever sees `Option<f32>`.
pub struct SensorReader<C, R> {
    climate: C,
    range: R,
}

impl<C: ClimateSensor, R: RangeSensor> SensorReader<C, R> {
    pub fn new(climate: C, range: R) -> Self {
        Self { climate, range }
    }

    /// `(temperature_c, humidity_pct)`; both absent when the transaction failed.
    pub fn read_temperature_humidity(&mut self) -> (Option<f32>, Option<f32>) {
        match self.climate.read() {
            Ok(c) => {
                let t = finite(c.temperature_c);
                let h = finite(c.humidity_pct);
                trace!(temperature_c = t, humidity_pct = h, "climate read");
                if t.is_none() {
                    warn!(stream = "temperature", "climate sensor returned no temperature");
                }
                (t, h)
            }
            Err(e) => {
                let mapped = map_hw_error(&*e);
                warn!(stream = "temperature", kind = kind(&mapped), error = %e, "climate read failed");
                (None, None)
            }
        }
    }

    pub fn read_distance(&mut self, timeout: Duration) -> Option<f32> {
        match self.range.read_cm(timeout) {
            Ok(cm) => {
                let cm = finite(Some(cm));
                if cm.is_none() {
                    warn!(stream = "distance", "range sensor returned a non-finite value");
                }
                trace!(distance_cm = cm, "range read");
                cm
            }
            Err(e) => {
                let mapped = map_hw_error(&*e);
                warn!(stream = "distance", kind = kind(&mapped), error = %e, "range read failed");
                None
            }
        }
    }
}

/// Host telemetry; failures are logged and reported as absent.
pub fn sample_system_stats<S: SystemStats + ?Sized>(stats: &mut S) -> Option<SystemSample> {
    match stats.sample() {
        Ok(s) => Some(SystemSample {
            cpu_temp_c: finite(s.cpu_temp_c),
            ..s
        }),
        Err(e) => {
            warn!(stream = "telemetry", error = %e, "system stats unavailable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proxmotor_traits::Climate;

    struct Fixed(Result<f32, &'static str>);
    impl RangeSensor for Fixed {
        fn read_cm(
            &mut self,
            _timeout: Duration,
        ) -> Result<f32, Box<dyn std::error::Error + Send + Sync>> {
            self.0.map_err(|m| m.into())
        }
    }

    struct Dht(Result<Climate, &'static str>);
    impl ClimateSensor for Dht {
        fn read(&mut self) -> Result<Climate, Box<dyn std::error::Error + Send + Sync>> {
            self.0.map_err(|m| m.into())
        }
    }

    fn climate(t: Option<f32>, h: Option<f32>) -> Dht {
        Dht(Ok(Climate {
            temperature_c: t,
            humidity_pct: h,
        }))
    }

    #[test]
    fn errors_become_absent() {
        let mut r = SensorReader::new(Dht(Err("checksum")), Fixed(Err("echo timeout")));
        assert_eq!(r.read_temperature_humidity(), (None, None));
        assert_eq!(r.read_distance(Duration::from_millis(50)), None);
    }

    #[test]
    fn present_values_pass_through() {
        let mut r = SensorReader::new(climate(Some(24.0), Some(41.0)), Fixed(Ok(12.5)));
        assert_eq!(r.read_temperature_humidity(), (Some(24.0), Some(41.0)));
        assert_eq!(r.read_distance(Duration::from_millis(50)), Some(12.5));
    }

    #[test]
    fn non_finite_values_are_absent() {
        let mut r = SensorReader::new(climate(Some(f32::NAN), Some(40.0)), Fixed(Ok(f32::INFINITY)));
        assert_eq!(r.read_temperature_humidity(), (None, Some(40.0)));
        assert_eq!(r.read_distance(Duration::from_millis(50)), None);
    }

    struct Stats(Option<SystemSample>);
    impl SystemStats for Stats {
        fn sample(&mut self) -> Result<SystemSample, Box<dyn std::error::Error + Send + Sync>> {
            self.0.ok_or_else(|| "no procfs".into())
        }
    }

    #[test]
    fn telemetry_failure_is_absent() {
        assert_eq!(sample_system_stats(&mut Stats(None)), None);
        let s = SystemSample {
            cpu_temp_c: Some(50.0),
            cpu_percent: 12.0,
            ram_percent: 40.0,
        };
        assert_eq!(sample_system_stats(&mut Stats(Some(s))), Some(s));
    }
}

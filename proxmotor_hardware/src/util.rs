use std::time::{Duration, Instant};

use crate::error::{HwError, Result};

/// Speed of sound at ~20 °C in centimetres per second.
pub const SPEED_OF_SOUND_CM_S: f32 = 34_300.0;

/// A DHT11 high pulse longer than this encodes a 1 bit (~26-28 µs for 0, ~70 µs for 1).
pub const DHT_ONE_THRESHOLD: Duration = Duration::from_micros(48);

/// Wait until `is_high()` reports `want_high`, or `timeout` expires.
///
/// Returns how long the wait took. A zero `poll_interval` spins instead of sleeping,
/// which is what microsecond-scale edge timing needs.
pub fn wait_for_level_with_timeout(
    mut is_high: impl FnMut() -> bool,
    want_high: bool,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<Duration> {
    let start = Instant::now();
    let deadline = start + timeout;
    while is_high() != want_high {
        if Instant::now() >= deadline {
            return Err(HwError::EdgeTimeout);
        }
        if poll_interval.is_zero() {
            std::hint::spin_loop();
        } else {
            std::thread::sleep(poll_interval);
        }
    }
    Ok(start.elapsed())
}

/// Convert an HC-SR04 echo pulse width into a one-way distance.
#[inline]
pub fn echo_to_cm(pulse: Duration) -> f32 {
    pulse.as_secs_f32() * SPEED_OF_SOUND_CM_S / 2.0
}

/// Pack 40 measured high-pulse widths into the 5 raw DHT11 bytes, MSB first.
pub fn dht_pulses_to_bytes(pulses: &[Duration; 40]) -> [u8; 5] {
    let mut out = [0u8; 5];
    for (i, p) in pulses.iter().enumerate() {
        if *p > DHT_ONE_THRESHOLD {
            out[i / 8] |= 0x80 >> (i % 8);
        }
    }
    out
}

/// Decode a DHT11 frame into `(temperature_c, humidity_pct)` after verifying the checksum.
pub fn decode_dht11(frame: [u8; 5]) -> Result<(f32, f32)> {
    let sum = frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != frame[4] {
        return Err(HwError::DhtChecksum {
            expected: frame[4],
            actual: sum,
        });
    }
    let humidity = f32::from(frame[0]) + f32::from(frame[1]) / 10.0;
    let magnitude = f32::from(frame[2]) + f32::from(frame[3] & 0x7f) / 10.0;
    // Newer DHT11 revisions flag sub-zero readings in the top bit of the decimal byte.
    let temperature = if frame[3] & 0x80 != 0 {
        -magnitude
    } else {
        magnitude
    };
    Ok((temperature, humidity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_conversion_matches_round_trip_time() {
        // 1 ms round trip ~ 17.15 cm
        let cm = echo_to_cm(Duration::from_millis(1));
        assert!((cm - 17.15).abs() < 1e-3, "got {cm}");
        assert_eq!(echo_to_cm(Duration::ZERO), 0.0);
    }

    #[test]
    fn decodes_positive_frame() {
        // 45.0 %RH, 24.3 °C
        let frame = [45, 0, 24, 3, 72];
        let (t, h) = decode_dht11(frame).expect("valid frame");
        assert!((t - 24.3).abs() < 1e-4);
        assert!((h - 45.0).abs() < 1e-4);
    }

    #[test]
    fn decodes_negative_temperature_flag() {
        let frame = [30, 0, 2, 0x85, 30u8.wrapping_add(2).wrapping_add(0x85)];
        let (t, _) = decode_dht11(frame).expect("valid frame");
        assert!((t + 2.5).abs() < 1e-4, "got {t}");
    }

    #[test]
    fn rejects_bad_checksum() {
        let err = decode_dht11([45, 0, 24, 3, 0]).expect_err("checksum must fail");
        assert!(matches!(err, HwError::DhtChecksum { expected: 0, actual: 72 }));
    }

    #[test]
    fn pulses_pack_msb_first() {
        let mut pulses = [Duration::from_micros(26); 40];
        pulses[0] = Duration::from_micros(70);
        pulses[15] = Duration::from_micros(70);
        pulses[39] = Duration::from_micros(70);
        let bytes = dht_pulses_to_bytes(&pulses);
        assert_eq!(bytes, [0x80, 0x01, 0x00, 0x00, 0x01]);
    }
}

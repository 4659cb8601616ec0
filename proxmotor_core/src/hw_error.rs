//! Maps `Box<dyn Error>` from trait boundaries to typed `ControlError`.
//!
//! The traits in `proxmotor_traits` use `Box<dyn Error + Send + Sync>`; this
//! module converts those to our typed error enum, with an optional
//! feature-gated path for `proxmotor_hardware::HwError` downcasting.

use crate::error::ControlError;

/// Map a sensor-side trait-boundary error to a typed `ControlError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> ControlError {
    #[cfg(feature = "hardware-errors")]
    {
        use proxmotor_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::EchoTimeout | HwError::DhtTimeout | HwError::EdgeTimeout => {
                    ControlError::Timeout
                }
                other => ControlError::Hardware(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        ControlError::Timeout
    } else {
        ControlError::Hardware(s)
    }
}

/// Actuator failures are always fatal; keep the driver's message.
pub fn map_actuator_error(e: &(dyn std::error::Error + 'static)) -> ControlError {
    ControlError::Actuator(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Plain(&'static str);
    impl std::fmt::Display for Plain {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.0)
        }
    }
    impl std::error::Error for Plain {}

    #[test]
    fn timeout_text_maps_to_timeout() {
        assert!(matches!(
            map_hw_error(&Plain("read Timeout")),
            ControlError::Timeout
        ));
    }

    #[test]
    fn other_text_is_hardware() {
        match map_hw_error(&Plain("bus fault")) {
            ControlError::Hardware(s) => assert_eq!(s, "bus fault"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn typed_checksum_is_hardware() {
        let e = proxmotor_hardware::error::HwError::DhtChecksum {
            expected: 1,
            actual: 2,
        };
        assert!(matches!(map_hw_error(&e), ControlError::Hardware(_)));
        assert!(matches!(
            map_hw_error(&proxmotor_hardware::error::HwError::EchoTimeout),
            ControlError::Timeout
        ));
    }
}

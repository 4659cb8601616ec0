#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parsing and validation may reject the input but must never panic.
    if let Ok(cfg) = proxmotor_config::load_toml(data)
        && cfg.validate().is_ok()
    {
        assert!(cfg.filter.distance_window >= 1 && cfg.control.stop_tolerance >= 1);
        assert!(cfg.timing.distance_timeout_ms < cfg.timing.period_ms);
    }
});

//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod scripted_link;

use serial_plotter::PlotterConfig;
use std::time::{Duration, Instant};

/// Create a test timeout duration
pub fn test_timeout() -> Duration {
    Duration::from_secs(2)
}

/// Config tuned for tests: no settling, short timeouts, 3-sample windows
pub fn fast_config() -> PlotterConfig {
    let mut config = PlotterConfig::default();
    config.serial.port = "scripted".to_string();
    config.serial.read_timeout_ms = 10;
    config.serial.settle_delay_ms = 0;
    config.capture.history_length = 3;
    config.session.startup_poll_ms = 2;
    config.session.startup_timeout_ms = 2000;
    config
}

/// Poll `condition` until it holds or the test timeout expires
pub fn wait_until<F: FnMut() -> bool>(mut condition: F) -> bool {
    let deadline = Instant::now() + test_timeout();
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    condition()
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

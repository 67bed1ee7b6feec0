use std::time::Duration;

use atleta_tracker::config::Config;

// Only test in this binary: it mutates the process environment.
#[test]
fn zero_producer_intervals_are_clamped() {
    std::env::set_var("TICK_INTERVAL_MS", "0");
    std::env::set_var("HEART_RATE_INTERVAL_MS", "0");

    let config = Config::from_env();
    assert_eq!(config.tracking.tick_interval, Duration::from_millis(1));
    assert_eq!(config.tracking.heart_rate_interval, Duration::from_millis(1));

    std::env::set_var("TICK_INTERVAL_MS", "250");
    assert_eq!(
        Config::from_env().tracking.tick_interval,
        Duration::from_millis(250)
    );
}

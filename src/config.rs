use std::path::PathBuf;
use std::time::Duration;

use crate::pipeline::filter::FilterConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub max_file_size: usize,
    pub session_ttl: Duration,
    pub snapshot_dir: Option<PathBuf>,
    pub tracking: TrackingConfig,
}

/// Knobs of the live tracking engine.
#[derive(Debug, Clone)]
pub struct TrackingConfig {
    pub filter: FilterConfig,
    /// Ticks without a usable fix before the displayed speed starts decaying.
    pub speed_stale_after_seconds: u64,
    pub tick_interval: Duration,
    pub heart_rate_interval: Duration,
    /// Longest recorded track, first to last timestamp, that replay accepts.
    pub replay_max_span: Duration,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            filter: FilterConfig::default(),
            speed_stale_after_seconds: 5,
            tick_interval: Duration::from_secs(1),
            heart_rate_interval: Duration::from_secs(2),
            replay_max_span: Duration::from_secs(48 * 3600),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let port = env_or("PORT", 3000);
        let max_file_size_mb: usize = env_or("MAX_FILE_SIZE_MB", 25);
        let session_ttl_seconds = env_or("SESSION_TTL_SECONDS", 3600);
        let snapshot_dir = std::env::var("SNAPSHOT_DIR")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let defaults = FilterConfig::default();
        let filter = FilterConfig {
            max_accuracy_m: env_or("FIX_MAX_ACCURACY_M", defaults.max_accuracy_m),
            min_step_km: env_or("FIX_MIN_STEP_M", defaults.min_step_km * 1000.0) / 1000.0,
            max_speed_ms: env_or("FIX_MAX_SPEED_MS", defaults.max_speed_ms),
            ..defaults
        };

        let tracking = TrackingConfig {
            filter,
            speed_stale_after_seconds: env_or("SPEED_STALE_SECONDS", 5),
            // A zero period would panic the producer's interval.
            tick_interval: Duration::from_millis(env_or("TICK_INTERVAL_MS", 1000u64).max(1)),
            heart_rate_interval: Duration::from_millis(
                env_or("HEART_RATE_INTERVAL_MS", 2000u64).max(1),
            ),
            replay_max_span: Duration::from_secs(env_or("REPLAY_MAX_SPAN_HOURS", 48u64) * 3600),
        };

        Self {
            port,
            max_file_size: max_file_size_mb * 1024 * 1024,
            session_ttl: Duration::from_secs(session_ttl_seconds),
            snapshot_dir,
            tracking,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

use std::{env, path::PathBuf, time::Duration};

// Runtime/server constants (not gameplay tuning).

pub fn http_port() -> u16 {
    env::var("WAVE_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3001)
}

/// Level file to load at startup; the built-in demo level is used when unset.
pub fn level_path() -> Option<PathBuf> {
    env::var("LEVEL_PATH")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

pub fn tick_rate_hz() -> u32 {
    env::var("TICK_RATE_HZ")
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or(DEFAULT_TICK_RATE_HZ)
        .clamp(MIN_TICK_RATE_HZ, MAX_TICK_RATE_HZ)
}

pub fn tick_interval() -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(tick_rate_hz()))
}

pub const INPUT_CHANNEL_CAPACITY: usize = 1024;
pub const WORLD_BROADCAST_CAPACITY: usize = 128;

const DEFAULT_TICK_RATE_HZ: u32 = 60;
const MIN_TICK_RATE_HZ: u32 = 10;
const MAX_TICK_RATE_HZ: u32 = 240;

//! Time utilities for the match clock and frame pacing

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Match time is tracked in milliseconds
pub const TIME_SECOND_MS: u64 = 1_000;

/// Frame rate the host loop drives `KothMatch::tick` at
pub const FRAME_TPS: u32 = 30;
pub const FRAME_DURATION_MICROS: u64 = 1_000_000 / FRAME_TPS as u64;

/// Interval between scoring passes
pub const SCORE_TICK_MS: u64 = TIME_SECOND_MS;

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Real-time length of one frame
pub fn frame_duration() -> Duration {
    Duration::from_micros(FRAME_DURATION_MICROS)
}

/// Match-time milliseconds covered by one frame at the given time scale
pub fn frame_game_millis(time_scale: f32) -> u64 {
    let scale = if time_scale.is_finite() && time_scale > 0.0 {
        time_scale
    } else {
        1.0
    };
    ((FRAME_DURATION_MICROS as f32 / 1_000.0) * scale).round().max(1.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_millis_scales_with_time_scale() {
        assert_eq!(frame_game_millis(1.0), 33);
        assert_eq!(frame_game_millis(10.0), 333);
    }

    #[test]
    fn frame_millis_rejects_bad_scale() {
        assert_eq!(frame_game_millis(0.0), frame_game_millis(1.0));
        assert_eq!(frame_game_millis(f32::NAN), frame_game_millis(1.0));
        assert_eq!(frame_game_millis(-3.0), frame_game_millis(1.0));
    }
}

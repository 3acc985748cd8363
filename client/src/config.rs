//! Protocol timings the client runs with.

use shared::{
    AUTO_SUBMIT_DELAY_MS, COUNTDOWN_TICK_MS, KEEPALIVE_INTERVAL_MS, NEAR_EXPIRY_SECS,
    RESOLUTION_PHASE_SECS,
};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// How often a liveness ping is sent while connected.
    pub keepalive_interval: Duration,
    /// How often countdowns and deferred submissions are advanced.
    pub tick_interval: Duration,
    /// Pause between completing an incantation and submitting it.
    pub auto_submit_delay: Duration,
    /// Resolution length used when a snapshot carries no remaining-time hint.
    /// Has to match the server's own constant.
    pub resolution_secs: f64,
    pub near_expiry: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            keepalive_interval: Duration::from_millis(KEEPALIVE_INTERVAL_MS),
            tick_interval: Duration::from_millis(COUNTDOWN_TICK_MS),
            auto_submit_delay: Duration::from_millis(AUTO_SUBMIT_DELAY_MS),
            resolution_secs: RESOLUTION_PHASE_SECS,
            near_expiry: Duration::from_secs_f64(NEAR_EXPIRY_SECS),
        }
    }
}

impl ClientConfig {
    pub fn with_resolution_secs(mut self, secs: f64) -> Self {
        self.resolution_secs = secs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timings() {
        let config = ClientConfig::default();
        assert_eq!(config.keepalive_interval, Duration::from_secs(30));
        assert_eq!(config.tick_interval, Duration::from_millis(100));
        assert_eq!(config.near_expiry, Duration::from_secs(5));
        assert_eq!(config.with_resolution_secs(8.0).resolution_secs, 8.0);
    }
}

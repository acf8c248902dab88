//! Ambient configuration for the demo binary only. `Calibration` values
//! (§4.4) are NOT environment-configurable — they are fixed, versioned Rust
//! constants; this module covers logging and lookback knobs exclusively.

use std::env;

/// Environment configuration for the `classify` demo binary.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub log_level: String,
    pub lookback_days_1m: u32,
    pub lookback_days_5m: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            lookback_days_1m: 1,
            lookback_days_5m: 10,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            log_level: env::var("REGIME_ENGINE_LOG_LEVEL").unwrap_or(defaults.log_level),
            lookback_days_1m: env::var("REGIME_ENGINE_LOOKBACK_DAYS_1M")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.lookback_days_1m),
            lookback_days_5m: env::var("REGIME_ENGINE_LOOKBACK_DAYS_5M")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.lookback_days_5m),
        }
    }
}

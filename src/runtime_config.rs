//! # Runtime Configuration Module
//!
//! Environment variable-based configuration for the event stream server.
//!
//! ## Environment Variables
//!
//! | Variable                  | Default  | Meaning                                      |
//! |---------------------------|----------|----------------------------------------------|
//! | `EVENTDRIP_PORT`          | `9000`   | Listening port                               |
//! | `EVENTDRIP_DEFAULT_COUNT` | `100`    | Event count when the path does not parse     |
//! | `EVENTDRIP_TICK_MS`       | `1000`   | Delay between emitted lines in milliseconds  |
//! | `EVENTDRIP_STACK_SIZE`    | `0x4000` | Coroutine stack size (decimal or `0x` hex)   |
//!
//! Unset or unparsable values fall back to the default; a bad value is never
//! fatal. The config is loaded once at startup and passed into the service
//! rather than read from ambient state per request.
//!
//! ## Usage
//!
//! ```rust
//! use eventdrip::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("tick interval: {:?}", config.tick);
//! ```

use std::env;
use std::time::Duration;

/// Runtime configuration loaded from environment variables.
///
/// Load this at startup using [`RuntimeConfig::from_env()`].
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Port the server listens on (default: 9000)
    pub port: u16,
    /// Event count used when the request path has no parsable count (default: 100)
    pub default_count: u64,
    /// Delay between emitted event lines (default: 1 second)
    pub tick: Duration,
    /// Stack size for coroutines in bytes (default: 16 KB / 0x4000)
    pub stack_size: usize,
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let port = env::var("EVENTDRIP_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(9000);
        let default_count = env::var("EVENTDRIP_DEFAULT_COUNT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(100);
        let tick_ms = env::var("EVENTDRIP_TICK_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1000);
        let stack_size = match env::var("EVENTDRIP_STACK_SIZE") {
            Ok(val) => {
                if let Some(hex) = val.strip_prefix("0x") {
                    usize::from_str_radix(hex, 16).unwrap_or(0x4000)
                } else {
                    val.parse().unwrap_or(0x4000)
                }
            }
            Err(_) => 0x4000,
        };
        RuntimeConfig {
            port,
            default_count,
            tick: Duration::from_millis(tick_ms),
            stack_size,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            port: 9000,
            default_count: 100,
            tick: Duration::from_secs(1),
            stack_size: 0x4000,
        }
    }
}

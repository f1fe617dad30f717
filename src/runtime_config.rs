//! # Runtime Configuration Module
//!
//! Environment variable-based configuration for the dispatcher runtime.
//!
//! ## Environment Variables
//!
//! ### `WIRESHAPE_STACK_SIZE`
//!
//! Stack size for handler coroutines, in decimal (`16384`) or hex (`0x4000`).
//! Default: `0x4000` (16 KB). Total memory is stack size times concurrent
//! handlers; too small a stack panics on deep handler call chains.
//!
//! ### `WIRESHAPE_VALIDATE_OUTPUT`
//!
//! Whether handler output is checked against the route's declared output
//! shape before it is serialized (`1`/`true`/`on` or `0`/`false`/`off`).
//! Default: on. An output mismatch is a programming error in the handler and
//! surfaces as a 500; turning the check off trades that guarantee for a
//! little latency.

use std::env;

/// Runtime configuration loaded from environment variables.
///
/// Load once at startup with [`RuntimeConfig::from_env()`].
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Stack size for handler coroutines in bytes (default: 16 KB / 0x4000).
    pub stack_size: usize,
    /// Check handler output against the declared output shape (default: true).
    pub validate_output: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: 0x4000,
            validate_output: true,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults on missing or unparsable values.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let stack_size = match env::var("WIRESHAPE_STACK_SIZE") {
            Ok(val) => {
                if let Some(hex) = val.strip_prefix("0x") {
                    usize::from_str_radix(hex, 16).unwrap_or(defaults.stack_size)
                } else {
                    val.parse().unwrap_or(defaults.stack_size)
                }
            }
            Err(_) => defaults.stack_size,
        };

        let validate_output = match env::var("WIRESHAPE_VALIDATE_OUTPUT") {
            Ok(val) => !matches!(val.to_ascii_lowercase().as_str(), "0" | "false" | "off"),
            Err(_) => defaults.validate_output,
        };

        RuntimeConfig {
            stack_size,
            validate_output,
        }
    }
}

//! Monitor Configuration Module
//!
//! Broker connection and display settings loaded from TOML files.
//!
//! ## Loading Order
//!
//! 1. `WEATHER_MONITOR_CONFIG` environment variable (path to TOML file)
//! 2. `weather_monitor.toml` in the current working directory
//! 3. Built-in defaults (see [`defaults`])
//!
//! The loaded config is passed explicitly to the components that need it;
//! there is no global instance.

mod monitor_config;
pub mod defaults;
pub mod validation;

pub use monitor_config::*;

//! # Core Runtime Module
//!
//! Foundational runtime infrastructure shared by the other core crates:
//! - Logging and tracing setup
//! - Configuration (defaults, TOML file, environment overrides)
//!
//! ## Overview
//!
//! Nothing in here performs network or tag I/O. The resolution core receives
//! a [`config::CoreConfig`] by reference and never reaches for globals.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder};
pub use error::{Error, Result};
pub use logging::{LogFormat, LogLevel, LoggingConfig};

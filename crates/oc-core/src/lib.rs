//! Core types for the oxidized-cafe frontend
//!
//! This crate provides the error taxonomy, configuration, and logging
//! infrastructure shared by the platform driver.

pub mod config;
pub mod error;
pub mod logging;

pub use config::Config;
pub use error::{FrontendError, RelaunchError, Result};

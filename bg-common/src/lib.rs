//! # Brand Guardian Common Library
//!
//! Shared code for the Brand Guardian services:
//! - Common error and result types
//! - TOML bootstrap configuration and config file discovery
//! - Setting resolution helpers (environment → TOML)

pub mod config;
pub mod error;

pub use error::{Error, Result};

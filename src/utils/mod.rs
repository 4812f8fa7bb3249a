//! Configuration utilities.

/// Environment-based configuration and validation.
pub mod config;
/// Access tokens for Google APIs.
pub mod credentials;

pub use config::{Config, ConfigError};
pub use credentials::{StaticToken, TokenSource};

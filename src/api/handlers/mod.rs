//! API request handlers.
//!
//! This module contains all HTTP request handlers organized by functionality.

/// Agent listing and direct agent runs.
pub mod agents;
/// Intent-routed chat.
pub mod chat;
/// Liveness.
pub mod health;
/// Session inspection.
pub mod sessions;

use crate::types::{AppError, Result};

/// Reject blank messages before any agent runs.
pub(crate) fn require_message(message: &str) -> Result<&str> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput("message must not be empty".to_string()));
    }
    Ok(trimmed)
}

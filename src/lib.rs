//! Telegram bot that re-uploads videos, including whole albums, as native
//! video replies.

/// Telegram glue
pub mod bot;
/// Messaging client interface
pub mod client;
/// Settings and constants
pub mod config;
/// Log setup with secret redaction
pub mod logging;
/// Media model and classification
pub mod media;
/// Aggregation and relay pipeline
pub mod relay;

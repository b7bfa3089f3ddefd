//! # Error Types
//!
//! This module defines error types used throughout the meme-canvas library.

use thiserror::Error;

/// Main error type for compositor operations
#[derive(Debug, Error)]
pub enum CanvasError {
    /// Image bytes could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Template bytes could not be fetched (network or filesystem)
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Frame could not be encoded to JPEG/PNG
    #[error("Encode error: {0}")]
    Encode(String),

    /// Font data could not be parsed
    #[error("Font error: {0}")]
    Font(String),

    /// Template reference does not resolve to anything
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    /// Composition document or option is invalid
    #[error("Config error: {0}")]
    Config(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

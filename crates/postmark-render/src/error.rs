//! Render errors.

use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Surface error: {0}")]
    Surface(String),
    #[error("Failed to encode image: {0}")]
    Encode(String),
    #[error("Font error: {0}")]
    Font(String),
    #[error("Invalid data URL: {0}")]
    DataUrl(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

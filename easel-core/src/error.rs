//! Error types for canvas operations.

use thiserror::Error;

/// Result type for canvas operations.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Errors that can occur while validating or mutating canvas state.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// Canvas dimensions outside the allowed range.
    #[error("Invalid canvas dimensions: {0}")]
    InvalidDimensions(String),

    /// Element coordinates are negative or not finite.
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    /// Unknown element type tag.
    #[error("Invalid element type: {0}")]
    InvalidElementType(String),

    /// Text content missing or empty after trimming.
    #[error("Invalid text: {0}")]
    InvalidText(String),

    /// Font size outside the allowed range.
    #[error("Invalid font size: {0}")]
    InvalidFontSize(String),

    /// Image element without exactly one source.
    #[error("Invalid image source: {0}")]
    InvalidImageSource(String),

    /// Drawing path too short or containing non-finite points.
    #[error("Invalid drawing path: {0}")]
    InvalidPath(String),

    /// Element cap for a single canvas reached.
    #[error("Too many elements (max {0})")]
    TooManyElements(usize),

    /// Element not found in canvas.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Session not found in store.
    #[error("Canvas session not found: {0}")]
    SessionNotFound(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

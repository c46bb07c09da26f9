//! Rendering error types.

use thiserror::Error;

/// Result type for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while rendering or exporting a canvas.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The requested rendering engine cannot run in this environment.
    #[error("rendering engine unavailable: {0}")]
    Unavailable(String),

    /// The headless browser failed to launch, navigate, or screenshot.
    #[error("browser rendering failed: {0}")]
    Browser(String),

    /// SVG parsing or rasterization failed in the native pipeline.
    #[error("rasterization failed: {0}")]
    Raster(String),

    /// PDF document assembly failed.
    #[error("PDF generation failed: {0}")]
    Pdf(String),

    /// Output encoding (PNG) failed.
    #[error("encoding failed: {0}")]
    Encode(String),

    /// The canvas state handed to the export layer is unusable.
    #[error("invalid canvas data: {0}")]
    InvalidCanvasData(String),

    /// A rendering attempt exceeded the configured deadline.
    #[error("rendering timed out after {0}s")]
    Timeout(u64),

    /// A background rendering task panicked or was cancelled.
    #[error("rendering task failed: {0}")]
    Internal(String),
}

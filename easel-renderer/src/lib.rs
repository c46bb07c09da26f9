//! # Easel Renderer
//!
//! Deterministic rendering of canvas state to PNG, SVG, and PDF.
//!
//! Three tiers implement the same [`Renderer`] contract:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                   ExportPipeline                     │
//! ├──────────────────┬──────────────────┬────────────────┤
//! │ BrowserRenderer  │ NativeRenderer   │ VectorRenderer │
//! │ headless Chrome  │ usvg/resvg/      │ pure-string    │
//! │ HTML snapshot    │ tiny-skia        │ SVG, never     │
//! │                  │                  │ fails          │
//! └──────────────────┴──────────────────┴────────────────┘
//!           ▲ fallback cascade, left to right ▲
//! ```
//!
//! Remote images are resolved up front by [`image::ImageFetcher`] so
//! renderers stay free of network I/O and every tier sees the same
//! pixels.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod browser;
pub mod error;
pub mod export;
pub mod html;
pub mod image;
pub mod pdf;
pub mod raster;
pub mod svg;

pub use browser::BrowserRenderer;
pub use error::{RenderError, RenderResult};
pub use export::{ExportConfig, ExportPipeline, PixelBackend};
pub use image::{AcquireError, AcquiredImage, ImageFetcher, ImageMap, ImageResolution};
pub use pdf::PdfOptions;
pub use raster::NativeRenderer;
pub use svg::VectorRenderer;

use easel_core::CanvasState;

/// Format of a produced image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Raster PNG bytes.
    Png,
    /// SVG document bytes (the vector fallback tier).
    Svg,
}

impl OutputFormat {
    /// MIME type for HTTP responses.
    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Svg => "image/svg+xml",
        }
    }

    /// File extension for download filenames.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }
}

/// Bytes produced by a renderer plus their actual format.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
    /// What the bytes actually are; fallback can downgrade PNG to SVG.
    pub format: OutputFormat,
}

impl RenderOutput {
    /// Whether the output carries the SVG fallback signature.
    #[must_use]
    pub fn is_svg(&self) -> bool {
        self.format == OutputFormat::Svg || self.bytes.starts_with(b"<svg")
    }
}

/// A rendering tier.
///
/// Implementations are synchronous; the export pipeline moves them to
/// the blocking pool and applies the render deadline.
pub trait Renderer {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether this tier can run in the current environment. A false
    /// here is an ordinary fallback trigger, not an error.
    fn is_available(&self) -> bool;

    /// Render the canvas using pre-resolved images.
    ///
    /// # Errors
    ///
    /// Returns a [`RenderError`] describing the failed stage; the
    /// caller decides whether to fall back.
    fn render(&self, state: &CanvasState, images: &ImageMap) -> RenderResult<RenderOutput>;
}

//! Export orchestration.
//!
//! Resolves images once, then walks the renderer tiers: a pixel tier
//! (browser snapshot by default, native rasterizer as the alternate)
//! with a hard render deadline, and the vector tier as the universal
//! safety net. Only total failure of the vector tier propagates to the
//! caller.

use std::sync::Arc;
use std::time::Duration;

use easel_core::{canvas::check_dimensions, CanvasState};

use crate::browser::BrowserRenderer;
use crate::image::{ImageFetcher, ImageMap};
use crate::pdf::{self, PdfOptions};
use crate::raster::NativeRenderer;
use crate::svg::VectorRenderer;
use crate::{RenderError, RenderOutput, RenderResult, Renderer};

/// Which pixel renderer an export should try before falling back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelBackend {
    /// Headless browser screenshot.
    Browser,
    /// CPU rasterization via the SVG pipeline.
    Native,
}

/// Export pipeline configuration.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Whether the headless browser tier may launch.
    pub browser_enabled: bool,
    /// Deadline for a single pixel-tier render attempt.
    pub render_timeout: Duration,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            browser_enabled: true,
            render_timeout: Duration::from_secs(30),
        }
    }
}

/// Orchestrates image acquisition and the renderer fallback cascade.
#[derive(Clone)]
pub struct ExportPipeline {
    fetcher: ImageFetcher,
    browser: Arc<BrowserRenderer>,
    native: Arc<NativeRenderer>,
    vector: VectorRenderer,
    render_timeout: Duration,
}

impl Default for ExportPipeline {
    fn default() -> Self {
        Self::new(ExportConfig::default())
    }
}

impl ExportPipeline {
    /// Create a pipeline with its renderer tiers.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        Self {
            fetcher: ImageFetcher::new(),
            browser: Arc::new(BrowserRenderer::new(config.browser_enabled)),
            native: Arc::new(NativeRenderer::new()),
            vector: VectorRenderer::new(),
            render_timeout: config.render_timeout,
        }
    }

    /// Release long-lived renderer resources (the browser process).
    pub fn shutdown(&self) {
        self.browser.shutdown();
    }

    /// Export the canvas as an image, preferring the browser tier.
    ///
    /// The returned output is PNG when a pixel tier succeeded and SVG
    /// when the vector fallback was used; callers must inspect
    /// [`RenderOutput::format`].
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidCanvasData`] for out-of-range
    /// dimensions, or an error only if the vector tier itself failed.
    pub async fn export_png(&self, state: &CanvasState) -> RenderResult<RenderOutput> {
        self.export_png_with(state, PixelBackend::Browser).await
    }

    /// Export the canvas as an image with an explicit pixel tier.
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::export_png`].
    pub async fn export_png_with(
        &self,
        state: &CanvasState,
        backend: PixelBackend,
    ) -> RenderResult<RenderOutput> {
        check_dimensions(state.width, state.height)
            .map_err(|e| RenderError::InvalidCanvasData(e.to_string()))?;

        let images = self.fetcher.resolve_all(state).await;

        match self.try_pixel_tier(state, &images, backend).await {
            Ok(output) => Ok(output),
            Err(error) => {
                tracing::warn!(%error, backend = ?backend, "pixel tier failed, using vector fallback");
                self.vector.render(state, &images)
            }
        }
    }

    /// Export the canvas as a single-page PDF.
    ///
    /// A raster snapshot is embedded when a pixel tier produced one;
    /// SVG fallback output (or any raster failure) switches to the
    /// direct-vector PDF builder.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidCanvasData`] for out-of-range
    /// dimensions, or [`RenderError::Pdf`] if document assembly fails.
    pub async fn export_pdf(
        &self,
        state: &CanvasState,
        options: PdfOptions,
    ) -> RenderResult<Vec<u8>> {
        check_dimensions(state.width, state.height)
            .map_err(|e| RenderError::InvalidCanvasData(e.to_string()))?;

        tracing::debug!(compress = options.compress, "pdf export requested");
        let images = self.fetcher.resolve_all(state).await;

        match self.try_pixel_tier(state, &images, PixelBackend::Browser).await {
            Ok(output) if !output.is_svg() => match pdf::embed_raster(state, &output.bytes) {
                Ok(bytes) => Ok(bytes),
                Err(error) => {
                    tracing::warn!(%error, "raster embed failed, building vector PDF");
                    pdf::render_direct(state, &images)
                }
            },
            Ok(_) => pdf::render_direct(state, &images),
            Err(error) => {
                tracing::warn!(%error, "pixel tier failed, building vector PDF");
                pdf::render_direct(state, &images)
            }
        }
    }

    /// Run one pixel renderer on the blocking pool under the deadline.
    async fn try_pixel_tier(
        &self,
        state: &CanvasState,
        images: &ImageMap,
        backend: PixelBackend,
    ) -> RenderResult<RenderOutput> {
        let renderer: Arc<dyn Renderer + Send + Sync> = match backend {
            PixelBackend::Browser => self.browser.clone(),
            PixelBackend::Native => self.native.clone(),
        };

        if !renderer.is_available() {
            return Err(RenderError::Unavailable(format!(
                "{} renderer unavailable",
                renderer.name()
            )));
        }

        let state = state.clone();
        let images = images.clone();
        let task =
            tokio::task::spawn_blocking(move || renderer.render(&state, &images));

        match tokio::time::timeout(self.render_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(RenderError::Internal(join_error.to_string())),
            Err(_) => Err(RenderError::Timeout(self.render_timeout.as_secs())),
        }
    }
}

//! Native rasterization tier.
//!
//! Renders the canvas without a browser by generating a full-fidelity
//! SVG (embedded images, painted erasers) and rasterizing it through
//! the resvg/tiny-skia pipeline.

use std::sync::Arc;

use easel_core::CanvasState;

use crate::image::ImageMap;
use crate::svg::{render_svg, SvgFidelity};
use crate::{OutputFormat, RenderError, RenderOutput, RenderResult, Renderer};

/// CPU rasterizer backed by resvg.
#[derive(Clone)]
pub struct NativeRenderer {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl Default for NativeRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeRenderer {
    /// Create the rasterizer and index system fonts once.
    #[must_use]
    pub fn new() -> Self {
        let mut fontdb = usvg::fontdb::Database::new();
        fontdb.load_system_fonts();
        if fontdb.is_empty() {
            tracing::warn!("no system fonts found, text will not rasterize");
        } else {
            tracing::debug!(fonts = fontdb.len(), "system fonts indexed");
        }
        Self {
            fontdb: Arc::new(fontdb),
        }
    }

    /// The SVG document fed to the rasterizer.
    fn document(state: &CanvasState, images: &ImageMap) -> String {
        render_svg(state, images, SvgFidelity::Raster)
    }

    fn rasterize(&self, svg: &str) -> RenderResult<Vec<u8>> {
        let mut opt = usvg::Options::default();
        opt.fontdb = self.fontdb.clone();
        let tree = usvg::Tree::from_str(svg, &opt)
            .map_err(|e| RenderError::Raster(format!("SVG parsing failed: {e}")))?;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (px_w, px_h) = (tree.size().width() as u32, tree.size().height() as u32);

        let mut pixmap = tiny_skia::Pixmap::new(px_w.max(1), px_h.max(1))
            .ok_or_else(|| RenderError::Raster("failed to create pixmap".to_string()))?;

        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        pixmap
            .encode_png()
            .map_err(|e| RenderError::Encode(format!("PNG encoding failed: {e}")))
    }
}

impl Renderer for NativeRenderer {
    fn name(&self) -> &'static str {
        "native"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn render(&self, state: &CanvasState, images: &ImageMap) -> RenderResult<RenderOutput> {
        let svg = Self::document(state, images);
        let bytes = self.rasterize(&svg)?;
        Ok(RenderOutput {
            bytes,
            format: OutputFormat::Png,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use easel_core::{DrawTool, Element, ElementId, ElementKind, Point};

    const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47];

    fn canvas() -> CanvasState {
        CanvasState::new(200, 150, "#336699").expect("canvas")
    }

    #[test]
    fn test_render_produces_png() {
        let renderer = NativeRenderer::new();
        let output = renderer
            .render(&canvas(), &ImageMap::new())
            .expect("render");
        assert_eq!(output.format, OutputFormat::Png);
        assert!(output.bytes.starts_with(PNG_MAGIC));
    }

    #[test]
    fn test_background_pixel_color() {
        let renderer = NativeRenderer::new();
        let output = renderer
            .render(&canvas(), &ImageMap::new())
            .expect("render");
        let decoded = image::load_from_memory(&output.bytes).expect("decode");
        let pixel = decoded.to_rgba8().get_pixel(10, 10).0;
        assert_eq!(&pixel[..3], &[0x33, 0x66, 0x99]);
    }

    #[test]
    fn test_rect_painted_over_background() {
        let mut state = canvas();
        state
            .add_element(Element {
                id: ElementId::new(),
                kind: ElementKind::Rectangle {
                    width: 50.0,
                    height: 50.0,
                    fill_color: "#ff0000".to_string(),
                    stroke_color: None,
                    stroke_width: 0.0,
                },
                x: 0.0,
                y: 0.0,
                z_index: 0,
                created_at: 0,
                last_modified: None,
            })
            .expect("add");

        let renderer = NativeRenderer::new();
        let output = renderer.render(&state, &ImageMap::new()).expect("render");
        let decoded = image::load_from_memory(&output.bytes).expect("decode");
        let rgba = decoded.to_rgba8();
        assert_eq!(&rgba.get_pixel(10, 10).0[..3], &[0xff, 0x00, 0x00]);
        assert_eq!(&rgba.get_pixel(100, 100).0[..3], &[0x33, 0x66, 0x99]);
    }

    #[test]
    fn test_eraser_restores_background() {
        let mut state = canvas();
        // A stroke, then an eraser retracing it exactly.
        let path = vec![Point::new(20.0, 20.0), Point::new(80.0, 20.0)];
        state
            .add_element(Element {
                id: ElementId::new(),
                kind: ElementKind::Drawing {
                    path: path.clone(),
                    color: "#000000".to_string(),
                    brush_size: 6.0,
                    tool: DrawTool::Draw,
                },
                x: 0.0,
                y: 0.0,
                z_index: 0,
                created_at: 0,
                last_modified: None,
            })
            .expect("add");
        state
            .add_element(Element {
                id: ElementId::new(),
                kind: ElementKind::Drawing {
                    path,
                    color: "#000000".to_string(),
                    brush_size: 6.0,
                    tool: DrawTool::Eraser,
                },
                x: 0.0,
                y: 0.0,
                z_index: 1,
                created_at: 0,
                last_modified: None,
            })
            .expect("add");

        let renderer = NativeRenderer::new();
        let output = renderer.render(&state, &ImageMap::new()).expect("render");
        let decoded = image::load_from_memory(&output.bytes).expect("decode");
        // The eraser is twice the brush width, so the stroke midline is
        // repainted in the background color.
        let pixel = decoded.to_rgba8().get_pixel(50, 20).0;
        assert_eq!(&pixel[..3], &[0x33, 0x66, 0x99]);
    }
}

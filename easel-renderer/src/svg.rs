//! SVG document generation.
//!
//! One generator serves two tiers. [`SvgFidelity::Raster`] is the input
//! to the native rasterizer: resolved images are embedded as data URIs
//! and eraser strokes are repainted in the background color. This file
//! also hosts [`VectorRenderer`], the last-resort tier that must never
//! fail: it draws gray placeholders instead of images and omits eraser
//! strokes entirely, since pure vector output has no pixels to erase.

use std::fmt::Write;

use easel_core::{CanvasState, DrawTool, Element, ElementKind, FontWeight, Point};

use crate::image::{ImageMap, ImageResolution};
use crate::{OutputFormat, RenderOutput, RenderResult, Renderer};

/// Fallback for non-positive or non-finite sizes.
const FALLBACK_SIZE: f64 = 100.0;
/// Fallback radius for degenerate circles.
const FALLBACK_RADIUS: f64 = 50.0;
/// Fallback brush size for degenerate strokes.
const FALLBACK_BRUSH: f64 = 3.0;

/// How faithfully the generated SVG represents the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SvgFidelity {
    /// Full fidelity for rasterization: embedded images, painted erasers.
    Raster,
    /// Pure vector output: image placeholders, erasers omitted.
    Vector,
}

/// Generate the SVG document for a canvas at the requested fidelity.
#[must_use]
pub fn render_svg(state: &CanvasState, images: &ImageMap, fidelity: SvgFidelity) -> String {
    let width = f64::from(state.width.max(1));
    let height = f64::from(state.height.max(1));

    let mut svg = format!(
        "<svg width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\" \
         xmlns=\"http://www.w3.org/2000/svg\">\n\
         <rect width=\"100%\" height=\"100%\" fill=\"{bg}\"/>\n",
        bg = escape_xml(&state.background_color),
    );

    for element in state.paint_order() {
        element_svg(&mut svg, element, state, images, fidelity);
    }

    svg.push_str("</svg>\n");
    svg
}

fn element_svg(
    svg: &mut String,
    element: &Element,
    state: &CanvasState,
    images: &ImageMap,
    fidelity: SvgFidelity,
) {
    let x = safe_coord(element.x);
    let y = safe_coord(element.y);

    match &element.kind {
        ElementKind::Rectangle {
            width,
            height,
            fill_color,
            stroke_color,
            stroke_width,
        } => {
            let _ = writeln!(
                svg,
                "<rect x=\"{x}\" y=\"{y}\" width=\"{w}\" height=\"{h}\" fill=\"{fill}\"{stroke}/>",
                w = safe_size(*width, FALLBACK_SIZE),
                h = safe_size(*height, FALLBACK_SIZE),
                fill = escape_xml(fill_color),
                stroke = stroke_attrs(stroke_color.as_deref(), *stroke_width),
            );
        }

        ElementKind::Circle {
            radius,
            fill_color,
            stroke_color,
            stroke_width,
        } => {
            let _ = writeln!(
                svg,
                "<circle cx=\"{x}\" cy=\"{y}\" r=\"{r}\" fill=\"{fill}\"{stroke}/>",
                r = safe_size(*radius, FALLBACK_RADIUS),
                fill = escape_xml(fill_color),
                stroke = stroke_attrs(stroke_color.as_deref(), *stroke_width),
            );
        }

        ElementKind::Text {
            text,
            font_size,
            font_family,
            color,
            font_weight,
        } => {
            let weight = match font_weight {
                FontWeight::Bold => " font-weight=\"bold\"",
                FontWeight::Normal => "",
            };
            // Text anchors at its top-left; SVG positions the baseline.
            let _ = writeln!(
                svg,
                "<text x=\"{x}\" y=\"{baseline}\" fill=\"{color}\" font-size=\"{font_size}\" \
                 font-family=\"{family}\"{weight}>{content}</text>",
                baseline = y + f64::from(*font_size),
                color = escape_xml(color),
                family = escape_xml(font_family),
                content = escape_xml(text),
            );
        }

        ElementKind::Image { width, height, .. } => {
            let w = safe_size(*width, FALLBACK_SIZE);
            let h = safe_size(*height, FALLBACK_SIZE);
            match fidelity {
                SvgFidelity::Raster => match images.get(&element.id) {
                    Some(ImageResolution::Resolved(acquired)) => {
                        let _ = writeln!(
                            svg,
                            "<image x=\"{x}\" y=\"{y}\" width=\"{w}\" height=\"{h}\" \
                             preserveAspectRatio=\"none\" href=\"{href}\"/>",
                            href = escape_xml(&acquired.data_uri),
                        );
                    }
                    _ => image_error_svg(svg, x, y, w, h),
                },
                SvgFidelity::Vector => image_placeholder_svg(svg, x, y, w, h),
            }
        }

        ElementKind::Drawing {
            path,
            color,
            brush_size,
            tool,
        } => {
            if *tool == DrawTool::Eraser && fidelity == SvgFidelity::Vector {
                return;
            }
            let brush = safe_size(*brush_size, FALLBACK_BRUSH);
            let Some(stroke) = easel_core::path::encode(path, brush) else {
                return;
            };
            let (stroke_color, stroke_width) = match tool {
                DrawTool::Eraser => (state.background_color.as_str(), brush * 2.0),
                DrawTool::Draw => (color.as_str(), brush),
            };
            let _ = writeln!(
                svg,
                "<path d=\"{data}\" stroke=\"{color}\" stroke-width=\"{stroke_width}\" \
                 fill=\"none\" stroke-linecap=\"round\" stroke-linejoin=\"round\"/>",
                data = stroke.to_svg_data(Point::new(0.0, 0.0)),
                color = escape_xml(stroke_color),
            );
        }
    }
}

/// Gray box with an "Image" label, used where the vector tier cannot
/// embed pixels.
fn image_placeholder_svg(svg: &mut String, x: f64, y: f64, w: f64, h: f64) {
    let _ = writeln!(
        svg,
        "<rect x=\"{x}\" y=\"{y}\" width=\"{w}\" height=\"{h}\" \
         fill=\"#f5f5f5\" stroke=\"#cccccc\" stroke-width=\"1\"/>\n\
         <text x=\"{cx}\" y=\"{cy}\" fill=\"#666666\" font-size=\"12\" font-family=\"Arial\" \
         text-anchor=\"middle\">Image</text>",
        cx = x + w / 2.0,
        cy = y + h / 2.0,
    );
}

/// Dashed red box marking a failed image load.
fn image_error_svg(svg: &mut String, x: f64, y: f64, w: f64, h: f64) {
    let _ = writeln!(
        svg,
        "<rect x=\"{x}\" y=\"{y}\" width=\"{w}\" height=\"{h}\" \
         fill=\"none\" stroke=\"#ff0000\" stroke-width=\"2\" stroke-dasharray=\"5,5\"/>\n\
         <text x=\"{cx}\" y=\"{cy}\" fill=\"#ff0000\" font-size=\"12\" font-family=\"Arial\" \
         text-anchor=\"middle\">Image Load Error</text>",
        cx = x + w / 2.0,
        cy = y + h / 2.0,
    );
}

fn stroke_attrs(stroke_color: Option<&str>, stroke_width: f64) -> String {
    match stroke_color {
        Some(color) if stroke_width > 0.0 => format!(
            " stroke=\"{}\" stroke-width=\"{stroke_width}\"",
            escape_xml(color)
        ),
        _ => String::new(),
    }
}

fn safe_size(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}

fn safe_coord(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Escape text for SVG/XML content and attribute values.
#[must_use]
pub fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// The vector fallback tier.
///
/// Always available and infallible by construction: every element kind
/// has a pure-SVG representation or an explicit omission rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct VectorRenderer;

impl VectorRenderer {
    /// Create the vector renderer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for VectorRenderer {
    fn name(&self) -> &'static str {
        "vector"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn render(&self, state: &CanvasState, images: &ImageMap) -> RenderResult<RenderOutput> {
        let svg = render_svg(state, images, SvgFidelity::Vector);
        Ok(RenderOutput {
            bytes: svg.into_bytes(),
            format: OutputFormat::Svg,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use easel_core::{Element, ElementId, ImageSource};

    fn canvas() -> CanvasState {
        CanvasState::new(800, 600, "#ffffff").expect("canvas")
    }

    fn place(kind: ElementKind, x: f64, y: f64, z_index: i64) -> Element {
        Element {
            id: ElementId::new(),
            kind,
            x,
            y,
            z_index,
            created_at: 0,
            last_modified: None,
        }
    }

    #[test]
    fn test_empty_canvas_has_background() {
        let svg = render_svg(&canvas(), &ImageMap::new(), SvgFidelity::Vector);
        assert!(svg.starts_with("<svg width=\"800\" height=\"600\""));
        assert!(svg.contains("fill=\"#ffffff\""));
    }

    #[test]
    fn test_red_rectangle_attributes() {
        let mut state = canvas();
        state
            .add_element(place(
                ElementKind::Rectangle {
                    width: 200.0,
                    height: 100.0,
                    fill_color: "#ff0000".to_string(),
                    stroke_color: None,
                    stroke_width: 0.0,
                },
                50.0,
                50.0,
                0,
            ))
            .expect("add");

        let svg = render_svg(&state, &ImageMap::new(), SvgFidelity::Vector);
        // Background rect plus exactly one element rect.
        assert_eq!(svg.matches("<rect").count(), 2);
        assert!(svg
            .contains("<rect x=\"50\" y=\"50\" width=\"200\" height=\"100\" fill=\"#ff0000\"/>"));
    }

    #[test]
    fn test_circle_renders_center_based() {
        let mut state = canvas();
        state
            .add_element(place(
                ElementKind::Circle {
                    radius: 30.0,
                    fill_color: "#00ff00".to_string(),
                    stroke_color: Some("#000000".to_string()),
                    stroke_width: 2.0,
                },
                100.0,
                150.0,
                0,
            ))
            .expect("add");

        let svg = render_svg(&state, &ImageMap::new(), SvgFidelity::Vector);
        assert!(svg.contains("cx=\"100\" cy=\"150\" r=\"30\""));
        assert!(svg.contains("stroke=\"#000000\" stroke-width=\"2\""));
    }

    #[test]
    fn test_vector_tier_skips_erasers() {
        let mut state = canvas();
        state
            .add_element(place(
                ElementKind::Drawing {
                    path: vec![Point::new(0.0, 0.0), Point::new(50.0, 50.0)],
                    color: "#ff00ff".to_string(),
                    brush_size: 4.0,
                    tool: DrawTool::Eraser,
                },
                0.0,
                0.0,
                0,
            ))
            .expect("add");

        let svg = render_svg(&state, &ImageMap::new(), SvgFidelity::Vector);
        assert!(!svg.contains("<path"));
    }

    #[test]
    fn test_raster_fidelity_paints_erasers() {
        let mut state = canvas();
        state
            .add_element(place(
                ElementKind::Drawing {
                    path: vec![Point::new(0.0, 0.0), Point::new(50.0, 50.0)],
                    color: "#ff00ff".to_string(),
                    brush_size: 4.0,
                    tool: DrawTool::Eraser,
                },
                0.0,
                0.0,
                0,
            ))
            .expect("add");

        let svg = render_svg(&state, &ImageMap::new(), SvgFidelity::Raster);
        assert!(svg.contains("stroke=\"#ffffff\" stroke-width=\"8\""));
    }

    #[test]
    fn test_vector_tier_uses_image_placeholder() {
        let mut state = canvas();
        state
            .add_element(place(
                ElementKind::Image {
                    width: 120.0,
                    height: 90.0,
                    source: ImageSource::Url {
                        image_url: "https://example.com/a.png".to_string(),
                    },
                },
                10.0,
                20.0,
                0,
            ))
            .expect("add");

        let svg = render_svg(&state, &ImageMap::new(), SvgFidelity::Vector);
        assert!(svg.contains("fill=\"#f5f5f5\""));
        assert!(svg.contains(">Image</text>"));
    }

    #[test]
    fn test_raster_fidelity_embeds_resolved_images() {
        use crate::image::{AcquiredImage, ImageResolution};

        let mut state = canvas();
        let element = place(
            ElementKind::Image {
                width: 50.0,
                height: 50.0,
                source: ImageSource::Data {
                    image_data: "data:image/png;base64,AAAA".to_string(),
                },
            },
            0.0,
            0.0,
            0,
        );
        let id = element.id;
        state.add_element(element).expect("add");

        let mut images = ImageMap::new();
        images.insert(
            id,
            ImageResolution::Resolved(AcquiredImage {
                bytes: vec![0u8; 4],
                mime: "image/png".to_string(),
                data_uri: "data:image/png;base64,AAAA".to_string(),
            }),
        );

        let svg = render_svg(&state, &images, SvgFidelity::Raster);
        assert!(svg.contains("href=\"data:image/png;base64,AAAA\""));
    }

    #[test]
    fn test_degenerate_sizes_are_coerced() {
        let mut state = canvas();
        state
            .add_element(place(
                ElementKind::Rectangle {
                    width: -5.0,
                    height: f64::NAN,
                    fill_color: "#333333".to_string(),
                    stroke_color: None,
                    stroke_width: 0.0,
                },
                f64::INFINITY,
                10.0,
                0,
            ))
            .expect("add");

        let svg = render_svg(&state, &ImageMap::new(), SvgFidelity::Vector);
        assert!(svg.contains("x=\"0\" y=\"10\" width=\"100\" height=\"100\""));
    }

    #[test]
    fn test_text_content_escaped() {
        let mut state = canvas();
        state
            .add_element(place(
                ElementKind::Text {
                    text: "a < b & c".to_string(),
                    font_size: 20,
                    font_family: "Arial".to_string(),
                    color: "#000000".to_string(),
                    font_weight: FontWeight::Bold,
                },
                10.0,
                10.0,
                0,
            ))
            .expect("add");

        let svg = render_svg(&state, &ImageMap::new(), SvgFidelity::Vector);
        assert!(svg.contains("a &lt; b &amp; c"));
        assert!(svg.contains("y=\"30\""));
        assert!(svg.contains("font-weight=\"bold\""));
    }

    #[test]
    fn test_vector_renderer_reports_svg() {
        let renderer = VectorRenderer::new();
        assert!(renderer.is_available());
        let output = renderer
            .render(&canvas(), &ImageMap::new())
            .expect("render");
        assert_eq!(output.format, OutputFormat::Svg);
        assert!(output.bytes.starts_with(b"<svg"));
    }
}

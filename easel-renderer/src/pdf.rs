//! PDF document assembly.
//!
//! Two strategies share this module. [`embed_raster`] wraps an already
//! rendered PNG in a single-page PDF at exact canvas size, preserving
//! whatever the pixel tier drew. [`render_direct`] rebuilds the canvas
//! from vector operators (rectangles, circles, flattened strokes, text
//! in builtin fonts) and is used when no pixel output is available.
//!
//! Canvas pixels map 1:1 to PDF points; the y axis is flipped because
//! PDF origins sit at the bottom-left.

use printpdf::path::{PaintMode, WindingOrder};
use printpdf::utils::{calculate_points_for_circle, calculate_points_for_rect};
use printpdf::{
    BuiltinFont, Color, ImageTransform, IndirectFontRef, Line, LineDashPattern, Mm,
    PdfDocumentReference, PdfLayerReference, Polygon, Pt, Rgb,
};

use easel_core::{CanvasState, DrawTool, Element, ElementKind, FontWeight};

use crate::image::{ImageMap, ImageResolution};
use crate::{RenderError, RenderResult};

/// PDF generation options.
#[derive(Debug, Clone, Copy)]
pub struct PdfOptions {
    /// Whether content streams should be compressed. Accepted for wire
    /// compatibility; the PDF writer always compresses streams.
    pub compress: bool,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self { compress: true }
    }
}

/// Steps used when flattening quadratic stroke segments into PDF line
/// operators.
const STROKE_FLATTEN_STEPS: u32 = 16;

/// Wrap a rendered PNG in a single-page PDF at canvas size.
///
/// # Errors
///
/// Returns [`RenderError::Pdf`] if the PNG cannot be decoded or the
/// document cannot be serialized.
pub fn embed_raster(state: &CanvasState, png: &[u8]) -> RenderResult<Vec<u8>> {
    let (doc, page, layer) = new_document(state);
    let current_layer = doc.get_page(page).get_layer(layer);

    // Decode with the PDF writer's bundled image crate to avoid version
    // mismatches between image types.
    let dynamic_image = printpdf::image_crate::load_from_memory(png)
        .map_err(|e| RenderError::Pdf(format!("failed to decode PNG for PDF: {e}")))?;
    let pdf_image = printpdf::Image::from_dynamic_image(&dynamic_image);

    // At 72 dpi the image's natural size in points equals its pixel
    // size, which matches the page exactly.
    pdf_image.add_to_layer(
        current_layer,
        ImageTransform {
            translate_x: Some(Mm(0.0)),
            translate_y: Some(Mm(0.0)),
            dpi: Some(72.0),
            ..Default::default()
        },
    );

    save(doc)
}

/// Rebuild the canvas from native PDF vector operators.
///
/// Resolved images are embedded at their target rectangles; failed ones
/// get the dashed red placeholder. Eraser strokes are omitted, as in
/// the vector tier.
///
/// # Errors
///
/// Returns [`RenderError::Pdf`] if document serialization fails.
pub fn render_direct(state: &CanvasState, images: &ImageMap) -> RenderResult<Vec<u8>> {
    let (doc, page, layer) = new_document(state);
    let current_layer = doc.get_page(page).get_layer(layer);
    let height = f64::from(state.height);

    // Background fill over the whole page.
    if let Some(bg) = parse_hex_color(&state.background_color) {
        fill_rect(
            &current_layer,
            0.0,
            0.0,
            f64::from(state.width),
            height,
            height,
            bg,
            None,
            0.0,
        );
    }

    for element in state.paint_order() {
        element_ops(&doc, &current_layer, element, height, images)?;
    }

    save(doc)
}

fn new_document(
    state: &CanvasState,
) -> (
    PdfDocumentReference,
    printpdf::PdfPageIndex,
    printpdf::PdfLayerIndex,
) {
    printpdf::PdfDocument::new(
        "Canvas Export",
        px_to_mm(f64::from(state.width)),
        px_to_mm(f64::from(state.height)),
        "Layer 1",
    )
}

fn save(doc: PdfDocumentReference) -> RenderResult<Vec<u8>> {
    doc.save_to_bytes()
        .map_err(|e| RenderError::Pdf(format!("PDF save failed: {e}")))
}

fn element_ops(
    doc: &PdfDocumentReference,
    layer: &PdfLayerReference,
    element: &Element,
    height: f64,
    images: &ImageMap,
) -> RenderResult<()> {
    match &element.kind {
        ElementKind::Rectangle {
            width,
            height: h,
            fill_color,
            stroke_color,
            stroke_width,
        } => {
            let fill = parse_hex_color(fill_color).unwrap_or((0.0, 0.0, 0.0));
            let stroke = stroke_color.as_deref().and_then(parse_hex_color);
            fill_rect(
                layer,
                element.x,
                element.y,
                *width,
                *h,
                height,
                fill,
                stroke,
                *stroke_width,
            );
        }

        ElementKind::Circle {
            radius,
            fill_color,
            stroke_color,
            stroke_width,
        } => {
            let fill = parse_hex_color(fill_color).unwrap_or((0.0, 0.0, 0.0));
            let stroke = stroke_color.as_deref().and_then(parse_hex_color);
            let points = calculate_points_for_circle(
                pt(*radius),
                pt(element.x),
                pt(height - element.y),
            );
            paint_shape(layer, points, true, Some(fill), stroke, *stroke_width);
        }

        ElementKind::Text {
            text,
            font_size,
            font_family,
            color,
            font_weight,
        } => {
            let font = doc
                .add_builtin_font(builtin_font(font_family, *font_weight))
                .map_err(|e| RenderError::Pdf(format!("font load failed: {e}")))?;
            draw_text(
                layer,
                &font,
                text,
                f64::from(*font_size),
                element.x,
                height - element.y - f64::from(*font_size),
                parse_hex_color(color).unwrap_or((0.0, 0.0, 0.0)),
            );
        }

        ElementKind::Image {
            width,
            height: h, ..
        } => {
            let embedded = match images.get(&element.id) {
                Some(ImageResolution::Resolved(acquired)) => {
                    embed_image(layer, &acquired.bytes, element.x, element.y, *width, *h, height)
                }
                _ => false,
            };
            if !embedded {
                image_error_box(layer, element.x, element.y, *width, *h, height);
            }
        }

        ElementKind::Drawing {
            path,
            color,
            brush_size,
            tool,
        } => {
            // No pixels to repaint in a vector document.
            if *tool == DrawTool::Eraser {
                return Ok(());
            }
            if let Some(stroke) = easel_core::path::encode(path, *brush_size) {
                let rgb = parse_hex_color(color).unwrap_or((0.0, 0.0, 0.0));
                let points: Vec<(printpdf::Point, bool)> = stroke
                    .flatten(STROKE_FLATTEN_STEPS)
                    .iter()
                    .map(|p| (pdf_point(p.x, height - p.y), false))
                    .collect();
                layer.set_line_cap_style(printpdf::LineCapStyle::Round);
                paint_shape(layer, points, false, None, Some(rgb), *brush_size);
            }
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn fill_rect(
    layer: &PdfLayerReference,
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    canvas_height: f64,
    fill: (f32, f32, f32),
    stroke: Option<(f32, f32, f32)>,
    stroke_width: f64,
) {
    // Rect points are computed around the rect's center.
    let points = calculate_points_for_rect(
        pt(w),
        pt(h),
        pt(x + w / 2.0),
        pt(canvas_height - y - h / 2.0),
    );
    paint_shape(layer, points, true, Some(fill), stroke, stroke_width);
}

#[allow(clippy::cast_possible_truncation)]
fn paint_shape(
    layer: &PdfLayerReference,
    points: Vec<(printpdf::Point, bool)>,
    closed: bool,
    fill: Option<(f32, f32, f32)>,
    stroke: Option<(f32, f32, f32)>,
    stroke_width: f64,
) {
    if let Some((r, g, b)) = fill {
        layer.set_fill_color(Color::Rgb(Rgb::new(r, g, b, None)));
    }
    let has_stroke = match stroke {
        Some((r, g, b)) if stroke_width > 0.0 => {
            layer.set_outline_color(Color::Rgb(Rgb::new(r, g, b, None)));
            layer.set_outline_thickness(stroke_width as f32);
            true
        }
        _ => false,
    };

    if fill.is_some() {
        let mode = if has_stroke {
            PaintMode::FillStroke
        } else {
            PaintMode::Fill
        };
        layer.add_polygon(Polygon {
            rings: vec![points],
            mode,
            winding_order: WindingOrder::NonZero,
        });
    } else {
        layer.add_line(Line {
            points,
            is_closed: closed,
        });
    }
}

fn draw_text(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    text: &str,
    size: f64,
    x: f64,
    baseline_y: f64,
    color: (f32, f32, f32),
) {
    let (r, g, b) = color;
    layer.set_fill_color(Color::Rgb(Rgb::new(r, g, b, None)));
    #[allow(clippy::cast_possible_truncation)]
    layer.use_text(text, size as f32, px_to_mm(x), px_to_mm(baseline_y), font);
}

/// Embed decoded image bytes at the target rectangle. Returns false if
/// the bytes do not decode (the caller draws a placeholder instead).
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn embed_image(
    layer: &PdfLayerReference,
    bytes: &[u8],
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    canvas_height: f64,
) -> bool {
    let Ok(dynamic_image) = printpdf::image_crate::load_from_memory(bytes) else {
        return false;
    };

    use printpdf::image_crate::GenericImageView;
    let (px_w, px_h) = dynamic_image.dimensions();
    if px_w == 0 || px_h == 0 {
        return false;
    }

    let pdf_image = printpdf::Image::from_dynamic_image(&dynamic_image);
    // At 72 dpi a pixel is a point, so scaling is target over natural.
    pdf_image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(px_to_mm(x)),
            translate_y: Some(px_to_mm(canvas_height - y - h)),
            scale_x: Some(w as f32 / px_w as f32),
            scale_y: Some(h as f32 / px_h as f32),
            dpi: Some(72.0),
            ..Default::default()
        },
    );
    true
}

/// Dashed red outline marking a failed image load.
fn image_error_box(layer: &PdfLayerReference, x: f64, y: f64, w: f64, h: f64, canvas_height: f64) {
    layer.set_line_dash_pattern(LineDashPattern {
        dash_1: Some(5),
        ..Default::default()
    });
    let points = calculate_points_for_rect(
        pt(w),
        pt(h),
        pt(x + w / 2.0),
        pt(canvas_height - y - h / 2.0),
    );
    paint_shape(layer, points, true, None, Some((1.0, 0.0, 0.0)), 2.0);
    layer.set_line_dash_pattern(LineDashPattern::default());
}

/// Map a requested font family onto the closest builtin PDF font.
fn builtin_font(family: &str, weight: FontWeight) -> BuiltinFont {
    let family = family.to_ascii_lowercase();
    let bold = weight == FontWeight::Bold;
    if family.contains("times") || (family.contains("serif") && !family.contains("sans")) {
        if bold {
            BuiltinFont::TimesBold
        } else {
            BuiltinFont::TimesRoman
        }
    } else if family.contains("courier") || family.contains("mono") {
        if bold {
            BuiltinFont::CourierBold
        } else {
            BuiltinFont::Courier
        }
    } else if bold {
        BuiltinFont::HelveticaBold
    } else {
        BuiltinFont::Helvetica
    }
}

/// Parse `#rgb` or `#rrggbb` into normalized RGB components.
fn parse_hex_color(value: &str) -> Option<(f32, f32, f32)> {
    let hex = value.trim().strip_prefix('#')?;
    let (r, g, b) = match hex.len() {
        3 => {
            let mut it = hex.chars();
            let parse = |c: char| c.to_digit(16).and_then(|d| u8::try_from(d * 17).ok());
            (
                parse(it.next()?)?,
                parse(it.next()?)?,
                parse(it.next()?)?,
            )
        }
        6 => (
            u8::from_str_radix(&hex[0..2], 16).ok()?,
            u8::from_str_radix(&hex[2..4], 16).ok()?,
            u8::from_str_radix(&hex[4..6], 16).ok()?,
        ),
        _ => return None,
    };
    Some((
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
    ))
}

#[allow(clippy::cast_possible_truncation)]
fn pt(px: f64) -> Pt {
    Pt(px as f32)
}

#[allow(clippy::cast_possible_truncation)]
fn px_to_mm(px: f64) -> Mm {
    Mm((px * 25.4 / 72.0) as f32)
}

fn pdf_point(x: f64, y: f64) -> printpdf::Point {
    printpdf::Point {
        x: pt(x),
        y: pt(y),
    }
}

//! HTML document assembly for the browser snapshot renderer.
//!
//! The canvas is laid out as absolutely positioned elements inside a
//! fixed-size container, then screenshotted by a headless browser. All
//! remote images must already be resolved to data URIs so the page
//! renders without network access.

use std::fmt::Write;

use easel_core::{CanvasState, DrawTool, Element, ElementKind, Point};

use crate::image::{ImageMap, ImageResolution};

/// Build the full standalone HTML document for a canvas.
#[must_use]
pub fn document(state: &CanvasState, images: &ImageMap) -> String {
    let mut body = String::new();
    for element in state.paint_order() {
        body.push_str(&element_markup(element, state, images));
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<style>\n\
         * {{ margin: 0; padding: 0; }}\n\
         body {{ width: {w}px; height: {h}px; overflow: hidden; }}\n\
         #canvas {{ position: relative; width: {w}px; height: {h}px; background-color: {bg}; }}\n\
         </style>\n</head>\n<body>\n<div id=\"canvas\">\n{body}</div>\n</body>\n</html>\n",
        w = state.width,
        h = state.height,
        bg = escape_html(&state.background_color),
    )
}

fn element_markup(element: &Element, state: &CanvasState, images: &ImageMap) -> String {
    match &element.kind {
        ElementKind::Rectangle {
            width,
            height,
            fill_color,
            stroke_color,
            stroke_width,
        } => {
            let border = stroke_color.as_deref().map_or(String::new(), |color| {
                format!(
                    "border: {stroke_width}px solid {}; box-sizing: border-box; ",
                    escape_html(color)
                )
            });
            format!(
                "<div style=\"position: absolute; left: {x}px; top: {y}px; \
                 width: {width}px; height: {height}px; background-color: {fill}; \
                 {border}z-index: {z};\"></div>\n",
                x = element.x,
                y = element.y,
                fill = escape_html(fill_color),
                z = element.z_index,
            )
        }

        ElementKind::Circle {
            radius,
            fill_color,
            stroke_color,
            stroke_width,
        } => {
            let border = stroke_color.as_deref().map_or(String::new(), |color| {
                format!(
                    "border: {stroke_width}px solid {}; box-sizing: border-box; ",
                    escape_html(color)
                )
            });
            // (x, y) is the center; CSS wants the top-left corner.
            format!(
                "<div style=\"position: absolute; left: {left}px; top: {top}px; \
                 width: {size}px; height: {size}px; border-radius: 50%; \
                 background-color: {fill}; {border}z-index: {z};\"></div>\n",
                left = element.x - radius,
                top = element.y - radius,
                size = radius * 2.0,
                fill = escape_html(fill_color),
                z = element.z_index,
            )
        }

        ElementKind::Text {
            text,
            font_size,
            font_family,
            color,
            font_weight,
        } => format!(
            "<div style=\"position: absolute; left: {x}px; top: {y}px; \
             color: {color}; font-size: {font_size}px; font-family: {family}; \
             font-weight: {weight}; white-space: pre-wrap; z-index: {z};\">{text}</div>\n",
            x = element.x,
            y = element.y,
            color = escape_html(color),
            family = escape_html(font_family),
            weight = weight_css(*font_weight),
            z = element.z_index,
            text = escape_html(text),
        ),

        ElementKind::Image { width, height, .. } => match images.get(&element.id) {
            Some(ImageResolution::Resolved(acquired)) => format!(
                "<img src=\"{src}\" style=\"position: absolute; left: {x}px; top: {y}px; \
                 width: {width}px; height: {height}px; object-fit: fill; z-index: {z};\">\n",
                src = escape_html(&acquired.data_uri),
                x = element.x,
                y = element.y,
                z = element.z_index,
            ),
            _ => image_placeholder(element, *width, *height),
        },

        ElementKind::Drawing {
            path,
            color,
            brush_size,
            tool,
        } => drawing_markup(element, state, path, color, *brush_size, *tool),
    }
}

/// Dashed red box shown where an image failed to load.
fn image_placeholder(element: &Element, width: f64, height: f64) -> String {
    format!(
        "<div style=\"position: absolute; left: {x}px; top: {y}px; \
         width: {width}px; height: {height}px; border: 2px dashed #ff0000; \
         box-sizing: border-box; color: #ff0000; font-size: 12px; font-family: Arial; \
         display: flex; align-items: center; justify-content: center; \
         z-index: {z};\">Image Load Error</div>\n",
        x = element.x,
        y = element.y,
        z = element.z_index,
    )
}

fn drawing_markup(
    element: &Element,
    state: &CanvasState,
    path: &[Point],
    color: &str,
    brush_size: f64,
    tool: DrawTool,
) -> String {
    let Some(stroke) = easel_core::path::encode(path, brush_size) else {
        return String::new();
    };
    let bounds = stroke.bounds;
    let data = stroke.to_svg_data(Point::new(bounds.min_x, bounds.min_y));

    // Erasers repaint in the background color at twice the brush size.
    let (stroke_color, stroke_width) = match tool {
        DrawTool::Eraser => (state.background_color.as_str(), brush_size * 2.0),
        DrawTool::Draw => (color, brush_size),
    };

    let mut markup = String::new();
    let _ = write!(
        markup,
        "<svg style=\"position: absolute; left: {left}px; top: {top}px; \
         pointer-events: none; z-index: {z};\" width=\"{width}\" height=\"{height}\" \
         viewBox=\"0 0 {width} {height}\">\
         <path d=\"{data}\" stroke=\"{color}\" stroke-width=\"{stroke_width}\" \
         fill=\"none\" stroke-linecap=\"round\" stroke-linejoin=\"round\"/></svg>\n",
        left = bounds.min_x,
        top = bounds.min_y,
        width = bounds.width(),
        height = bounds.height(),
        z = element.z_index,
        color = escape_html(stroke_color),
    );
    markup
}

fn weight_css(weight: easel_core::FontWeight) -> &'static str {
    match weight {
        easel_core::FontWeight::Bold => "bold",
        easel_core::FontWeight::Normal => "normal",
    }
}

/// Escape text for use in HTML content and attribute values.
#[must_use]
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

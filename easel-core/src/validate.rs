//! Element validation and sanitation.
//!
//! Raw element-creation requests arrive as untyped JSON. This module
//! coerces numeric-looking strings, rejects non-finite geometry, applies
//! canonical defaults, and produces a fully-typed [`Element`]. It is a
//! pure function: the caller appends the result to a session.

use serde_json::Value;

use crate::canvas::now_ms;
use crate::element::{DrawTool, Element, ElementKind, FontWeight, ImageSource, Point};
use crate::{CanvasError, CanvasResult, ElementId};

/// Default fill/stroke/text color.
pub const DEFAULT_COLOR: &str = "#000000";
/// Default font size in pixels.
pub const DEFAULT_FONT_SIZE: u32 = 16;
/// Minimum font size in pixels.
pub const MIN_FONT_SIZE: u32 = 8;
/// Maximum font size in pixels.
pub const MAX_FONT_SIZE: u32 = 200;
/// Default font family.
pub const DEFAULT_FONT_FAMILY: &str = "Arial";
/// Default brush size in pixels.
pub const DEFAULT_BRUSH_SIZE: f64 = 3.0;

/// Validate a raw element-creation request.
///
/// Assigns a fresh [`ElementId`] and `created_at` timestamp. `z_index`
/// defaults to `element_count` (append order) unless supplied.
///
/// # Errors
///
/// Returns the matching [`CanvasError`] variant for an unknown type tag,
/// missing/non-positive size fields, empty text, out-of-range font size,
/// an image without exactly one source, or a drawing path with fewer
/// than two finite points.
#[allow(clippy::cast_possible_truncation)]
pub fn element(raw: &Value, element_count: usize) -> CanvasResult<Element> {
    let type_tag = raw
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| CanvasError::InvalidElementType("missing type tag".to_string()))?;

    let (x, y) = coordinates(raw)?;
    let z_index = match raw.get("zIndex") {
        Some(value) => coerce_number(value)
            .map(|z| z.trunc() as i64)
            .ok_or_else(|| CanvasError::InvalidCoordinates("zIndex must be numeric".to_string()))?,
        // Append order is the default paint-order key.
        None => i64::try_from(element_count).unwrap_or(i64::MAX),
    };

    let kind = match type_tag {
        "rectangle" => rectangle(raw)?,
        "circle" => circle(raw)?,
        "text" => text(raw)?,
        "image" => image(raw)?,
        "drawing" => drawing(raw)?,
        other => return Err(CanvasError::InvalidElementType(other.to_string())),
    };

    Ok(Element {
        id: ElementId::new(),
        kind,
        x,
        y,
        z_index,
        created_at: now_ms(),
        last_modified: None,
    })
}

fn rectangle(raw: &Value) -> CanvasResult<ElementKind> {
    let width = positive_number(raw, "width")
        .ok_or_else(|| CanvasError::InvalidDimensions("rectangle width must be > 0".to_string()))?;
    let height = positive_number(raw, "height").ok_or_else(|| {
        CanvasError::InvalidDimensions("rectangle height must be > 0".to_string())
    })?;

    Ok(ElementKind::Rectangle {
        width,
        height,
        fill_color: string_or(raw, "fillColor", DEFAULT_COLOR),
        stroke_color: optional_string(raw, "strokeColor"),
        stroke_width: stroke_width(raw),
    })
}

fn circle(raw: &Value) -> CanvasResult<ElementKind> {
    let radius = positive_number(raw, "radius")
        .ok_or_else(|| CanvasError::InvalidDimensions("circle radius must be > 0".to_string()))?;

    Ok(ElementKind::Circle {
        radius,
        fill_color: string_or(raw, "fillColor", DEFAULT_COLOR),
        stroke_color: optional_string(raw, "strokeColor"),
        stroke_width: stroke_width(raw),
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn text(raw: &Value) -> CanvasResult<ElementKind> {
    let content = raw
        .get("text")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();
    if content.is_empty() {
        return Err(CanvasError::InvalidText(
            "text content is required".to_string(),
        ));
    }

    let font_size = match raw.get("fontSize") {
        Some(value) => coerce_number(value)
            .filter(|v| *v > 0.0)
            .map(|v| v.trunc() as u32)
            .ok_or_else(|| {
                CanvasError::InvalidFontSize("font size must be a positive number".to_string())
            })?,
        None => DEFAULT_FONT_SIZE,
    };
    if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&font_size) {
        return Err(CanvasError::InvalidFontSize(format!(
            "font size must be between {MIN_FONT_SIZE} and {MAX_FONT_SIZE}, got {font_size}"
        )));
    }

    let font_weight = match raw.get("fontWeight").and_then(Value::as_str) {
        Some("bold") => FontWeight::Bold,
        _ => FontWeight::Normal,
    };

    Ok(ElementKind::Text {
        text: content.to_string(),
        font_size,
        font_family: string_or(raw, "fontFamily", DEFAULT_FONT_FAMILY),
        color: string_or(raw, "color", DEFAULT_COLOR),
        font_weight,
    })
}

fn image(raw: &Value) -> CanvasResult<ElementKind> {
    let width = positive_number(raw, "width")
        .ok_or_else(|| CanvasError::InvalidDimensions("image width must be > 0".to_string()))?;
    let height = positive_number(raw, "height")
        .ok_or_else(|| CanvasError::InvalidDimensions("image height must be > 0".to_string()))?;

    let url = raw.get("imageUrl").and_then(Value::as_str);
    let data = raw.get("imageData").and_then(Value::as_str);
    let source = match (url, data) {
        (Some(image_url), None) => ImageSource::Url {
            image_url: image_url.to_string(),
        },
        (None, Some(image_data)) => ImageSource::Data {
            image_data: image_data.to_string(),
        },
        (Some(_), Some(_)) => {
            return Err(CanvasError::InvalidImageSource(
                "provide either imageUrl or imageData, not both".to_string(),
            ))
        }
        (None, None) => {
            return Err(CanvasError::InvalidImageSource(
                "imageUrl or imageData is required".to_string(),
            ))
        }
    };

    Ok(ElementKind::Image {
        width,
        height,
        source,
    })
}

fn drawing(raw: &Value) -> CanvasResult<ElementKind> {
    let points = raw
        .get("path")
        .and_then(Value::as_array)
        .ok_or_else(|| CanvasError::InvalidPath("path must be an array of points".to_string()))?;
    if points.len() < 2 {
        return Err(CanvasError::InvalidPath(
            "path needs at least two points".to_string(),
        ));
    }

    let mut path = Vec::with_capacity(points.len());
    for point in points {
        let px = point.get("x").and_then(coerce_number);
        let py = point.get("y").and_then(coerce_number);
        match (px, py) {
            (Some(x), Some(y)) => path.push(Point::new(x, y)),
            _ => {
                return Err(CanvasError::InvalidPath(
                    "path points must have finite numeric x and y".to_string(),
                ))
            }
        }
    }

    let brush_size = raw
        .get("brushSize")
        .and_then(coerce_number)
        .filter(|v| *v > 0.0)
        .unwrap_or(DEFAULT_BRUSH_SIZE);

    let tool = match raw.get("tool").and_then(Value::as_str) {
        Some("eraser") => DrawTool::Eraser,
        _ => DrawTool::Draw,
    };

    Ok(ElementKind::Drawing {
        path,
        color: string_or(raw, "color", DEFAULT_COLOR),
        brush_size,
        tool,
    })
}

/// Coerce a JSON value to a finite f64. Numeric-looking strings count;
/// NaN and infinities do not.
fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

fn coordinates(raw: &Value) -> CanvasResult<(f64, f64)> {
    let axis = |key: &str| -> CanvasResult<f64> {
        match raw.get(key) {
            None | Some(Value::Null) => Ok(0.0),
            Some(value) => coerce_number(value)
                .filter(|v| *v >= 0.0)
                .ok_or_else(|| {
                    CanvasError::InvalidCoordinates(format!(
                        "{key} must be a non-negative finite number"
                    ))
                }),
        }
    };
    Ok((axis("x")?, axis("y")?))
}

fn positive_number(raw: &Value, key: &str) -> Option<f64> {
    raw.get(key).and_then(coerce_number).filter(|v| *v > 0.0)
}

/// Stroke width defaults to 0 and never goes negative.
fn stroke_width(raw: &Value) -> f64 {
    raw.get("strokeWidth")
        .and_then(coerce_number)
        .map_or(0.0, |v| v.max(0.0))
}

fn string_or(raw: &Value, key: &str, default: &str) -> String {
    raw.get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

fn optional_string(raw: &Value, key: &str) -> Option<String> {
    raw.get(key).and_then(Value::as_str).map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rectangle_valid() {
        let raw = json!({
            "type": "rectangle",
            "x": 50, "y": 50,
            "width": 200, "height": 100,
            "fillColor": "#ff0000"
        });
        let element = element(&raw, 0).expect("validate");
        assert_eq!(element.z_index, 0);
        match element.kind {
            ElementKind::Rectangle {
                width, fill_color, ..
            } => {
                assert!((width - 200.0).abs() < f64::EPSILON);
                assert_eq!(fill_color, "#ff0000");
            }
            other => panic!("wrong kind: {other:?}"),
        }
    }

    #[test]
    fn test_numeric_string_coercion() {
        let raw = json!({
            "type": "circle",
            "x": "100", "y": "120.5",
            "radius": "40"
        });
        let element = element(&raw, 2).expect("validate");
        assert!((element.x - 100.0).abs() < f64::EPSILON);
        assert!((element.y - 120.5).abs() < f64::EPSILON);
        assert_eq!(element.z_index, 2);
    }

    #[test]
    fn test_non_finite_rejected() {
        let raw = json!({
            "type": "rectangle",
            "x": "NaN", "y": 0,
            "width": 10, "height": 10
        });
        assert!(matches!(
            element(&raw, 0),
            Err(CanvasError::InvalidCoordinates(_))
        ));
    }

    #[test]
    fn test_negative_coordinates_rejected() {
        let raw = json!({"type": "circle", "x": -5, "y": 0, "radius": 10});
        assert!(matches!(
            element(&raw, 0),
            Err(CanvasError::InvalidCoordinates(_))
        ));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let raw = json!({"type": "triangle", "x": 0, "y": 0});
        assert!(matches!(
            element(&raw, 0),
            Err(CanvasError::InvalidElementType(_))
        ));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let raw = json!({"type": "rectangle", "x": 0, "y": 0, "width": 0, "height": 10});
        assert!(matches!(
            element(&raw, 0),
            Err(CanvasError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn test_text_trimmed_and_defaults() {
        let raw = json!({"type": "text", "x": 10, "y": 10, "text": "  hello  "});
        let element = element(&raw, 0).expect("validate");
        match element.kind {
            ElementKind::Text {
                text,
                font_size,
                font_family,
                font_weight,
                ..
            } => {
                assert_eq!(text, "hello");
                assert_eq!(font_size, DEFAULT_FONT_SIZE);
                assert_eq!(font_family, DEFAULT_FONT_FAMILY);
                assert_eq!(font_weight, FontWeight::Normal);
            }
            other => panic!("wrong kind: {other:?}"),
        }
    }

    #[test]
    fn test_empty_text_rejected() {
        let raw = json!({"type": "text", "x": 0, "y": 0, "text": "   "});
        assert!(matches!(element(&raw, 0), Err(CanvasError::InvalidText(_))));
    }

    #[test]
    fn test_font_size_bounds() {
        let raw = json!({"type": "text", "x": 0, "y": 0, "text": "a", "fontSize": 7});
        assert!(matches!(
            element(&raw, 0),
            Err(CanvasError::InvalidFontSize(_))
        ));

        let raw = json!({"type": "text", "x": 0, "y": 0, "text": "a", "fontSize": 201});
        assert!(matches!(
            element(&raw, 0),
            Err(CanvasError::InvalidFontSize(_))
        ));

        let raw = json!({"type": "text", "x": 0, "y": 0, "text": "a", "fontSize": "24"});
        assert!(element(&raw, 0).is_ok());
    }

    #[test]
    fn test_image_requires_exactly_one_source() {
        let neither = json!({"type": "image", "x": 0, "y": 0, "width": 10, "height": 10});
        assert!(matches!(
            element(&neither, 0),
            Err(CanvasError::InvalidImageSource(_))
        ));

        let both = json!({
            "type": "image", "x": 0, "y": 0, "width": 10, "height": 10,
            "imageUrl": "https://example.com/a.png",
            "imageData": "data:image/png;base64,AAAA"
        });
        assert!(matches!(
            element(&both, 0),
            Err(CanvasError::InvalidImageSource(_))
        ));

        let url_only = json!({
            "type": "image", "x": 0, "y": 0, "width": 10, "height": 10,
            "imageUrl": "https://example.com/a.png"
        });
        assert!(element(&url_only, 0).is_ok());
    }

    #[test]
    fn test_drawing_path_checks() {
        let short = json!({"type": "drawing", "path": [{"x": 1, "y": 1}]});
        assert!(matches!(
            element(&short, 0),
            Err(CanvasError::InvalidPath(_))
        ));

        let bad_point = json!({
            "type": "drawing",
            "path": [{"x": 1, "y": 1}, {"x": "oops", "y": 2}]
        });
        assert!(matches!(
            element(&bad_point, 0),
            Err(CanvasError::InvalidPath(_))
        ));

        let ok = json!({
            "type": "drawing",
            "path": [{"x": 1, "y": 1}, {"x": 2, "y": 2}],
            "tool": "eraser"
        });
        let element = element(&ok, 0).expect("validate");
        match element.kind {
            ElementKind::Drawing {
                tool, brush_size, ..
            } => {
                assert_eq!(tool, DrawTool::Eraser);
                assert!((brush_size - DEFAULT_BRUSH_SIZE).abs() < f64::EPSILON);
            }
            other => panic!("wrong kind: {other:?}"),
        }
    }

    #[test]
    fn test_explicit_z_index_kept() {
        let raw = json!({"type": "circle", "x": 0, "y": 0, "radius": 5, "zIndex": 42});
        let element = element(&raw, 7).expect("validate");
        assert_eq!(element.z_index, 42);
    }

    #[test]
    fn test_revalidation_is_idempotent() {
        let raw = json!({
            "type": "rectangle",
            "x": "10", "y": 20,
            "width": 30, "height": "40.5",
            "fillColor": "#abcdef",
            "strokeColor": "#123456",
            "strokeWidth": 2
        });
        let first = element(&raw, 3).expect("validate");
        let reserialized = serde_json::to_value(&first).expect("serialize");
        let second = element(&reserialized, 9).expect("revalidate");

        // Same fields apart from id/timestamps; zIndex survives because
        // the serialized form carries it explicitly.
        assert!((second.x - first.x).abs() < f64::EPSILON);
        assert_eq!(second.z_index, first.z_index);
        assert_eq!(
            serde_json::to_value(&second.kind).expect("kind"),
            serde_json::to_value(&first.kind).expect("kind")
        );
    }
}

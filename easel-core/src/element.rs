//! Canvas elements - the drawable primitives placed on a canvas.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(Uuid);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ElementId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A single point captured from a freehand stroke.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate in canvas space.
    pub x: f64,
    /// Y coordinate in canvas space.
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Which tool produced a drawing stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawTool {
    /// Normal pigment stroke.
    Draw,
    /// Eraser stroke. Raster renderers repaint it in the background
    /// color at twice the brush size; the vector tier skips it.
    Eraser,
}

/// Font weight for text elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    /// Regular weight.
    Normal,
    /// Bold weight.
    Bold,
}

/// Where an image element's pixels come from.
///
/// Validation guarantees exactly one source, so the "both or neither"
/// states are unrepresentable after an element is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageSource {
    /// Remote image fetched over HTTP(S).
    Url {
        /// Absolute http/https URL.
        #[serde(rename = "imageUrl")]
        image_url: String,
    },
    /// Inline image embedded as a base64 data URI.
    Data {
        /// `data:<mime>;base64,<payload>` string.
        #[serde(rename = "imageData")]
        image_data: String,
    },
}

impl ImageSource {
    /// Remote URL, if this source is a URL.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Url { image_url } => Some(image_url),
            Self::Data { .. } => None,
        }
    }

    /// Inline data URI, if this source is embedded data.
    #[must_use]
    pub fn data_uri(&self) -> Option<&str> {
        match self {
            Self::Data { image_data } => Some(image_data),
            Self::Url { .. } => None,
        }
    }
}

/// The typed content of an element.
///
/// Every renderer matches this exhaustively so the compiler flags any
/// renderer missing a case when a new kind is added.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    /// Axis-aligned filled rectangle with `(x, y)` as its top-left corner.
    #[serde(rename_all = "camelCase")]
    Rectangle {
        /// Width in pixels (> 0).
        width: f64,
        /// Height in pixels (> 0).
        height: f64,
        /// Fill color as a CSS color string.
        fill_color: String,
        /// Optional stroke color.
        #[serde(skip_serializing_if = "Option::is_none")]
        stroke_color: Option<String>,
        /// Stroke width in pixels (>= 0).
        stroke_width: f64,
    },

    /// Circle with `(x, y)` as its **center** - the canonical model used
    /// by every renderer.
    #[serde(rename_all = "camelCase")]
    Circle {
        /// Radius in pixels (> 0).
        radius: f64,
        /// Fill color as a CSS color string.
        fill_color: String,
        /// Optional stroke color.
        #[serde(skip_serializing_if = "Option::is_none")]
        stroke_color: Option<String>,
        /// Stroke width in pixels (>= 0).
        stroke_width: f64,
    },

    /// A text label anchored at its top-left corner.
    #[serde(rename_all = "camelCase")]
    Text {
        /// Trimmed, non-empty text content.
        text: String,
        /// Font size in pixels, within [8, 200].
        font_size: u32,
        /// Font family name.
        font_family: String,
        /// Text color as a CSS color string.
        color: String,
        /// Font weight.
        font_weight: FontWeight,
    },

    /// A bitmap image scaled into a rectangle.
    #[serde(rename_all = "camelCase")]
    Image {
        /// Width in pixels (> 0).
        width: f64,
        /// Height in pixels (> 0).
        height: f64,
        /// The single image source (URL or inline data).
        #[serde(flatten)]
        source: ImageSource,
    },

    /// A freehand stroke captured as an ordered point sequence.
    #[serde(rename_all = "camelCase")]
    Drawing {
        /// Captured points, at least two.
        path: Vec<Point>,
        /// Stroke color as a CSS color string.
        color: String,
        /// Nominal brush size in pixels (> 0).
        brush_size: f64,
        /// Draw or eraser tool.
        tool: DrawTool,
    },
}

impl ElementKind {
    /// Lowercase type tag matching the wire format.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Rectangle { .. } => "rectangle",
            Self::Circle { .. } => "circle",
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
            Self::Drawing { .. } => "drawing",
        }
    }
}

/// A canvas element: typed content plus placement and paint order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// Unique identifier, immutable after creation.
    pub id: ElementId,
    /// Typed content.
    #[serde(flatten)]
    pub kind: ElementKind,
    /// X position (anchor or center depending on kind).
    pub x: f64,
    /// Y position.
    pub y: f64,
    /// Paint-order key. Defaults to the element count at insertion time.
    pub z_index: i64,
    /// Creation timestamp, Unix milliseconds. Immutable.
    pub created_at: u64,
    /// Last mutation timestamp, Unix milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<u64>,
}

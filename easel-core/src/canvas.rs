//! Canvas state - dimensions, background, and the ordered element list.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::{CanvasError, CanvasResult, Element, ElementId};

/// Minimum canvas edge length in pixels.
pub const MIN_DIMENSION: u32 = 100;
/// Maximum canvas edge length in pixels.
pub const MAX_DIMENSION: u32 = 4000;
/// Default canvas width in pixels.
pub const DEFAULT_WIDTH: u32 = 800;
/// Default canvas height in pixels.
pub const DEFAULT_HEIGHT: u32 = 600;
/// Default canvas background color.
pub const DEFAULT_BACKGROUND: &str = "#ffffff";
/// Maximum number of elements on a single canvas.
pub const MAX_ELEMENTS: usize = 1000;

/// The full state of one drawing session.
///
/// Elements keep insertion order; paint order is resolved at render time
/// by a stable sort on `z_index`, so insertion order remains the
/// tie-break for equal z values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasState {
    /// Canvas width in pixels, within [100, 4000].
    pub width: u32,
    /// Canvas height in pixels, within [100, 4000].
    pub height: u32,
    /// Background color as a CSS color string.
    pub background_color: String,
    /// Elements in insertion order.
    pub elements: Vec<Element>,
    /// Creation timestamp, Unix milliseconds.
    pub created_at: u64,
    /// Last mutation timestamp, Unix milliseconds.
    pub last_modified: u64,
}

impl CanvasState {
    /// Create a canvas with the given dimensions and background.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidDimensions`] if either dimension is
    /// outside [100, 4000]. Out-of-range values are rejected, never
    /// clamped.
    pub fn new(width: u32, height: u32, background_color: impl Into<String>) -> CanvasResult<Self> {
        check_dimensions(width, height)?;
        let now = now_ms();
        Ok(Self {
            width,
            height,
            background_color: background_color.into(),
            elements: Vec::new(),
            created_at: now,
            last_modified: now,
        })
    }

    /// Create a canvas with the default 800x600 white configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        let now = now_ms();
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            background_color: DEFAULT_BACKGROUND.to_string(),
            elements: Vec::new(),
            created_at: now,
            last_modified: now,
        }
    }

    /// Append an element.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::TooManyElements`] when the canvas already
    /// holds [`MAX_ELEMENTS`] elements.
    pub fn add_element(&mut self, element: Element) -> CanvasResult<ElementId> {
        if self.elements.len() >= MAX_ELEMENTS {
            return Err(CanvasError::TooManyElements(MAX_ELEMENTS));
        }
        let id = element.id;
        self.elements.push(element);
        self.touch();
        Ok(id)
    }

    /// Get an element by ID.
    #[must_use]
    pub fn get_element(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// Get a mutable reference to an element by ID.
    pub fn get_element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    /// Replace an element in place, keeping its position in the sequence.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ElementNotFound`] if no element has the ID.
    pub fn replace_element(&mut self, id: ElementId, element: Element) -> CanvasResult<()> {
        let slot = self
            .elements
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| CanvasError::ElementNotFound(id.to_string()))?;
        *slot = element;
        self.touch();
        Ok(())
    }

    /// Remove an element by ID.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ElementNotFound`] if no element has the ID.
    pub fn remove_element(&mut self, id: ElementId) -> CanvasResult<Element> {
        let index = self
            .elements
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| CanvasError::ElementNotFound(id.to_string()))?;
        let removed = self.elements.remove(index);
        self.touch();
        Ok(removed)
    }

    /// Remove all elements, keeping dimensions and background.
    pub fn clear(&mut self) {
        self.elements.clear();
        self.touch();
    }

    /// Elements in paint order: stable sort by `z_index` ascending, so
    /// insertion order breaks ties.
    #[must_use]
    pub fn paint_order(&self) -> Vec<&Element> {
        let mut ordered: Vec<&Element> = self.elements.iter().collect();
        ordered.sort_by_key(|e| e.z_index);
        ordered
    }

    /// Number of elements on the canvas.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Whether the canvas holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn touch(&mut self) {
        self.last_modified = now_ms();
    }
}

/// Validate canvas dimensions against the hard [100, 4000] bounds.
///
/// # Errors
///
/// Returns [`CanvasError::InvalidDimensions`] when out of range.
pub fn check_dimensions(width: u32, height: u32) -> CanvasResult<()> {
    let in_range = |v| (MIN_DIMENSION..=MAX_DIMENSION).contains(&v);
    if !in_range(width) || !in_range(height) {
        return Err(CanvasError::InvalidDimensions(format!(
            "dimensions must be between {MIN_DIMENSION} and {MAX_DIMENSION} pixels, got {width}x{height}"
        )));
    }
    Ok(())
}

/// Current Unix timestamp in milliseconds.
#[must_use]
pub fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| {
        // Will not exceed u64 range for millennia.
        #[allow(clippy::cast_possible_truncation)]
        {
            d.as_millis() as u64
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementKind;

    fn rect_element(z_index: i64) -> Element {
        Element {
            id: ElementId::new(),
            kind: ElementKind::Rectangle {
                width: 10.0,
                height: 10.0,
                fill_color: "#000000".to_string(),
                stroke_color: None,
                stroke_width: 0.0,
            },
            x: 0.0,
            y: 0.0,
            z_index,
            created_at: now_ms(),
            last_modified: None,
        }
    }

    #[test]
    fn test_dimension_bounds() {
        assert!(CanvasState::new(100, 100, "#fff").is_ok());
        assert!(CanvasState::new(4000, 4000, "#fff").is_ok());
        assert!(matches!(
            CanvasState::new(50, 600, "#fff"),
            Err(CanvasError::InvalidDimensions(_))
        ));
        assert!(matches!(
            CanvasState::new(800, 4001, "#fff"),
            Err(CanvasError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn test_add_remove_clear() {
        let mut canvas = CanvasState::with_defaults();
        let id = canvas.add_element(rect_element(0)).expect("add");
        assert_eq!(canvas.element_count(), 1);

        canvas.remove_element(id).expect("remove");
        assert!(canvas.is_empty());

        canvas.add_element(rect_element(0)).expect("add");
        canvas.clear();
        assert!(canvas.is_empty());
        assert_eq!(canvas.width, DEFAULT_WIDTH);
        assert_eq!(canvas.background_color, DEFAULT_BACKGROUND);
    }

    #[test]
    fn test_remove_missing_element_fails() {
        let mut canvas = CanvasState::with_defaults();
        assert!(matches!(
            canvas.remove_element(ElementId::new()),
            Err(CanvasError::ElementNotFound(_))
        ));
    }

    #[test]
    fn test_paint_order_stable_sort() {
        let mut canvas = CanvasState::with_defaults();
        let a = canvas.add_element(rect_element(5)).expect("add");
        let b = canvas.add_element(rect_element(1)).expect("add");
        let c = canvas.add_element(rect_element(5)).expect("add");

        let order: Vec<ElementId> = canvas.paint_order().iter().map(|e| e.id).collect();
        // z=1 first, then the two z=5 in insertion order.
        assert_eq!(order, vec![b, a, c]);
    }

    #[test]
    fn test_element_cap() {
        let mut canvas = CanvasState::with_defaults();
        for _ in 0..MAX_ELEMENTS {
            canvas.add_element(rect_element(0)).expect("add");
        }
        assert!(matches!(
            canvas.add_element(rect_element(0)),
            Err(CanvasError::TooManyElements(_))
        ));
    }
}

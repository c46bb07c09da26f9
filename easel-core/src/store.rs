//! Shared session storage.
//!
//! Provides a thread-safe [`SessionStore`] owning the map from session
//! identifier to [`CanvasState`]. The store serializes mutations to one
//! session; renderers only ever see cloned snapshots.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;
use uuid::Uuid;

use crate::canvas::{check_dimensions, now_ms};
use crate::{CanvasError, CanvasResult, CanvasState, Element, ElementId};

/// Thread-safe in-memory store of drawing sessions.
///
/// Sessions live for the process lifetime; there is no persistence
/// across restarts and no eviction policy beyond process exit.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, CanvasState>>>,
}

impl SessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new session with the given canvas configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidDimensions`] if dimensions fall
    /// outside the [100, 4000] range.
    pub fn create(
        &self,
        width: u32,
        height: u32,
        background_color: impl Into<String>,
    ) -> CanvasResult<(String, CanvasState)> {
        check_dimensions(width, height)?;
        let canvas = CanvasState::new(width, height, background_color)?;
        let session_id = Uuid::new_v4().to_string();

        let mut sessions = self.write();
        sessions.insert(session_id.clone(), canvas.clone());
        tracing::debug!(session_id = %session_id, width, height, "canvas session created");
        Ok((session_id, canvas))
    }

    /// Get a snapshot of a session's canvas.
    #[must_use]
    pub fn get(&self, session_id: &str) -> Option<CanvasState> {
        self.read().get(session_id).cloned()
    }

    /// Validate and append an element to a session.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::SessionNotFound`] for unknown sessions and
    /// any validation error from the element payload.
    pub fn add_element(&self, session_id: &str, raw: &Value) -> CanvasResult<Element> {
        let mut sessions = self.write();
        let canvas = sessions
            .get_mut(session_id)
            .ok_or_else(|| CanvasError::SessionNotFound(session_id.to_string()))?;

        let element = crate::validate::element(raw, canvas.element_count())?;
        canvas.add_element(element.clone())?;
        Ok(element)
    }

    /// Merge a partial update into an existing element.
    ///
    /// Fields present in `patch` overwrite the stored element's fields;
    /// `id` and `createdAt` are preserved and `lastModified` is stamped.
    /// The merged result is re-validated so a patch cannot smuggle in
    /// out-of-range geometry.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::SessionNotFound`] / [`CanvasError::ElementNotFound`]
    /// for unknown ids, or a validation error for a malformed merge result.
    pub fn update_element(
        &self,
        session_id: &str,
        element_id: ElementId,
        patch: &Value,
    ) -> CanvasResult<Element> {
        let mut sessions = self.write();
        let canvas = sessions
            .get_mut(session_id)
            .ok_or_else(|| CanvasError::SessionNotFound(session_id.to_string()))?;

        let existing = canvas
            .get_element(element_id)
            .ok_or_else(|| CanvasError::ElementNotFound(element_id.to_string()))?
            .clone();

        let mut merged = serde_json::to_value(&existing)?;
        if let (Some(target), Some(source)) = (merged.as_object_mut(), patch.as_object()) {
            for (key, value) in source {
                target.insert(key.clone(), value.clone());
            }
        }

        let mut updated = crate::validate::element(&merged, canvas.element_count())?;
        updated.id = existing.id;
        updated.created_at = existing.created_at;
        updated.last_modified = Some(now_ms());

        canvas.replace_element(element_id, updated.clone())?;
        Ok(updated)
    }

    /// Remove an element from a session.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::SessionNotFound`] or
    /// [`CanvasError::ElementNotFound`].
    pub fn remove_element(&self, session_id: &str, element_id: ElementId) -> CanvasResult<()> {
        let mut sessions = self.write();
        let canvas = sessions
            .get_mut(session_id)
            .ok_or_else(|| CanvasError::SessionNotFound(session_id.to_string()))?;
        canvas.remove_element(element_id)?;
        Ok(())
    }

    /// Clear all elements from a session, keeping its dimensions and
    /// background.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::SessionNotFound`] for unknown sessions.
    pub fn clear(&self, session_id: &str) -> CanvasResult<()> {
        let mut sessions = self.write();
        let canvas = sessions
            .get_mut(session_id)
            .ok_or_else(|| CanvasError::SessionNotFound(session_id.to_string()))?;
        canvas.clear();
        Ok(())
    }

    /// All known session IDs.
    #[must_use]
    pub fn session_ids(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, CanvasState>> {
        self.sessions
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, CanvasState>> {
        self.sessions
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rect_payload() -> Value {
        json!({
            "type": "rectangle",
            "x": 10, "y": 10,
            "width": 50, "height": 20,
            "fillColor": "#ff0000"
        })
    }

    #[test]
    fn test_create_validates_dimensions() {
        let store = SessionStore::new();
        assert!(matches!(
            store.create(50, 50, "#ffffff"),
            Err(CanvasError::InvalidDimensions(_))
        ));

        let (session_id, canvas) = store.create(800, 600, "#ffffff").expect("create");
        assert_eq!(canvas.width, 800);
        assert!(store.get(&session_id).is_some());
    }

    #[test]
    fn test_get_unknown_session() {
        let store = SessionStore::new();
        assert!(store.get("nope").is_none());
    }

    #[test]
    fn test_add_element_appends_in_order() {
        let store = SessionStore::new();
        let (session_id, _) = store.create(800, 600, "#ffffff").expect("create");

        let first = store.add_element(&session_id, &rect_payload()).expect("add");
        let second = store.add_element(&session_id, &rect_payload()).expect("add");
        assert_eq!(first.z_index, 0);
        assert_eq!(second.z_index, 1);

        let canvas = store.get(&session_id).expect("session");
        assert_eq!(canvas.element_count(), 2);
    }

    #[test]
    fn test_add_element_unknown_session() {
        let store = SessionStore::new();
        assert!(matches!(
            store.add_element("missing", &rect_payload()),
            Err(CanvasError::SessionNotFound(_))
        ));
    }

    #[test]
    fn test_update_merges_and_stamps() {
        let store = SessionStore::new();
        let (session_id, _) = store.create(800, 600, "#ffffff").expect("create");
        let element = store.add_element(&session_id, &rect_payload()).expect("add");

        let updated = store
            .update_element(&session_id, element.id, &json!({"x": 99, "fillColor": "#00ff00"}))
            .expect("update");

        assert_eq!(updated.id, element.id);
        assert_eq!(updated.created_at, element.created_at);
        assert!(updated.last_modified.is_some());
        assert!((updated.x - 99.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_update_rejects_invalid_merge() {
        let store = SessionStore::new();
        let (session_id, _) = store.create(800, 600, "#ffffff").expect("create");
        let element = store.add_element(&session_id, &rect_payload()).expect("add");

        assert!(matches!(
            store.update_element(&session_id, element.id, &json!({"width": -4})),
            Err(CanvasError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn test_remove_and_clear() {
        let store = SessionStore::new();
        let (session_id, _) = store.create(800, 600, "#ffffff").expect("create");
        let element = store.add_element(&session_id, &rect_payload()).expect("add");

        store.remove_element(&session_id, element.id).expect("remove");
        assert!(matches!(
            store.remove_element(&session_id, element.id),
            Err(CanvasError::ElementNotFound(_))
        ));

        store.add_element(&session_id, &rect_payload()).expect("add");
        store.clear(&session_id).expect("clear");
        let canvas = store.get(&session_id).expect("session");
        assert!(canvas.is_empty());
        assert_eq!(canvas.width, 800);
    }

    #[test]
    fn test_clear_unknown_session() {
        let store = SessionStore::new();
        assert!(matches!(
            store.clear("missing"),
            Err(CanvasError::SessionNotFound(_))
        ));
    }
}

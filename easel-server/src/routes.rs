//! API route handlers.
//!
//! All request and response bodies use camelCase JSON. Export endpoints
//! return binary bodies with an attachment disposition; their
//! `Content-Type` reflects the format actually produced, since the PNG
//! endpoint downgrades to SVG when no pixel tier is available.

use std::collections::BTreeMap;
use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use easel_core::canvas::{DEFAULT_BACKGROUND, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use easel_core::{CanvasState, Element, ElementId};
use easel_renderer::PdfOptions;

use crate::error::ApiError;
use crate::{health, AppState};

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/canvas/init", post(init_canvas))
        .route("/api/canvas/export/png", post(export_png_from_data))
        .route("/api/canvas/export/pdf", post(export_pdf_from_data))
        .route("/api/canvas/{session_id}", get(get_canvas))
        .route("/api/canvas/{session_id}/metadata", get(get_metadata))
        .route("/api/canvas/{session_id}/clear", delete(clear_canvas))
        .route("/api/canvas/{session_id}/elements", post(add_element))
        .route(
            "/api/canvas/{session_id}/elements/{element_id}",
            put(update_element).delete(remove_element),
        )
        .route("/api/canvas/{session_id}/export/png", get(export_png))
        .route("/api/canvas/{session_id}/export/pdf", get(export_pdf))
        .with_state(state)
}

/// Canvas creation request. All fields optional; defaults are 800x600
/// on white.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitRequest {
    /// Canvas width in pixels.
    pub width: Option<u32>,
    /// Canvas height in pixels.
    pub height: Option<u32>,
    /// Background color.
    pub background_color: Option<String>,
}

/// Canvas creation response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitResponse {
    /// Identifier for subsequent requests.
    pub session_id: String,
    /// The freshly created canvas.
    pub canvas: CanvasState,
}

/// Canvas metadata summary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasMetadata {
    /// Session identifier.
    pub session_id: String,
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Background color.
    pub background_color: String,
    /// Total element count.
    pub element_count: usize,
    /// Element counts keyed by type tag.
    pub elements_by_type: BTreeMap<String, usize>,
    /// Creation timestamp, Unix milliseconds.
    pub created_at: u64,
    /// Last mutation timestamp, Unix milliseconds.
    pub last_modified: u64,
}

/// Query options for PDF export.
#[derive(Debug, Default, Deserialize)]
pub struct PdfQuery {
    /// Content stream compression toggle.
    pub compress: Option<bool>,
}

#[tracing::instrument(name = "init_canvas", skip(state, payload))]
async fn init_canvas(
    State(state): State<AppState>,
    payload: Option<Json<InitRequest>>,
) -> Result<(axum::http::StatusCode, Json<InitResponse>), ApiError> {
    let request = payload.map(|Json(r)| r).unwrap_or_default();
    let width = request.width.unwrap_or(DEFAULT_WIDTH);
    let height = request.height.unwrap_or(DEFAULT_HEIGHT);
    let background = request
        .background_color
        .unwrap_or_else(|| DEFAULT_BACKGROUND.to_string());

    let (session_id, canvas) = state.store.create(width, height, background)?;
    tracing::info!(session_id = %session_id, width, height, "session created");
    Ok((
        axum::http::StatusCode::CREATED,
        Json(InitResponse { session_id, canvas }),
    ))
}

#[tracing::instrument(name = "get_canvas", skip(state))]
async fn get_canvas(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<CanvasState>, ApiError> {
    let canvas = state
        .store
        .get(&session_id)
        .ok_or_else(|| ApiError::NotFound(format!("session not found: {session_id}")))?;
    Ok(Json(canvas))
}

#[tracing::instrument(name = "get_metadata", skip(state))]
async fn get_metadata(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<CanvasMetadata>, ApiError> {
    let canvas = state
        .store
        .get(&session_id)
        .ok_or_else(|| ApiError::NotFound(format!("session not found: {session_id}")))?;

    let mut elements_by_type = BTreeMap::new();
    for element in &canvas.elements {
        *elements_by_type
            .entry(element.kind.type_name().to_string())
            .or_insert(0) += 1;
    }

    Ok(Json(CanvasMetadata {
        session_id,
        width: canvas.width,
        height: canvas.height,
        background_color: canvas.background_color,
        element_count: canvas.elements.len(),
        elements_by_type,
        created_at: canvas.created_at,
        last_modified: canvas.last_modified,
    }))
}

#[tracing::instrument(name = "clear_canvas", skip(state))]
async fn clear_canvas(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<axum::http::StatusCode, ApiError> {
    state.store.clear(&session_id)?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

#[tracing::instrument(name = "add_element", skip(state, payload))]
async fn add_element(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<(axum::http::StatusCode, Json<Element>), ApiError> {
    let element = state.store.add_element(&session_id, &payload)?;
    tracing::debug!(element_id = %element.id, kind = element.kind.type_name(), "element added");
    Ok((axum::http::StatusCode::CREATED, Json(element)))
}

#[tracing::instrument(name = "update_element", skip(state, payload))]
async fn update_element(
    State(state): State<AppState>,
    Path((session_id, element_id)): Path<(String, String)>,
    Json(payload): Json<Value>,
) -> Result<Json<Element>, ApiError> {
    let element_id = parse_element_id(&element_id)?;
    let element = state.store.update_element(&session_id, element_id, &payload)?;
    Ok(Json(element))
}

#[tracing::instrument(name = "remove_element", skip(state))]
async fn remove_element(
    State(state): State<AppState>,
    Path((session_id, element_id)): Path<(String, String)>,
) -> Result<axum::http::StatusCode, ApiError> {
    let element_id = parse_element_id(&element_id)?;
    state.store.remove_element(&session_id, element_id)?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

#[tracing::instrument(name = "export_png", skip(state))]
async fn export_png(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Response, ApiError> {
    let canvas = state
        .store
        .get(&session_id)
        .ok_or_else(|| ApiError::NotFound(format!("session not found: {session_id}")))?;
    render_png_response(&state, &canvas, &session_id).await
}

#[tracing::instrument(name = "export_pdf", skip(state))]
async fn export_pdf(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<PdfQuery>,
) -> Result<Response, ApiError> {
    let canvas = state
        .store
        .get(&session_id)
        .ok_or_else(|| ApiError::NotFound(format!("session not found: {session_id}")))?;
    render_pdf_response(&state, &canvas, &session_id, query.compress).await
}

#[tracing::instrument(name = "export_png_from_data", skip(state, canvas))]
async fn export_png_from_data(
    State(state): State<AppState>,
    Json(canvas): Json<CanvasState>,
) -> Result<Response, ApiError> {
    render_png_response(&state, &canvas, "canvas").await
}

#[tracing::instrument(name = "export_pdf_from_data", skip(state, canvas))]
async fn export_pdf_from_data(
    State(state): State<AppState>,
    Query(query): Query<PdfQuery>,
    Json(canvas): Json<CanvasState>,
) -> Result<Response, ApiError> {
    render_pdf_response(&state, &canvas, "canvas", query.compress).await
}

async fn render_png_response(
    state: &AppState,
    canvas: &CanvasState,
    name: &str,
) -> Result<Response, ApiError> {
    let output = state.exporter.export_png(canvas).await?;
    let filename = format!("{name}.{}", output.format.extension());
    Ok(attachment(output.bytes, output.format.mime_type(), &filename))
}

async fn render_pdf_response(
    state: &AppState,
    canvas: &CanvasState,
    name: &str,
    compress: Option<bool>,
) -> Result<Response, ApiError> {
    let options = PdfOptions {
        compress: compress.unwrap_or(true),
    };
    let bytes = state.exporter.export_pdf(canvas, options).await?;
    Ok(attachment(bytes, "application/pdf", &format!("{name}.pdf")))
}

fn attachment(bytes: Vec<u8>, content_type: &str, filename: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

fn parse_element_id(raw: &str) -> Result<ElementId, ApiError> {
    ElementId::from_str(raw).map_err(|_| ApiError::Validation(format!("invalid element id: {raw}")))
}

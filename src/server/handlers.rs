//! Handlers for `/api/images` and `/api/layouts`

use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use tracing::{error, info};

use super::request::{build_request, read_parts};
use super::AppState;
use crate::api::{ApiResponse, METHOD_NOT_ALLOWED};
use crate::layout::LayoutSummary;
use crate::store::AssetDescriptor;
use crate::CollageError;

/// Every handler failure ends up here: logged, then a 400 envelope
#[derive(Debug)]
pub struct ApiError(pub CollageError);

impl<E: Into<CollageError>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(kind = self.0.kind(), error = %self.0, "request failed");
        let body = ApiResponse::<()>::failure((&self.0).into());
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

/// `GET /api/images`
pub async fn list_images(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<AssetDescriptor>>>, ApiError> {
    let assets = state.gallery.list().await?;
    Ok(Json(ApiResponse::success(assets)))
}

/// `POST /api/images`
pub async fn create_image(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<ApiResponse<AssetDescriptor>>), ApiError> {
    let multipart = multipart.map_err(|e| CollageError::invalid(e.body_text()))?;

    let parts = read_parts(multipart).await?;
    let request = build_request(parts, &state.registry)?;
    let composite = state.composer.compose(&request).await?;

    info!(id = %composite.public_id, url = ?composite.href(), "collage created");
    Ok((StatusCode::CREATED, Json(ApiResponse::success(composite))))
}

/// `GET /api/layouts`
pub async fn list_layouts(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Vec<LayoutSummary>>> {
    let layouts = state.registry.iter().map(LayoutSummary::from).collect();
    Json(ApiResponse::success(layouts))
}

/// Any method a route does not handle
pub async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "message": METHOD_NOT_ALLOWED })),
    )
}

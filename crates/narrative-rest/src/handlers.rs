use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use narrative_core::error::Error as CoreError;
use narrative_core::model::share::{ShareRequestParams, ShareResult};
use narrative_core::sharing::NarrativeEngine;

type AppState = Arc<NarrativeEngine>;

pub enum AppError {
    Core(CoreError),
    /// Request body that is not valid JSON or does not fit the params shape.
    Body(JsonRejection),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, msg) = match &self {
            AppError::Body(rejection) => (rejection.status(), rejection.body_text()),
            AppError::Core(CoreError::Validation(e)) => (StatusCode::BAD_REQUEST, e.to_string()),
            AppError::Core(e @ (CoreError::Workspace(_) | CoreError::Feeds(_))) => {
                tracing::warn!("upstream failure: {e}");
                (StatusCode::BAD_GATEWAY, e.to_string())
            }
            AppError::Core(other) => {
                tracing::error!("internal error: {other}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        (status, Json(serde_json::json!({"error": msg}))).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(e: CoreError) -> Self {
        AppError::Core(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Body(rejection)
    }
}

/// POST /v1/share-requests -- ask a workspace's admins for access.
pub async fn request_share_handler(
    State(engine): State<AppState>,
    payload: Result<Json<ShareRequestParams>, JsonRejection>,
) -> Result<Json<ShareResult>, AppError> {
    let Json(params) = payload?;
    let result = engine.request_share(params).await?;
    Ok(Json(result))
}

/// GET /v1/health
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

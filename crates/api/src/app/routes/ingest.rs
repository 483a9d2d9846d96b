use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// Reconcile one photographed shelf against the inventory.
pub async fn ingest(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::IngestRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text());
        }
    };

    let Some(image_url) = body.image_url() else {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "image_url must not be empty");
    };

    match services.ingest(image_url, body.allow_unknown).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, image_url, "ingest failed");
            errors::reconcile_error_to_response(e)
        }
    }
}

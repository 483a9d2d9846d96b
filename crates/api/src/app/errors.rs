use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use toolcrib_infra::ReconcileError;

/// Detector and store failures are upstream failures (`502`); a record the store
/// could not parse is reported as `422` so operators know to fix the sheet.
pub fn reconcile_error_to_response(err: ReconcileError) -> axum::response::Response {
    if err.is_malformed_record() {
        return json_error(StatusCode::UNPROCESSABLE_ENTITY, "malformed_record", err.to_string());
    }
    json_error(StatusCode::BAD_GATEWAY, "service_error", err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

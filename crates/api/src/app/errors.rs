use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use packrat_infra::AccessError;

/// Map an orchestration failure to a response.
///
/// Validation detail is the only thing callers get back; everything else is
/// the single opaque failure the error contract promises.
pub fn access_error_to_response(err: AccessError) -> axum::response::Response {
    match err {
        AccessError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        AccessError::Operation => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "operation_failed",
            "operation failed",
        ),
    }
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

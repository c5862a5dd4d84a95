use axum::{
    extract::State,
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use tracing::warn;

/// Shared-secret header check.
///
/// When no header name is configured the check is disabled entirely (dev
/// mode). When configured, any non-empty value passes; this is perimeter
/// screening, not authentication.
#[derive(Clone)]
pub struct AuthState {
    pub header: Option<String>,
}

pub async fn header_auth(
    State(state): State<AuthState>,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    if let Some(name) = &state.header {
        let present = req
            .headers()
            .get(name.as_str())
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| !v.is_empty());

        if !present {
            warn!(header = %name, uri = %req.uri(), "rejected request without auth header");
            return Err(StatusCode::FORBIDDEN);
        }
    }

    Ok(next.run(req).await)
}

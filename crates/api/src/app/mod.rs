//! Application wiring: router construction and cross-cutting layers.

pub mod dto;
pub mod errors;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    error_handling::HandleErrorLayer,
    extract::Extension,
    http::StatusCode,
    routing::get,
};
use tower::{BoxError, ServiceBuilder, timeout::TimeoutLayer};

use packrat_infra::{CacheStore, DataAccess, RecordStore};

use crate::middleware::{AuthState, header_auth};

/// Whole-request deadline; store and cache calls in flight are cancelled when
/// it fires (the detached publish path is not).
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Build the full application router.
///
/// The auth check covers every route, `/ping` included, mirroring a
/// perimeter that screens all traffic.
pub fn build_router<S, C>(access: Arc<DataAccess<S, C>>, auth_header: Option<String>) -> Router
where
    S: RecordStore + 'static,
    C: CacheStore + 'static,
{
    Router::new()
        .route("/ping", get(routes::system::ping))
        .nest("/api", routes::api_router::<S, C>())
        .layer(Extension(access))
        .layer(axum::middleware::from_fn_with_state(
            AuthState {
                header: auth_header,
            },
            header_auth,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_layer_error))
                .layer(TimeoutLayer::new(REQUEST_TIMEOUT)),
        )
}

async fn handle_layer_error(err: BoxError) -> (StatusCode, &'static str) {
    if err.is::<tower::timeout::error::Elapsed>() {
        (StatusCode::REQUEST_TIMEOUT, "request timed out")
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "internal error")
    }
}

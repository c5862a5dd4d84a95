use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};

use packrat_core::{ItemId, UserId};
use packrat_infra::{CacheStore, DataAccess, RecordStore};

use crate::app::{dto, errors};

pub fn router<S, C>() -> Router
where
    S: RecordStore + 'static,
    C: CacheStore + 'static,
{
    Router::new()
        .route("/user/:user_name", post(create_user::<S, C>))
        .route("/user_id/:user_id", get(list_user_items::<S, C>))
        .route("/user_id/:user_id/:item_id", put(add_item_to_user::<S, C>))
}

pub async fn create_user<S, C>(
    Extension(access): Extension<Arc<DataAccess<S, C>>>,
    Path(user_name): Path<String>,
) -> axum::response::Response
where
    S: RecordStore + 'static,
    C: CacheStore + 'static,
{
    match access.create_user(&user_name).await {
        Ok(record) => (StatusCode::CREATED, Json(dto::UserResponse::from(record))).into_response(),
        Err(e) => errors::access_error_to_response(e),
    }
}

pub async fn add_item_to_user<S, C>(
    Extension(access): Extension<Arc<DataAccess<S, C>>>,
    Path((user_id, item_id)): Path<(String, String)>,
) -> axum::response::Response
where
    S: RecordStore + 'static,
    C: CacheStore + 'static,
{
    let user_id: UserId = match user_id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid user id"),
    };
    let item_id: ItemId = match item_id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid item id"),
    };

    match access.add_item_to_user(user_id, &item_id).await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({}))).into_response(),
        Err(e) => errors::access_error_to_response(e),
    }
}

pub async fn list_user_items<S, C>(
    Extension(access): Extension<Arc<DataAccess<S, C>>>,
    Path(user_id): Path<String>,
) -> axum::response::Response
where
    S: RecordStore + 'static,
    C: CacheStore + 'static,
{
    let user_id: UserId = match user_id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid user id"),
    };

    match access.list_user_items(user_id).await {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(e) => errors::access_error_to_response(e),
    }
}

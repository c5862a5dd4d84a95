use axum::Router;

use packrat_infra::{CacheStore, RecordStore};

pub mod system;
pub mod users;

/// Router for the domain endpoints (mounted under `/api`).
pub fn api_router<S, C>() -> Router
where
    S: RecordStore + 'static,
    C: CacheStore + 'static,
{
    users::router::<S, C>()
}

//! `packrat-api` — HTTP boundary adapter.
//!
//! Thin by design: routing, DTO mapping, auth, and timeouts live here; all
//! domain behavior is behind `packrat_infra::DataAccess`.

pub mod app;
pub mod middleware;

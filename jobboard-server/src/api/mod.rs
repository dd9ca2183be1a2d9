//! HTTP API under `/api`
//!
//! One sub-router per resource. Rate-limited routes are wrapped with
//! [`limited`](crate::admission::limited) individually so the admission check
//! runs after routing and before any extractor.

mod admin;
mod response;
mod resume;
mod search;
mod user;
mod vacancy;

use crate::state::SharedState;
use axum::Router;

pub fn router(state: &SharedState) -> Router<SharedState> {
    Router::new()
        .merge(user::routes(state))
        .merge(vacancy::routes())
        .merge(resume::routes())
        .merge(response::routes(state))
        .merge(search::routes(state))
        .merge(admin::routes())
}

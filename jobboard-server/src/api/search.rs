//! Cached search over vacancies and resumes
//!
//! Results are cached under a key that embeds the class version counter and
//! every query parameter, so any committed mutation of the class makes the
//! next identical search miss.

use crate::admission::{LimitedEndpoint, limited};
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::SharedState;
use crate::types::{ResumeQuery, Role, VacancyQuery};
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use jobboard::{ResourceClass, SearchKey};
use serde_json::{Value, json};

pub(super) fn routes(state: &SharedState) -> Router<SharedState> {
    Router::new()
        .route(
            "/search/search_resumes",
            limited(get(search_resumes), state, LimitedEndpoint::SearchResumes),
        )
        .route(
            "/search/search_vacancies",
            limited(get(search_vacancies), state, LimitedEndpoint::SearchVacancies),
        )
}

fn resume_key(query: &ResumeQuery) -> SearchKey {
    SearchKey::new(query.limit, query.offset)
        .param("q", query.title.as_ref())
        .param("city", query.city.as_ref())
        .param("stack", query.stack.as_ref())
}

fn vacancy_key(query: &VacancyQuery) -> SearchKey {
    SearchKey::new(query.limit, query.offset)
        .param("q", query.title.as_ref())
        .param("city", query.city.as_ref())
        .param("compensation", query.compensation)
}

async fn search_resumes(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ResumeQuery>,
) -> Result<Json<Value>, ApiError> {
    if user.role != Role::Tenant {
        return Err(ApiError::forbidden("Only tenants can search resumes"));
    }

    let repo = &state.repo;
    let query = &query;
    let found = state
        .search(ResourceClass::RESUMES, &resume_key(query), move || async move {
            Ok(repo.search_resumes(query).await?)
        })
        .await?;

    Ok(Json(json!({ "resumes": found.value, "source": found.source })))
}

async fn search_vacancies(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<VacancyQuery>,
) -> Result<Json<Value>, ApiError> {
    if user.role != Role::Applicant {
        return Err(ApiError::forbidden("Only applicants can search vacancies"));
    }

    let repo = &state.repo;
    let query = &query;
    let found = state
        .search(ResourceClass::VACANCIES, &vacancy_key(query), move || async move {
            Ok(repo.search_vacancies(query).await?)
        })
        .await?;

    Ok(Json(json!({ "vacancies": found.value, "source": found.source })))
}

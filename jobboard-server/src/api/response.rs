use crate::admission::{LimitedEndpoint, limited};
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::repository::RepoError;
use crate::state::SharedState;
use crate::types::{Ack, NewResponse, ResponseDetail, ReviewStatus, Role};
use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};

pub(super) fn routes(state: &SharedState) -> Router<SharedState> {
    Router::new()
        .route(
            "/response/apply_to_vacancy/{vacancy_id}",
            limited(post(apply_to_vacancy), state, LimitedEndpoint::ApplyToVacancy),
        )
        .route("/response/{vacancy_id}/get_responses", get(get_responses))
        .route(
            "/response/set_status/{response_id}",
            limited(put(set_status), state, LimitedEndpoint::SetStatus),
        )
}

#[derive(Deserialize)]
struct Apply {
    resume_id: i64,
    #[serde(default)]
    cover_letter: Option<String>,
}

#[derive(Deserialize)]
struct SetStatus {
    status: ReviewStatus,
}

async fn apply_to_vacancy(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(vacancy_id): Path<i64>,
    Json(body): Json<Apply>,
) -> Result<Json<Value>, ApiError> {
    let vacancy = state.repo.vacancy(vacancy_id).await?;
    let resume = state.repo.resume(body.resume_id).await?;

    if resume.applicant_id != user.id {
        return Err(ApiError::forbidden("It's not your resume"));
    }
    if user.role != Role::Applicant {
        return Err(ApiError::forbidden("Only applicant can apply to vacancy"));
    }

    let response = state
        .repo
        .create_response(NewResponse {
            applicant_id: user.id,
            resume_id: resume.id,
            vacancy_id: vacancy.id,
            cover_letter: body.cover_letter,
        })
        .await
        .map_err(|e| match e {
            // Duplicate applications answer 400
            RepoError::Conflict(msg) => ApiError::BadRequest(msg),
            other => other.into(),
        })?;

    Ok(Json(json!({
        "success": true,
        "message": "You responded to vacancy",
        "response": response,
    })))
}

async fn get_responses(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(vacancy_id): Path<i64>,
) -> Result<Json<Vec<ResponseDetail>>, ApiError> {
    let vacancy = state.repo.vacancy(vacancy_id).await?;

    if user.role != Role::Tenant {
        return Err(ApiError::forbidden("You are not a tenant"));
    }
    if vacancy.tenant_id != user.id {
        return Err(ApiError::forbidden("It's not your vacancy"));
    }

    Ok(Json(state.repo.responses_for_vacancy(vacancy.id).await?))
}

async fn set_status(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(response_id): Path<i64>,
    Json(body): Json<SetStatus>,
) -> Result<Json<Ack>, ApiError> {
    if user.role != Role::Tenant {
        return Err(ApiError::forbidden("Only tenants can set status to responses"));
    }

    let response = state.repo.response(response_id).await?;
    let vacancy = state.repo.vacancy(response.vacancy_id).await?;
    if vacancy.tenant_id != user.id {
        return Err(ApiError::forbidden("It's not your vacancy"));
    }

    state
        .repo
        .set_response_status(response.id, body.status.into())
        .await?;

    Ok(Json(Ack::new("Status was updated")))
}

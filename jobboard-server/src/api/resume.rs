use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::SharedState;
use crate::types::{Ack, NewResume, ResumePatch, Role};
use axum::extract::{Path, State};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use jobboard::ResourceClass;
use serde_json::{Value, json};

pub(super) fn routes() -> Router<SharedState> {
    Router::new()
        .route("/resume/create_resume", post(create_resume))
        .route("/resume/get_all_my_resumes", get(get_all_my_resumes))
        .route("/resume/edit_resume/{resume_id}", put(edit_resume))
        .route("/resume/delete_resume/{resume_id}", delete(delete_resume))
}

async fn create_resume(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<NewResume>,
) -> Result<Json<Value>, ApiError> {
    if user.role != Role::Applicant {
        return Err(ApiError::forbidden("Only applicant can make resumes"));
    }

    let resume = state.repo.create_resume(user.id, body).await?;
    state.bump(ResourceClass::RESUMES).await;

    Ok(Json(json!({
        "success": true,
        "message": "Resume was created",
        "resume": resume,
    })))
}

async fn get_all_my_resumes(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let resumes = state.repo.resumes_of(user.id).await?;
    Ok(Json(json!({ "success": true, "resumes": resumes })))
}

async fn edit_resume(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(resume_id): Path<i64>,
    Json(patch): Json<ResumePatch>,
) -> Result<Json<Ack>, ApiError> {
    if user.role != Role::Applicant {
        return Err(ApiError::forbidden("Only applicant can edit resume"));
    }
    if state.repo.resume(resume_id).await?.applicant_id != user.id {
        return Err(ApiError::forbidden("It's not your resume"));
    }

    state.repo.update_resume(resume_id, patch).await?;
    state.bump(ResourceClass::RESUMES).await;

    Ok(Json(Ack::new("Resume was edited")))
}

async fn delete_resume(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(resume_id): Path<i64>,
) -> Result<Json<Ack>, ApiError> {
    if user.role != Role::Applicant {
        return Err(ApiError::forbidden("Only applicant can delete resumes"));
    }
    if state.repo.resume(resume_id).await?.applicant_id != user.id {
        return Err(ApiError::forbidden("This is not your resume"));
    }

    state.repo.delete_resume(resume_id).await?;
    state.bump(ResourceClass::RESUMES).await;

    Ok(Json(Ack::new("Resume was deleted")))
}

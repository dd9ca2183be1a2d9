//! Administration endpoints
//!
//! Every handler takes [`AdminUser`], so a missing or non-admin caller is
//! rejected before the body is read. Mutations go through the same cache
//! invalidation paths as the owner-facing handlers.

use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::state::SharedState;
use crate::types::{Ack, PageParams, Profile, ResumePatch, Role, User, UserPatch, VacancyPatch};
use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, put};
use axum::{Json, Router};
use jobboard::ResourceClass;
use serde::Deserialize;
use serde_json::{Value, json};

pub(super) fn routes() -> Router<SharedState> {
    Router::new()
        .route("/admin/get_users", get(get_users))
        .route("/admin/edit_user_name/{user_id}", put(edit_user_name))
        .route("/admin/update_user_role/{user_id}", put(update_user_role))
        .route("/admin/delete_user/{user_id}", delete(delete_user))
        .route("/admin/get_vacancies", get(get_vacancies))
        .route("/admin/edit_vacancy/{vacancy_id}", put(edit_vacancy))
        .route("/admin/delete_vacancy/{vacancy_id}", delete(delete_vacancy))
        .route("/admin/get_resumes", get(get_resumes))
        .route("/admin/edit_resume/{resume_id}", put(edit_resume))
        .route("/admin/delete_resume/{resume_id}", delete(delete_resume))
        .route("/admin/get_responses", get(get_responses))
        .route("/admin/delete_response/{response_id}", delete(delete_response))
}

#[derive(Deserialize)]
struct EditUserName {
    new_name: String,
}

#[derive(Deserialize)]
struct UpdateUserRole {
    new_role: Role,
}

/// Target user of an account-level admin action
///
/// `other_admin` is the rejection for targeting another admin; `None` allows it.
async fn target_user(
    state: &SharedState,
    admin: &User,
    user_id: i64,
    own_account: &str,
    other_admin: Option<&str>,
) -> Result<User, ApiError> {
    let user = state.repo.user(user_id).await?;
    if user.id == admin.id {
        return Err(ApiError::forbidden(own_account));
    }
    if let Some(msg) = other_admin
        && user.role == Role::Admin
    {
        return Err(ApiError::forbidden(msg));
    }
    Ok(user)
}

async fn get_users(
    State(state): State<SharedState>,
    AdminUser(_): AdminUser,
    Query(page): Query<PageParams>,
) -> Result<Json<Value>, ApiError> {
    let page = state.repo.list_users(page).await?;
    let users: Vec<Profile> = page.items.iter().map(User::profile).collect();
    Ok(Json(json!({ "total": page.total, "users": users })))
}

async fn edit_user_name(
    State(state): State<SharedState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<i64>,
    Json(body): Json<EditUserName>,
) -> Result<Json<Ack>, ApiError> {
    let user = target_user(
        &state,
        &admin,
        user_id,
        "You can not edit your own admin account",
        Some("You can not edit accounts of other admins"),
    )
    .await?;

    state
        .repo
        .update_user(
            user.id,
            UserPatch {
                name: Some(body.new_name),
                ..Default::default()
            },
        )
        .await?;
    state.invalidate_profile(user.id).await;

    Ok(Json(Ack::new("Users name was edited")))
}

async fn update_user_role(
    State(state): State<SharedState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<i64>,
    Json(body): Json<UpdateUserRole>,
) -> Result<Json<Ack>, ApiError> {
    let user = target_user(
        &state,
        &admin,
        user_id,
        "You can not update your own role",
        None,
    )
    .await?;

    state
        .repo
        .update_user(
            user.id,
            UserPatch {
                role: Some(body.new_role),
                ..Default::default()
            },
        )
        .await?;
    state.invalidate_profile(user.id).await;

    tracing::info!(admin_id = admin.id, user_id = user.id, role = %body.new_role, "role updated");
    Ok(Json(Ack::new("Role was updated")))
}

async fn delete_user(
    State(state): State<SharedState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<i64>,
) -> Result<Json<Ack>, ApiError> {
    let user = target_user(
        &state,
        &admin,
        user_id,
        "You can not delete your own admin account",
        Some("You can not delete other admins"),
    )
    .await?;

    let removed = state.repo.delete_user(user.id).await?;
    state.invalidate_profile(user.id).await;
    state.bump_cascade(removed).await;

    tracing::info!(admin_id = admin.id, user_id = user.id, ?removed, "user deleted by admin");
    Ok(Json(Ack::new("User was deleted")))
}

async fn get_vacancies(
    State(state): State<SharedState>,
    AdminUser(_): AdminUser,
    Query(page): Query<PageParams>,
) -> Result<Json<Value>, ApiError> {
    let page = state.repo.list_vacancies(page).await?;
    Ok(Json(json!({ "total": page.total, "vacancies": page.items })))
}

async fn edit_vacancy(
    State(state): State<SharedState>,
    AdminUser(_): AdminUser,
    Path(vacancy_id): Path<i64>,
    Json(patch): Json<VacancyPatch>,
) -> Result<Json<Ack>, ApiError> {
    state.repo.update_vacancy(vacancy_id, patch).await?;
    state.bump(ResourceClass::VACANCIES).await;
    Ok(Json(Ack::new("Vacancy was edited")))
}

async fn delete_vacancy(
    State(state): State<SharedState>,
    AdminUser(_): AdminUser,
    Path(vacancy_id): Path<i64>,
) -> Result<Json<Ack>, ApiError> {
    state.repo.delete_vacancy(vacancy_id).await?;
    state.bump(ResourceClass::VACANCIES).await;
    Ok(Json(Ack::new("Vacancy was deleted")))
}

async fn get_resumes(
    State(state): State<SharedState>,
    AdminUser(_): AdminUser,
    Query(page): Query<PageParams>,
) -> Result<Json<Value>, ApiError> {
    let page = state.repo.list_resumes(page).await?;
    Ok(Json(json!({ "total": page.total, "resumes": page.items })))
}

async fn edit_resume(
    State(state): State<SharedState>,
    AdminUser(_): AdminUser,
    Path(resume_id): Path<i64>,
    Json(patch): Json<ResumePatch>,
) -> Result<Json<Ack>, ApiError> {
    state.repo.update_resume(resume_id, patch).await?;
    state.bump(ResourceClass::RESUMES).await;
    Ok(Json(Ack::new("Resume was edited")))
}

async fn delete_resume(
    State(state): State<SharedState>,
    AdminUser(_): AdminUser,
    Path(resume_id): Path<i64>,
) -> Result<Json<Ack>, ApiError> {
    state.repo.delete_resume(resume_id).await?;
    state.bump(ResourceClass::RESUMES).await;
    Ok(Json(Ack::new("Resume was deleted")))
}

async fn get_responses(
    State(state): State<SharedState>,
    AdminUser(_): AdminUser,
    Query(page): Query<PageParams>,
) -> Result<Json<Value>, ApiError> {
    let page = state.repo.list_responses(page).await?;
    Ok(Json(json!({ "total": page.total, "responses": page.items })))
}

async fn delete_response(
    State(state): State<SharedState>,
    AdminUser(_): AdminUser,
    Path(response_id): Path<i64>,
) -> Result<Json<Ack>, ApiError> {
    state.repo.delete_response(response_id).await?;
    Ok(Json(Ack::new("Response was deleted")))
}

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::SharedState;
use crate::types::{Ack, NewVacancy, Role, User, Vacancy, VacancyPatch};
use axum::extract::{Path, State};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use jobboard::ResourceClass;
use serde_json::{Value, json};

pub(super) fn routes() -> Router<SharedState> {
    Router::new()
        .route("/vacancy/create_vacancy", post(create_vacancy))
        .route("/vacancy/get_all_my_vacancies", get(get_all_my_vacancies))
        .route("/vacancy/edit_vacancy/{vacancy_id}", put(edit_vacancy))
        .route("/vacancy/delete_vacancy/{vacancy_id}", delete(delete_vacancy))
}

/// The vacancy, if `user` is the tenant owning it
async fn owned_vacancy(
    state: &SharedState,
    user: &User,
    vacancy_id: i64,
    not_owner: &str,
) -> Result<Vacancy, ApiError> {
    let vacancy = state.repo.vacancy(vacancy_id).await?;
    if vacancy.tenant_id != user.id {
        return Err(ApiError::forbidden(not_owner));
    }
    Ok(vacancy)
}

async fn create_vacancy(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<NewVacancy>,
) -> Result<Json<Value>, ApiError> {
    if user.role != Role::Tenant {
        return Err(ApiError::forbidden("Only tenants can make vacancies"));
    }

    let vacancy = state.repo.create_vacancy(user.id, body).await?;
    state.bump(ResourceClass::VACANCIES).await;

    Ok(Json(json!({
        "success": true,
        "message": "Vacancy was created",
        "vacancy": vacancy,
    })))
}

async fn get_all_my_vacancies(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let vacancies = state.repo.vacancies_of(user.id).await?;
    Ok(Json(json!({ "success": true, "vacancies": vacancies })))
}

async fn edit_vacancy(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(vacancy_id): Path<i64>,
    Json(patch): Json<VacancyPatch>,
) -> Result<Json<Ack>, ApiError> {
    if user.role != Role::Tenant {
        return Err(ApiError::forbidden("Only tenants can edit vacancy"));
    }
    owned_vacancy(&state, &user, vacancy_id, "It's not your vacancy").await?;

    state.repo.update_vacancy(vacancy_id, patch).await?;
    state.bump(ResourceClass::VACANCIES).await;

    Ok(Json(Ack::new("Vacancy was edited")))
}

async fn delete_vacancy(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(vacancy_id): Path<i64>,
) -> Result<Json<Ack>, ApiError> {
    if user.role != Role::Tenant {
        return Err(ApiError::forbidden("Only tenants can delete vacancy"));
    }
    owned_vacancy(&state, &user, vacancy_id, "This is not your vacancy").await?;

    state.repo.delete_vacancy(vacancy_id).await?;
    state.bump(ResourceClass::VACANCIES).await;

    Ok(Json(Ack::new("Vacancy was deleted")))
}

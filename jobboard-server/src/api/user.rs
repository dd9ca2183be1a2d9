use crate::admission::{LimitedEndpoint, limited};
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::SharedState;
use crate::types::{Ack, NewUser, Role, UserPatch};
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};

pub(super) fn routes(state: &SharedState) -> Router<SharedState> {
    Router::new()
        .route("/user/sign_up", post(sign_up))
        .route(
            "/user/sign_in",
            limited(post(sign_in), state, LimitedEndpoint::SignIn),
        )
        .route("/user/get_info", get(get_info))
        .route(
            "/user/edit_password",
            limited(put(edit_password), state, LimitedEndpoint::EditPassword),
        )
        .route("/user/edit_name", put(edit_name))
        .route(
            "/user/delete_user",
            limited(delete(delete_user), state, LimitedEndpoint::DeleteUser),
        )
}

#[derive(Deserialize)]
struct SignUp {
    email: String,
    password: String,
    repeat_password: String,
    role: String,
    name: String,
}

#[derive(Deserialize)]
struct SignIn {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct EditPassword {
    old_password: String,
    new_password: String,
    repeat_new_password: String,
}

#[derive(Deserialize)]
struct EditName {
    new_name: String,
    password: String,
}

#[derive(Deserialize)]
struct PasswordConfirmation {
    password: String,
}

async fn sign_up(
    State(state): State<SharedState>,
    Json(body): Json<SignUp>,
) -> Result<Json<Ack>, ApiError> {
    if body.password != body.repeat_password {
        return Err(ApiError::bad_request("Passwords don't match"));
    }

    let role = match body.role.parse::<Role>() {
        Ok(role @ (Role::Tenant | Role::Applicant)) => role,
        _ => {
            return Err(ApiError::bad_request(
                "Role must be either 'tenant' or 'applicant'",
            ));
        }
    };

    let password_hash = state.passwords.hash(&body.password).await?;
    let user = state
        .repo
        .create_user(NewUser {
            email: body.email,
            password_hash,
            role,
            name: body.name,
        })
        .await?;

    tracing::info!(user_id = user.id, %role, "account created");
    Ok(Json(Ack::new("Account was created")))
}

async fn sign_in(
    State(state): State<SharedState>,
    Json(body): Json<SignIn>,
) -> Result<impl IntoResponse, ApiError> {
    let rejected = || ApiError::Unauthorized("Incorrect email or password".to_string());

    let user = state
        .repo
        .user_by_email(&body.email)
        .await?
        .ok_or_else(rejected)?;

    if !state
        .passwords
        .verify(&body.password, &user.password_hash)
        .await?
    {
        return Err(rejected());
    }

    let token = state.keys.issue(user.id)?;
    let cookie = state.keys.cookie(&token);

    Ok((
        [(SET_COOKIE, cookie)],
        Json(json!({
            "success": true,
            "message": "Login successful",
            "token": token,
        })),
    ))
}

async fn get_info(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let cached = state.profile(user.id).await?;

    Ok(Json(json!({
        "success": true,
        "info": cached.value,
        "source": cached.source,
    })))
}

async fn edit_password(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<EditPassword>,
) -> Result<Json<Ack>, ApiError> {
    if !state
        .passwords
        .verify(&body.old_password, &user.password_hash)
        .await?
    {
        return Err(ApiError::bad_request("Incorrect password"));
    }

    if body.new_password != body.repeat_new_password {
        return Err(ApiError::bad_request("The passwords don't match"));
    }

    let password_hash = state.passwords.hash(&body.new_password).await?;
    state
        .repo
        .update_user(
            user.id,
            UserPatch {
                password_hash: Some(password_hash),
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(Ack::new("Password was changed")))
}

async fn edit_name(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<EditName>,
) -> Result<Json<Ack>, ApiError> {
    if !state
        .passwords
        .verify(&body.password, &user.password_hash)
        .await?
    {
        return Err(ApiError::bad_request("Incorrect password"));
    }

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

    Ok(Json(Ack::new("Name was changed")))
}

async fn delete_user(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<PasswordConfirmation>,
) -> Result<Json<Ack>, ApiError> {
    if !state
        .passwords
        .verify(&body.password, &user.password_hash)
        .await?
    {
        return Err(ApiError::bad_request("Incorrect password"));
    }

    let removed = state.repo.delete_user(user.id).await?;
    state.invalidate_profile(user.id).await;
    state.bump_cascade(removed).await;

    tracing::info!(user_id = user.id, ?removed, "account deleted");
    Ok(Json(Ack::new("Account was deleted")))
}

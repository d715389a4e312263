use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{FieldValidator, check_email, check_password};
use super::{ApiError, ApiResponse, AppState, TokenDto, UserDto};
use crate::db::{CreateUserError, NewUser};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateTokenRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// POST /user/create
/// Public registration; staff/superuser flags are never settable here.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), ApiError> {
    let min_length = state.config.security.min_password_length;

    let mut validator = FieldValidator::new();
    validator.check("email", check_email(&payload.email));
    validator.check("password", check_password(&payload.password, min_length));
    validator.finish()?;

    let new_user = NewUser::member(&payload.email, &payload.password, &payload.name);

    let user = state
        .store()
        .create_user(new_user, Some(&state.config.security))
        .await
        .map_err(|e| match e {
            CreateUserError::BlankEmail => {
                ApiError::validation_field("email", "This field may not be blank.")
            }
            CreateUserError::DuplicateEmail => {
                ApiError::validation_field("email", "A user with this email already exists.")
            }
            CreateUserError::Other(err) => {
                ApiError::internal(format!("Failed to create user: {err}"))
            }
        })?;

    tracing::info!(user_id = user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UserDto::from(user))),
    ))
}

/// POST /user/token
/// Exchange credentials for the auth token. Failures are 400 with no token
/// field and no hint whether the email exists.
pub async fn create_token(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateTokenRequest>,
) -> Result<Json<ApiResponse<TokenDto>>, ApiError> {
    let mut validator = FieldValidator::new();
    if payload.email.trim().is_empty() {
        validator.add("email", "This field may not be blank.");
    }
    if payload.password.is_empty() {
        validator.add("password", "This field may not be blank.");
    }
    validator.finish()?;

    let user = state
        .store()
        .verify_credentials(&payload.email, &payload.password)
        .await
        .map_err(|e| ApiError::internal(format!("Authentication error: {e}")))?;

    match user {
        Some(user) => Ok(Json(ApiResponse::success(TokenDto { token: user.token }))),
        None => Err(ApiError::validation_general(
            "Unable to authenticate with provided credentials.",
        )),
    }
}

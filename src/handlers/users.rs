use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::error::AppError;
use crate::models::account::{CreateUserRequest, UserResponse};
use crate::password::hash_password;
use crate::validation::{validate_email, validate_name, validate_password};
use crate::AppState;

/// POST /api/user/create/ — register a new account.
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = payload?;

    tracing::info!(handler = "create_user", "Handler: POST /api/user/create/");

    let email = validate_email(&body.email)?;
    let name = validate_name(&body.name)?;
    validate_password(&body.password, state.min_password_length)?;

    if state.repo.email_exists(&email).await? {
        tracing::warn!(handler = "create_user", "Validation failed: email taken");
        return Err(AppError::BadRequest(
            "user with this email already exists".into(),
        ));
    }

    let password_hash = hash_password(&body.password)?;

    tracing::debug!(handler = "create_user", "Dispatching to repo.create_account");
    let account = state
        .repo
        .create_account(&email, &name, &password_hash)
        .await?;

    tracing::info!(
        handler = "create_user",
        user_id = account.id,
        status = 201,
        "Responding: account created"
    );

    Ok((StatusCode::CREATED, Json(UserResponse::from(&account))))
}

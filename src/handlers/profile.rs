use axum::{extract::rejection::JsonRejection, extract::State, response::IntoResponse, Extension, Json};

use crate::error::AppError;
use crate::middleware::auth::CurrentAccount;
use crate::models::account::{AccountChanges, UpdateUserRequest, UserResponse};
use crate::password::hash_password;
use crate::validation::{validate_email, validate_name, validate_password};
use crate::AppState;

/// GET /api/user/me/ — the authenticated account's profile.
pub async fn get_profile(
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> impl IntoResponse {
    tracing::info!(
        handler = "get_profile",
        user_id = account.id,
        status = 200,
        "Handler: GET /api/user/me/"
    );

    Json(UserResponse::from(&account))
}

/// PATCH /api/user/me/ — partial update of name, email and password.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = payload?;

    tracing::info!(
        handler = "update_profile",
        user_id = account.id,
        "Handler: PATCH /api/user/me/"
    );

    let mut changes = AccountChanges::default();

    if let Some(name) = body.name.as_deref() {
        changes.name = Some(validate_name(name)?);
    }

    if let Some(email) = body.email.as_deref() {
        let email = validate_email(email)?;
        if email != account.email && state.repo.email_exists(&email).await? {
            return Err(AppError::BadRequest(
                "user with this email already exists".into(),
            ));
        }
        changes.email = Some(email);
    }

    if let Some(password) = body.password.as_deref() {
        validate_password(password, state.min_password_length)?;
        changes.password_hash = Some(hash_password(password)?);
    }

    if changes.is_empty() {
        tracing::debug!(handler = "update_profile", "Nothing to update");
        return Ok(Json(UserResponse::from(&account)));
    }

    tracing::debug!(handler = "update_profile", "Dispatching to repo.update_account");
    let updated = state.repo.update_account(account.id, &changes).await?;

    tracing::info!(
        handler = "update_profile",
        user_id = updated.id,
        status = 200,
        "Responding: profile updated"
    );

    Ok(Json(UserResponse::from(&updated)))
}

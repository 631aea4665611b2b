use axum::{extract::rejection::JsonRejection, extract::State, response::IntoResponse, Json};

use crate::error::AppError;
use crate::models::token::{TokenRequest, TokenResponse};
use crate::password::verify_password;
use crate::token::generate_token;
use crate::util::token_prefix;
use crate::validation::normalize_email;
use crate::AppState;

const INVALID_CREDENTIALS: &str = "Unable to authenticate with provided credentials";

/// POST /api/user/token/ — exchange email and password for an auth token.
pub async fn issue_token(
    State(state): State<AppState>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = payload?;

    tracing::info!(handler = "issue_token", "Handler: POST /api/user/token/");

    let email = normalize_email(&body.email);
    if email.is_empty() || body.password.is_empty() {
        return Err(AppError::BadRequest(
            "Must include \"email\" and \"password\"".into(),
        ));
    }

    let account = match state.repo.find_by_email(&email).await? {
        Some(account) => account,
        None => {
            tracing::debug!(handler = "issue_token", "No account for email");
            return Err(AppError::BadRequest(INVALID_CREDENTIALS.into()));
        }
    };

    if !verify_password(&body.password, &account.password_hash)? {
        tracing::debug!(handler = "issue_token", user_id = account.id, "Password mismatch");
        return Err(AppError::BadRequest(INVALID_CREDENTIALS.into()));
    }

    let token = state
        .repo
        .get_or_create_token(account.id, &generate_token())
        .await?;

    tracing::info!(
        handler = "issue_token",
        user_id = account.id,
        token = %token_prefix(&token),
        status = 200,
        "Responding: token issued"
    );

    Ok(Json(TokenResponse { token }))
}

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::AppError;
use crate::models::account::Account;
use crate::token::is_valid_token;
use crate::util::token_prefix;
use crate::AppState;

const TOKEN_SCHEME: &str = "token";

/// Resolve `Authorization: Token <key>` to an account (scheme is case-insensitive).
/// Missing, malformed and unknown keys are all rejected with 401.
pub async fn require_auth_token(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let uri = req.uri().path().to_string();

    let key = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case(TOKEN_SCHEME))
        .map(|(_, key)| key.trim().to_string());

    let key = match key {
        Some(k) if is_valid_token(&k) => k,
        Some(_) => {
            tracing::warn!(method = %method, uri = %uri, "Auth middleware: rejected, malformed token");
            return AppError::Unauthorized("Invalid token".into()).into_response();
        }
        None => {
            tracing::warn!(
                method = %method,
                uri = %uri,
                "Auth middleware: rejected, missing Authorization header"
            );
            return AppError::Unauthorized("Authentication credentials were not provided".into())
                .into_response();
        }
    };

    match state.repo.find_by_token(&key).await {
        Ok(Some(account)) => {
            tracing::debug!(
                token = %token_prefix(&key),
                user_id = account.id,
                method = %method,
                uri = %uri,
                "Auth middleware: token valid, forwarding to handler"
            );
            req.extensions_mut().insert(CurrentAccount(account));
            next.run(req).await
        }
        Ok(None) => {
            tracing::warn!(
                token = %token_prefix(&key),
                method = %method,
                uri = %uri,
                "Auth middleware: rejected, unknown token"
            );
            AppError::Unauthorized("Invalid token".into()).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Extension holding the account the request was authenticated as.
#[derive(Debug, Clone)]
pub struct CurrentAccount(pub Account);

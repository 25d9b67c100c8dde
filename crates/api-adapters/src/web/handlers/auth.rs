use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use domains::{DomainError, TokenPair};

use crate::web::dto::{
    LoginRequest, LogoutRequest, RefreshRequest, VerificationEmailRequest, VerifyEmailRequest,
};
use crate::web::error::ApiResult;
use crate::web::extract::{ApiJson, CurrentUser};
use crate::web::AppState;

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<TokenPair>> {
    Ok(Json(state.services.auth.login(&req.email, &req.password).await?))
}

pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> ApiResult<Json<TokenPair>> {
    Ok(Json(state.services.auth.refresh(&req.refresh_token).await?))
}

/// The body is optional; when it carries a refresh token, that token is
/// revoked along with the access token.
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    body: Bytes,
) -> ApiResult<StatusCode> {
    let req: LogoutRequest = if body.iter().all(u8::is_ascii_whitespace) {
        LogoutRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| DomainError::Validation(e.to_string()))?
    };
    state
        .services
        .auth
        .logout(&actor, req.refresh_token.as_deref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn send_verification_email(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<VerificationEmailRequest>,
) -> ApiResult<StatusCode> {
    state.services.auth.send_verification_email(&req.email).await?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn verify_email(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<VerifyEmailRequest>,
) -> ApiResult<StatusCode> {
    state.services.auth.verify_email(&req.email, &req.code).await?;
    Ok(StatusCode::NO_CONTENT)
}

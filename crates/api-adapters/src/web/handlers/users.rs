use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use domains::{BoardSummary, CloneSummary, UserInfo, UserStatistics};

use crate::web::dto::{SignupRequest, UpdateNicknameRequest};
use crate::web::error::ApiResult;
use crate::web::extract::{ApiJson, CurrentUser};
use crate::web::AppState;

pub async fn signup(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> ApiResult<(StatusCode, Json<UserInfo>)> {
    let user = state
        .services
        .users
        .signup(&req.email, &req.password, req.nickname.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn me(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> ApiResult<Json<UserInfo>> {
    Ok(Json(state.services.users.get_me(&actor).await?))
}

pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiJson(req): ApiJson<UpdateNicknameRequest>,
) -> ApiResult<Json<UserInfo>> {
    let user = state
        .services
        .users
        .update_nickname(&actor, req.nickname.as_deref())
        .await?;
    Ok(Json(user))
}

pub async fn my_clones(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> ApiResult<Json<Vec<CloneSummary>>> {
    Ok(Json(state.services.clones.list_mine(&actor).await?))
}

/// Boards that any of the caller's clones subscribe to.
pub async fn my_boards(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> ApiResult<Json<Vec<BoardSummary>>> {
    Ok(Json(state.services.boards.list_subscribed(&actor).await?))
}

pub async fn my_statistics(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> ApiResult<Json<UserStatistics>> {
    Ok(Json(state.services.users.statistics(&actor).await?))
}

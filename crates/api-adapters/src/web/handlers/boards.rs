use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use domains::{BoardSummary, CloneInBoard};
use uuid::Uuid;

use crate::web::dto::{CreateBoardRequest, SubscriptionRequest, UpdateBoardRequest};
use crate::web::error::ApiResult;
use crate::web::extract::{ApiJson, ApiPath, CurrentUser, MaybeUser};
use crate::web::AppState;

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiJson(req): ApiJson<CreateBoardRequest>,
) -> ApiResult<(StatusCode, Json<BoardSummary>)> {
    let board = state
        .services
        .boards
        .create(&actor, &req.name, req.description.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(board)))
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<BoardSummary>>> {
    Ok(Json(state.services.boards.list().await?))
}

pub async fn get(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<BoardSummary>> {
    Ok(Json(state.services.boards.get(id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateBoardRequest>,
) -> ApiResult<Json<BoardSummary>> {
    Ok(Json(state.services.boards.update(&actor, id, req.into()).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.services.boards.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Active clones of a board; `isMine` is set for the caller's own clones.
pub async fn clones(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<CloneInBoard>>> {
    Ok(Json(state.services.boards.list_clones(id, viewer.as_ref()).await?))
}

pub async fn subscribe(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiPath(board_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<SubscriptionRequest>,
) -> ApiResult<StatusCode> {
    state
        .services
        .subscriptions
        .subscribe(&actor, board_id, req.clone_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unsubscribe(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiPath(board_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<SubscriptionRequest>,
) -> ApiResult<StatusCode> {
    state
        .services
        .subscriptions
        .unsubscribe(&actor, board_id, req.clone_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

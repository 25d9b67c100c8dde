use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use domains::{BoardSummary, CloneStatistics, CloneSummary};
use uuid::Uuid;

use crate::web::dto::{CreateCloneRequest, UpdateCloneRequest};
use crate::web::error::ApiResult;
use crate::web::extract::{ApiJson, ApiPath, CurrentUser};
use crate::web::AppState;

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiJson(req): ApiJson<CreateCloneRequest>,
) -> ApiResult<(StatusCode, Json<CloneSummary>)> {
    let clone = state.services.clones.create(&actor, req.into()).await?;
    Ok((StatusCode::CREATED, Json(clone)))
}

pub async fn get(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<CloneSummary>> {
    Ok(Json(state.services.clones.get(id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateCloneRequest>,
) -> ApiResult<Json<CloneSummary>> {
    Ok(Json(state.services.clones.update(&actor, id, req.into()).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.services.clones.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn statistics(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<CloneStatistics>> {
    Ok(Json(state.services.clones.statistics(id).await?))
}

pub async fn boards(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<BoardSummary>>> {
    Ok(Json(state.services.boards.list_for_clone(id).await?))
}

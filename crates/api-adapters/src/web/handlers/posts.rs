use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use domains::{DomainError, PostView};
use uuid::Uuid;

use crate::metrics::GenerationKind;
use crate::web::dto::CreatePostRequest;
use crate::web::error::ApiResult;
use crate::web::extract::{ApiJson, ApiPath, CurrentUser};
use crate::web::AppState;

/// Asks the AI service to write a post for `cloneId` on board `{id}`.
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiPath(board_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<CreatePostRequest>,
) -> ApiResult<(StatusCode, Json<PostView>)> {
    let result = state
        .services
        .posts
        .create_post(&actor, board_id, req.clone_id)
        .await;
    match &result {
        Ok(_) => state.metrics.record_generation(GenerationKind::Post, true),
        Err(DomainError::ExternalService(_)) => {
            state.metrics.record_generation(GenerationKind::Post, false)
        }
        Err(_) => {}
    }
    Ok((StatusCode::CREATED, Json(result?)))
}

/// Counts as a view.
pub async fn get(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<PostView>> {
    Ok(Json(state.services.posts.get_post(id).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.services.posts.delete_post(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_by_board(
    State(state): State<AppState>,
    ApiPath(board_id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<PostView>>> {
    Ok(Json(state.services.posts.list_by_board(board_id).await?))
}

pub async fn list_by_clone(
    State(state): State<AppState>,
    ApiPath(clone_id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<PostView>>> {
    Ok(Json(state.services.posts.list_by_clone(clone_id).await?))
}

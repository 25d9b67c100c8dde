use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use domains::{DomainError, ReplyView};
use uuid::Uuid;

use crate::metrics::GenerationKind;
use crate::web::dto::CreateReplyRequest;
use crate::web::error::ApiResult;
use crate::web::extract::{ApiJson, ApiPath, CurrentUser};
use crate::web::AppState;

/// Asks the AI service to write a reply on post `{id}`, optionally under
/// `parentReplyId`.
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiPath(post_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<CreateReplyRequest>,
) -> ApiResult<(StatusCode, Json<ReplyView>)> {
    let result = state
        .services
        .replies
        .create_reply(&actor, post_id, req.clone_id, req.parent_reply_id)
        .await;
    match &result {
        Ok(_) => state.metrics.record_generation(GenerationKind::Reply, true),
        Err(DomainError::ExternalService(_)) => {
            state.metrics.record_generation(GenerationKind::Reply, false)
        }
        Err(_) => {}
    }
    Ok((StatusCode::CREATED, Json(result?)))
}

pub async fn get(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<ReplyView>> {
    Ok(Json(state.services.replies.get_reply(id).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.services.replies.delete_reply(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Flat, oldest first.
pub async fn list_by_post(
    State(state): State<AppState>,
    ApiPath(post_id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<ReplyView>>> {
    Ok(Json(state.services.replies.list_by_post(post_id).await?))
}

pub async fn list_by_clone(
    State(state): State<AppState>,
    ApiPath(clone_id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<ReplyView>>> {
    Ok(Json(state.services.replies.list_by_clone(clone_id).await?))
}

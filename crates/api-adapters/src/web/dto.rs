//! Request bodies. Responses are the domain views, serialized as-is.

use serde::Deserialize;
use services::{CreateClone, UpdateBoard, UpdateClone};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub nickname: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNicknameRequest {
    pub nickname: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationEmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmailRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBoardRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBoardRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl From<UpdateBoardRequest> for UpdateBoard {
    fn from(req: UpdateBoardRequest) -> Self {
        UpdateBoard {
            name: req.name,
            description: req.description,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRequest {
    pub clone_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCloneRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub board_ids: Vec<Uuid>,
}

impl From<CreateCloneRequest> for CreateClone {
    fn from(req: CreateCloneRequest) -> Self {
        CreateClone {
            name: req.name,
            description: req.description,
            board_ids: req.board_ids,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCloneRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl From<UpdateCloneRequest> for UpdateClone {
    fn from(req: UpdateCloneRequest) -> Self {
        UpdateClone {
            name: req.name,
            description: req.description,
            is_active: req.is_active,
        }
    }
}

/// Body of `POST /boards/{id}/posts`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub clone_id: Uuid,
}

/// Body of `POST /posts/{id}/replies`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReplyRequest {
    pub clone_id: Uuid,
    pub parent_reply_id: Option<Uuid>,
}

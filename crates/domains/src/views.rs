//! Read projections returned by repositories and services.
//!
//! Each view joins just enough related rows for one screen; the API serializes
//! them as-is (camelCase).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{AiClone, Role, User};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub user_id: Uuid,
    pub email: String,
    pub nickname: String,
    pub role: Role,
    pub email_verified: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            nickname: user.nickname.clone(),
            role: user.role,
            email_verified: user.email_verified,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}

/// Board with its creator and live activity counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSummary {
    pub board_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_by: Uuid,
    pub created_by_nickname: String,
    /// Active subscriptions only
    pub clone_count: i64,
    pub post_count: i64,
    pub reply_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneSummary {
    pub clone_id: Uuid,
    pub user_id: Uuid,
    pub user_nickname: String,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl CloneSummary {
    pub fn from_clone(clone: &AiClone, user_nickname: String) -> Self {
        Self {
            clone_id: clone.id,
            user_id: clone.user_id,
            user_nickname,
            name: clone.name.clone(),
            description: clone.description.clone(),
            is_active: clone.is_active,
            created_at: clone.created_at,
        }
    }
}

/// A clone as listed on a board page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneInBoard {
    pub clone_id: Uuid,
    pub board_id: Uuid,
    pub owner_id: Uuid,
    pub clone_name: String,
    pub clone_description: Option<String>,
    /// Filled in by the service for the requesting user
    pub is_mine: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub post_id: Uuid,
    pub board_id: Uuid,
    pub clone_id: Uuid,
    pub board_name: String,
    pub clone_name: String,
    pub title: String,
    pub content: String,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Flat reply row; clients rebuild the tree from `parent_reply_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyView {
    pub reply_id: Uuid,
    pub post_id: Uuid,
    pub clone_id: Uuid,
    pub clone_name: String,
    pub parent_reply_id: Option<Uuid>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneStatistics {
    pub board_count: i64,
    pub post_count: i64,
    pub reply_count: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatistics {
    pub clone_count: i64,
    pub post_count: i64,
    pub reply_count: i64,
}

/// One of a clone's recent posts, as context for the AI service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostHistoryItem {
    pub board_name: String,
    pub post_title: String,
    pub post_content: String,
}

/// One of a clone's recent replies, as context for the AI service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyHistoryItem {
    pub post_title: String,
    pub content: String,
}

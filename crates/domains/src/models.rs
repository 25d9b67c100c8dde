//! # Domain Models
//!
//! These structs represent the core entities of AI Valley.
//! We use UUID v7 for time-ordered, globally unique identification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role. Stored as its upper-case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "USER" => Some(Role::User),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// A registered human account. Owns boards (as creator) and clones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    /// Argon2 PHC string, never the raw password
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub nickname: String,
    pub role: Role,
    pub is_active: bool,
    pub email_verified: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        email: String,
        password_hash: String,
        nickname: String,
        email_verified: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            email,
            password_hash,
            nickname,
            role: Role::User,
            is_active: true,
            email_verified,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A topic forum that clones subscribe to and post in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    pub id: Uuid,
    /// Creating user
    pub created_by: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Board {
    pub fn new(created_by: Uuid, name: String, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            created_by,
            name,
            description,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// An AI persona belonging to one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiClone {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    /// Persona prompt handed to the AI service
    pub description: Option<String>,
    /// Owner-controlled pause flag; inactive clones cannot author content
    pub is_active: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AiClone {
    pub fn new(user_id: Uuid, name: String, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            user_id,
            name,
            description,
            is_active: true,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

/// Subscription of a clone to a board. Keyed by `(clone_id, board_id)`;
/// unsubscribing flips `is_active` instead of deleting the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneBoard {
    pub clone_id: Uuid,
    pub board_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CloneBoard {
    pub fn new(clone_id: Uuid, board_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            clone_id,
            board_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// AI-authored post of a clone on a board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub board_id: Uuid,
    pub clone_id: Uuid,
    pub title: String,
    pub content: String,
    pub view_count: i64,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(board_id: Uuid, clone_id: Uuid, title: String, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            board_id,
            clone_id,
            title,
            content,
            view_count: 0,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// AI-authored reply of a clone on a post, optionally nested under a parent reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub id: Uuid,
    pub post_id: Uuid,
    pub clone_id: Uuid,
    pub parent_reply_id: Option<Uuid>,
    pub content: String,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reply {
    pub fn new(
        post_id: Uuid,
        clone_id: Uuid,
        parent_reply_id: Option<Uuid>,
        content: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            post_id,
            clone_id,
            parent_reply_id,
            content,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Pending or confirmed email ownership check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailVerification {
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
}

impl EmailVerification {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_verified(&self) -> bool {
        self.verified_at.is_some()
    }
}

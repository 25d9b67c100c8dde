//! # PgStore
//!
//! Maps the relational schema in `migrations/` onto the domain models.
//! Queries are checked at runtime (`sqlx::query`) so the crate builds without
//! a live database. Rows are decoded with `try_get`, never `get`.

use std::time::Duration;

use anyhow::Context;
use domains::{
    AiClone, Board, CloneBoard, DomainError, EmailVerification, Post, PostView, Reply, ReplyView,
    Role, User,
};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{error, info};

mod catalog;
mod content;
mod users;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await
            .context("failed to connect to postgres")?;
        info!(max_connections, "postgres pool ready");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("failed to run migrations")?;
        info!("database migrations applied");
        Ok(())
    }
}

/// Logs a store failure and hides it behind `Internal`.
fn db_error(err: sqlx::Error) -> DomainError {
    error!(error = %err, "database error");
    DomainError::internal(err)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

// ── Row mapping ─────────────────────────────────────────────────────────────

const USER_COLUMNS: &str = "id, email, password_hash, nickname, role, is_active, \
     email_verified, last_login_at, created_at, updated_at";

fn user_from_row(row: &PgRow) -> Result<User, DomainError> {
    let role: String = row.try_get("role").map_err(db_error)?;
    let role = Role::parse(&role)
        .with_context(|| format!("unknown role '{role}'"))
        .map_err(DomainError::internal)?;
    decode(|| {
        Ok(User {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            nickname: row.try_get("nickname")?,
            role,
            is_active: row.try_get("is_active")?,
            email_verified: row.try_get("email_verified")?,
            last_login_at: row.try_get("last_login_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    })
}

fn board_from_row(row: &PgRow) -> Result<Board, DomainError> {
    decode(|| {
        Ok(Board {
            id: row.try_get("id")?,
            created_by: row.try_get("created_by")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            is_deleted: row.try_get("is_deleted")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    })
}

fn clone_from_row(row: &PgRow) -> Result<AiClone, DomainError> {
    decode(|| {
        Ok(AiClone {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            is_active: row.try_get("is_active")?,
            is_deleted: row.try_get("is_deleted")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    })
}

fn subscription_from_row(row: &PgRow) -> Result<CloneBoard, DomainError> {
    decode(|| {
        Ok(CloneBoard {
            clone_id: row.try_get("clone_id")?,
            board_id: row.try_get("board_id")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    })
}

fn post_from_row(row: &PgRow) -> Result<Post, DomainError> {
    decode(|| {
        Ok(Post {
            id: row.try_get("id")?,
            board_id: row.try_get("board_id")?,
            clone_id: row.try_get("clone_id")?,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            view_count: row.try_get("view_count")?,
            is_deleted: row.try_get("is_deleted")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    })
}

fn reply_from_row(row: &PgRow) -> Result<Reply, DomainError> {
    decode(|| {
        Ok(Reply {
            id: row.try_get("id")?,
            post_id: row.try_get("post_id")?,
            clone_id: row.try_get("clone_id")?,
            parent_reply_id: row.try_get("parent_reply_id")?,
            content: row.try_get("content")?,
            is_deleted: row.try_get("is_deleted")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    })
}

fn verification_from_row(row: &PgRow) -> Result<EmailVerification, DomainError> {
    decode(|| {
        Ok(EmailVerification {
            email: row.try_get("email")?,
            code: row.try_get("code")?,
            expires_at: row.try_get("expires_at")?,
            verified_at: row.try_get("verified_at")?,
        })
    })
}

/// Columns: post_id, board_id, clone_id, board_name, clone_name, title,
/// content, view_count, created_at, updated_at.
const POST_VIEW_SELECT: &str = "SELECT p.id AS post_id, p.board_id, p.clone_id, \
     b.name AS board_name, c.name AS clone_name, p.title, p.content, p.view_count, \
     p.created_at, p.updated_at \
     FROM posts p \
     JOIN boards b ON b.id = p.board_id \
     JOIN clones c ON c.id = p.clone_id \
     WHERE NOT p.is_deleted";

fn post_view_from_row(row: &PgRow) -> Result<PostView, DomainError> {
    decode(|| {
        Ok(PostView {
            post_id: row.try_get("post_id")?,
            board_id: row.try_get("board_id")?,
            clone_id: row.try_get("clone_id")?,
            board_name: row.try_get("board_name")?,
            clone_name: row.try_get("clone_name")?,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            view_count: row.try_get("view_count")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    })
}

/// A reply is live only while its post is.
const REPLY_VIEW_SELECT: &str = "SELECT r.id AS reply_id, r.post_id, r.clone_id, \
     c.name AS clone_name, r.parent_reply_id, r.content, r.created_at \
     FROM replies r \
     JOIN posts p ON p.id = r.post_id \
     JOIN clones c ON c.id = r.clone_id \
     WHERE NOT r.is_deleted AND NOT p.is_deleted";

fn reply_view_from_row(row: &PgRow) -> Result<ReplyView, DomainError> {
    decode(|| {
        Ok(ReplyView {
            reply_id: row.try_get("reply_id")?,
            post_id: row.try_get("post_id")?,
            clone_id: row.try_get("clone_id")?,
            clone_name: row.try_get("clone_name")?,
            parent_reply_id: row.try_get("parent_reply_id")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
        })
    })
}

fn decode<T>(f: impl FnOnce() -> Result<T, sqlx::Error>) -> Result<T, DomainError> {
    f().map_err(db_error)
}

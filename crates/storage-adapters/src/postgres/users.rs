use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{
    DomainError, EmailVerification, Entity, Result, User, UserRepository, UserStatistics,
    VerificationRepository,
};
use sqlx::Row;
use uuid::Uuid;

use super::{
    db_error, decode, is_unique_violation, user_from_row, verification_from_row, PgStore,
    USER_COLUMNS,
};

#[async_trait]
impl UserRepository for PgStore {
    async fn insert(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, nickname, role, is_active, \
             email_verified, last_login_at, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.nickname)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(user.email_verified)
        .bind(user.last_login_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::DuplicateEmail(user.email.clone())
            } else {
                db_error(e)
            }
        })?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND is_active");
        sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .as_ref()
            .map(user_from_row)
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .as_ref()
            .map(user_from_row)
            .transpose()
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool> {
        let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1) AS taken")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
        decode(|| row.try_get("taken"))
    }

    async fn update_nickname(&self, id: Uuid, nickname: &str) -> Result<()> {
        let done = sqlx::query("UPDATE users SET nickname = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(nickname)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if done.rows_affected() == 0 {
            return Err(DomainError::not_found(Entity::User, id));
        }
        Ok(())
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE users SET last_login_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn statistics(&self, id: Uuid) -> Result<UserStatistics> {
        let row = sqlx::query(
            "SELECT \
               (SELECT COUNT(*) FROM clones c \
                 WHERE c.user_id = $1 AND NOT c.is_deleted) AS clone_count, \
               (SELECT COUNT(*) FROM posts p JOIN clones c ON c.id = p.clone_id \
                 WHERE c.user_id = $1 AND NOT c.is_deleted AND NOT p.is_deleted) AS post_count, \
               (SELECT COUNT(*) FROM replies r JOIN clones c ON c.id = r.clone_id \
                 JOIN posts p ON p.id = r.post_id \
                 WHERE c.user_id = $1 AND NOT c.is_deleted AND NOT r.is_deleted \
                 AND NOT p.is_deleted) AS reply_count",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        decode(|| {
            Ok(UserStatistics {
                clone_count: row.try_get("clone_count")?,
                post_count: row.try_get("post_count")?,
                reply_count: row.try_get("reply_count")?,
            })
        })
    }
}

#[async_trait]
impl VerificationRepository for PgStore {
    async fn upsert(&self, verification: &EmailVerification) -> Result<()> {
        sqlx::query(
            "INSERT INTO email_verifications (email, code, expires_at, verified_at) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (email) DO UPDATE \
             SET code = EXCLUDED.code, expires_at = EXCLUDED.expires_at, \
                 verified_at = EXCLUDED.verified_at",
        )
        .bind(&verification.email)
        .bind(&verification.code)
        .bind(verification.expires_at)
        .bind(verification.verified_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn find(&self, email: &str) -> Result<Option<EmailVerification>> {
        sqlx::query(
            "SELECT email, code, expires_at, verified_at FROM email_verifications WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .as_ref()
        .map(verification_from_row)
        .transpose()
    }

    async fn mark_verified(&self, email: &str, at: DateTime<Utc>) -> Result<()> {
        let done = sqlx::query("UPDATE email_verifications SET verified_at = $2 WHERE email = $1")
            .bind(email)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if done.rows_affected() == 0 {
            return Err(DomainError::Validation(format!(
                "no verification pending for {email}"
            )));
        }
        Ok(())
    }
}

//! Boards, clones and the subscriptions between them.

use async_trait::async_trait;
use domains::{
    AiClone, Board, BoardRepository, BoardSummary, CloneBoard, CloneInBoard, CloneRepository,
    CloneStatistics, CloneSummary, DomainError, Entity, Result, SubscriptionRepository,
};
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use super::{
    board_from_row, clone_from_row, db_error, decode, is_unique_violation, subscription_from_row,
    PgStore,
};

/// Live boards with their creator and live activity counts.
const BOARD_SUMMARY_SELECT: &str = "SELECT b.id, b.name, b.description, b.created_by, \
     u.nickname AS created_by_nickname, \
     (SELECT COUNT(*) FROM clone_boards cb JOIN clones c ON c.id = cb.clone_id \
       WHERE cb.board_id = b.id AND cb.is_active AND NOT c.is_deleted) AS clone_count, \
     (SELECT COUNT(*) FROM posts p WHERE p.board_id = b.id AND NOT p.is_deleted) AS post_count, \
     (SELECT COUNT(*) FROM replies r JOIN posts p ON p.id = r.post_id \
       WHERE p.board_id = b.id AND NOT p.is_deleted AND NOT r.is_deleted) AS reply_count, \
     b.created_at, b.updated_at \
     FROM boards b JOIN users u ON u.id = b.created_by \
     WHERE NOT b.is_deleted";

const BOARD_ORDER: &str = "ORDER BY b.created_at DESC, b.id DESC";

fn board_summary_from_row(row: &PgRow) -> Result<BoardSummary> {
    decode(|| {
        Ok(BoardSummary {
            board_id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            created_by: row.try_get("created_by")?,
            created_by_nickname: row.try_get("created_by_nickname")?,
            clone_count: row.try_get("clone_count")?,
            post_count: row.try_get("post_count")?,
            reply_count: row.try_get("reply_count")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    })
}

const CLONE_SUMMARY_SELECT: &str = "SELECT c.id, c.user_id, u.nickname AS user_nickname, \
     c.name, c.description, c.is_active, c.created_at \
     FROM clones c JOIN users u ON u.id = c.user_id \
     WHERE NOT c.is_deleted";

fn clone_summary_from_row(row: &PgRow) -> Result<CloneSummary> {
    decode(|| {
        Ok(CloneSummary {
            clone_id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            user_nickname: row.try_get("user_nickname")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
        })
    })
}

impl PgStore {
    async fn board_summaries(&self, filter: &str, id: Option<Uuid>) -> Result<Vec<BoardSummary>> {
        let sql = format!("{BOARD_SUMMARY_SELECT} {filter} {BOARD_ORDER}");
        let mut query = sqlx::query(&sql);
        if let Some(id) = id {
            query = query.bind(id);
        }
        query
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?
            .iter()
            .map(board_summary_from_row)
            .collect()
    }
}

#[async_trait]
impl BoardRepository for PgStore {
    async fn insert(&self, board: &Board) -> Result<()> {
        sqlx::query(
            "INSERT INTO boards \
             (id, created_by, name, description, is_deleted, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(board.id)
        .bind(board.created_by)
        .bind(&board.name)
        .bind(&board.description)
        .bind(board.is_deleted)
        .bind(board.created_at)
        .bind(board.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Board>> {
        sqlx::query("SELECT * FROM boards WHERE id = $1 AND NOT is_deleted")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .as_ref()
            .map(board_from_row)
            .transpose()
    }

    async fn summary(&self, id: Uuid) -> Result<Option<BoardSummary>> {
        let sql = format!("{BOARD_SUMMARY_SELECT} AND b.id = $1");
        sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .as_ref()
            .map(board_summary_from_row)
            .transpose()
    }

    async fn list_summaries(&self) -> Result<Vec<BoardSummary>> {
        self.board_summaries("", None).await
    }

    async fn list_subscribed_by_user(&self, user_id: Uuid) -> Result<Vec<BoardSummary>> {
        self.board_summaries(
            "AND EXISTS (SELECT 1 FROM clone_boards cb JOIN clones c ON c.id = cb.clone_id \
             WHERE cb.board_id = b.id AND cb.is_active AND NOT c.is_deleted AND c.user_id = $1)",
            Some(user_id),
        )
        .await
    }

    async fn list_subscribed_by_clone(&self, clone_id: Uuid) -> Result<Vec<BoardSummary>> {
        self.board_summaries(
            "AND EXISTS (SELECT 1 FROM clone_boards cb \
             WHERE cb.board_id = b.id AND cb.is_active AND cb.clone_id = $1)",
            Some(clone_id),
        )
        .await
    }

    async fn update(&self, board: &Board) -> Result<()> {
        let done = sqlx::query(
            "UPDATE boards SET name = $2, description = $3, updated_at = $4 \
             WHERE id = $1 AND NOT is_deleted",
        )
        .bind(board.id)
        .bind(&board.name)
        .bind(&board.description)
        .bind(board.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        if done.rows_affected() == 0 {
            return Err(DomainError::not_found(Entity::Board, board.id));
        }
        Ok(())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<()> {
        let done = sqlx::query(
            "UPDATE boards SET is_deleted = TRUE, updated_at = now() \
             WHERE id = $1 AND NOT is_deleted",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        if done.rows_affected() == 0 {
            return Err(DomainError::not_found(Entity::Board, id));
        }
        Ok(())
    }
}

#[async_trait]
impl CloneRepository for PgStore {
    async fn insert(&self, clone: &AiClone) -> Result<()> {
        sqlx::query(
            "INSERT INTO clones \
             (id, user_id, name, description, is_active, is_deleted, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(clone.id)
        .bind(clone.user_id)
        .bind(&clone.name)
        .bind(&clone.description)
        .bind(clone.is_active)
        .bind(clone.is_deleted)
        .bind(clone.created_at)
        .bind(clone.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AiClone>> {
        sqlx::query("SELECT * FROM clones WHERE id = $1 AND NOT is_deleted")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .as_ref()
            .map(clone_from_row)
            .transpose()
    }

    async fn summary(&self, id: Uuid) -> Result<Option<CloneSummary>> {
        let sql = format!("{CLONE_SUMMARY_SELECT} AND c.id = $1");
        sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .as_ref()
            .map(clone_summary_from_row)
            .transpose()
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<CloneSummary>> {
        let sql = format!(
            "{CLONE_SUMMARY_SELECT} AND c.user_id = $1 ORDER BY c.created_at DESC, c.id DESC"
        );
        sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?
            .iter()
            .map(clone_summary_from_row)
            .collect()
    }

    async fn list_in_board(&self, board_id: Uuid) -> Result<Vec<CloneInBoard>> {
        let rows = sqlx::query(
            "SELECT c.id, c.user_id, c.name, c.description \
             FROM clone_boards cb JOIN clones c ON c.id = cb.clone_id \
             WHERE cb.board_id = $1 AND cb.is_active AND NOT c.is_deleted \
             ORDER BY cb.created_at, c.id",
        )
        .bind(board_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter()
            .map(|row| {
                decode(|| {
                    Ok(CloneInBoard {
                        clone_id: row.try_get("id")?,
                        board_id,
                        owner_id: row.try_get("user_id")?,
                        clone_name: row.try_get("name")?,
                        clone_description: row.try_get("description")?,
                        is_mine: false,
                    })
                })
            })
            .collect()
    }

    async fn update(&self, clone: &AiClone) -> Result<()> {
        let done = sqlx::query(
            "UPDATE clones SET name = $2, description = $3, is_active = $4, updated_at = $5 \
             WHERE id = $1 AND NOT is_deleted",
        )
        .bind(clone.id)
        .bind(&clone.name)
        .bind(&clone.description)
        .bind(clone.is_active)
        .bind(clone.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        if done.rows_affected() == 0 {
            return Err(DomainError::not_found(Entity::Clone, clone.id));
        }
        Ok(())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let done = sqlx::query(
            "UPDATE clones SET is_deleted = TRUE, updated_at = now() \
             WHERE id = $1 AND NOT is_deleted",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;
        if done.rows_affected() == 0 {
            return Err(DomainError::not_found(Entity::Clone, id));
        }

        sqlx::query(
            "UPDATE clone_boards SET is_active = FALSE, updated_at = now() \
             WHERE clone_id = $1 AND is_active",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)
    }

    async fn statistics(&self, id: Uuid) -> Result<CloneStatistics> {
        let row = sqlx::query(
            "SELECT \
               (SELECT COUNT(*) FROM clone_boards cb JOIN boards b ON b.id = cb.board_id \
                 WHERE cb.clone_id = $1 AND cb.is_active AND NOT b.is_deleted) AS board_count, \
               (SELECT COUNT(*) FROM posts WHERE clone_id = $1 AND NOT is_deleted) AS post_count, \
               (SELECT COUNT(*) FROM replies r JOIN posts p ON p.id = r.post_id \
                 WHERE r.clone_id = $1 AND NOT r.is_deleted AND NOT p.is_deleted) AS reply_count",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        decode(|| {
            Ok(CloneStatistics {
                board_count: row.try_get("board_count")?,
                post_count: row.try_get("post_count")?,
                reply_count: row.try_get("reply_count")?,
            })
        })
    }
}

#[async_trait]
impl SubscriptionRepository for PgStore {
    async fn find(&self, clone_id: Uuid, board_id: Uuid) -> Result<Option<CloneBoard>> {
        sqlx::query("SELECT * FROM clone_boards WHERE clone_id = $1 AND board_id = $2")
            .bind(clone_id)
            .bind(board_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .as_ref()
            .map(subscription_from_row)
            .transpose()
    }

    async fn insert(&self, subscription: &CloneBoard) -> Result<()> {
        sqlx::query(
            "INSERT INTO clone_boards (clone_id, board_id, is_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(subscription.clone_id)
        .bind(subscription.board_id)
        .bind(subscription.is_active)
        .bind(subscription.created_at)
        .bind(subscription.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::AlreadySubscribed {
                    clone_id: subscription.clone_id,
                    board_id: subscription.board_id,
                }
            } else {
                db_error(e)
            }
        })?;
        Ok(())
    }

    async fn set_active(&self, clone_id: Uuid, board_id: Uuid, active: bool) -> Result<bool> {
        let done = sqlx::query(
            "UPDATE clone_boards SET is_active = $3, updated_at = now() \
             WHERE clone_id = $1 AND board_id = $2 AND is_active <> $3",
        )
        .bind(clone_id)
        .bind(board_id)
        .bind(active)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        if done.rows_affected() == 1 {
            return Ok(true);
        }
        match self.find(clone_id, board_id).await? {
            Some(_) => Ok(false),
            None => Err(DomainError::not_found(
                Entity::Subscription,
                format!("{clone_id}/{board_id}"),
            )),
        }
    }
}

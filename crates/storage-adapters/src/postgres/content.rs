//! Posts and replies.

use async_trait::async_trait;
use domains::{
    DomainError, Entity, Post, PostHistoryItem, PostRepository, PostView, Reply, ReplyHistoryItem,
    ReplyRepository, ReplyView, Result,
};
use sqlx::Row;
use uuid::Uuid;

use super::{
    db_error, decode, post_from_row, post_view_from_row, reply_from_row, reply_view_from_row,
    sql_limit, PgStore, POST_VIEW_SELECT, REPLY_VIEW_SELECT,
};

#[async_trait]
impl PostRepository for PgStore {
    async fn insert(&self, post: &Post) -> Result<()> {
        sqlx::query(
            "INSERT INTO posts \
             (id, board_id, clone_id, title, content, view_count, is_deleted, \
              created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(post.id)
        .bind(post.board_id)
        .bind(post.clone_id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.view_count)
        .bind(post.is_deleted)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>> {
        sqlx::query("SELECT * FROM posts WHERE id = $1 AND NOT is_deleted")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .as_ref()
            .map(post_from_row)
            .transpose()
    }

    async fn view(&self, id: Uuid) -> Result<Option<PostView>> {
        let sql = format!("{POST_VIEW_SELECT} AND p.id = $1");
        sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .as_ref()
            .map(post_view_from_row)
            .transpose()
    }

    /// Single-statement increment; concurrent readers never lose a count.
    async fn increment_views(&self, id: Uuid) -> Result<()> {
        let done = sqlx::query(
            "UPDATE posts SET view_count = view_count + 1 WHERE id = $1 AND NOT is_deleted",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        if done.rows_affected() == 0 {
            return Err(DomainError::not_found(Entity::Post, id));
        }
        Ok(())
    }

    async fn list_by_board(&self, board_id: Uuid) -> Result<Vec<PostView>> {
        let sql = format!(
            "{POST_VIEW_SELECT} AND p.board_id = $1 ORDER BY p.created_at DESC, p.id DESC"
        );
        sqlx::query(&sql)
            .bind(board_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?
            .iter()
            .map(post_view_from_row)
            .collect()
    }

    async fn list_by_clone(&self, clone_id: Uuid) -> Result<Vec<PostView>> {
        let sql = format!(
            "{POST_VIEW_SELECT} AND p.clone_id = $1 ORDER BY p.created_at DESC, p.id DESC"
        );
        sqlx::query(&sql)
            .bind(clone_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?
            .iter()
            .map(post_view_from_row)
            .collect()
    }

    async fn recent_for_clone(&self, clone_id: Uuid, limit: usize) -> Result<Vec<PostHistoryItem>> {
        let rows = sqlx::query(
            "SELECT b.name AS board_name, p.title, p.content \
             FROM posts p JOIN boards b ON b.id = p.board_id \
             WHERE p.clone_id = $1 AND NOT p.is_deleted \
             ORDER BY p.created_at DESC, p.id DESC \
             LIMIT $2",
        )
        .bind(clone_id)
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter()
            .map(|row| {
                decode(|| {
                    Ok(PostHistoryItem {
                        board_name: row.try_get("board_name")?,
                        post_title: row.try_get("title")?,
                        post_content: row.try_get("content")?,
                    })
                })
            })
            .collect()
    }

    async fn soft_delete(&self, id: Uuid) -> Result<()> {
        let done = sqlx::query(
            "UPDATE posts SET is_deleted = TRUE, updated_at = now() \
             WHERE id = $1 AND NOT is_deleted",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        if done.rows_affected() == 0 {
            return Err(DomainError::not_found(Entity::Post, id));
        }
        Ok(())
    }
}

#[async_trait]
impl ReplyRepository for PgStore {
    async fn insert(&self, reply: &Reply) -> Result<()> {
        sqlx::query(
            "INSERT INTO replies \
             (id, post_id, clone_id, parent_reply_id, content, is_deleted, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(reply.id)
        .bind(reply.post_id)
        .bind(reply.clone_id)
        .bind(reply.parent_reply_id)
        .bind(&reply.content)
        .bind(reply.is_deleted)
        .bind(reply.created_at)
        .bind(reply.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Reply>> {
        sqlx::query(
            "SELECT r.* FROM replies r JOIN posts p ON p.id = r.post_id \
             WHERE r.id = $1 AND NOT r.is_deleted AND NOT p.is_deleted",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .as_ref()
        .map(reply_from_row)
        .transpose()
    }

    async fn view(&self, id: Uuid) -> Result<Option<ReplyView>> {
        let sql = format!("{REPLY_VIEW_SELECT} AND r.id = $1");
        sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .as_ref()
            .map(reply_view_from_row)
            .transpose()
    }

    async fn list_by_post(&self, post_id: Uuid) -> Result<Vec<ReplyView>> {
        let sql = format!("{REPLY_VIEW_SELECT} AND r.post_id = $1 ORDER BY r.created_at, r.id");
        sqlx::query(&sql)
            .bind(post_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?
            .iter()
            .map(reply_view_from_row)
            .collect()
    }

    async fn list_by_clone(&self, clone_id: Uuid) -> Result<Vec<ReplyView>> {
        let sql = format!(
            "{REPLY_VIEW_SELECT} AND r.clone_id = $1 ORDER BY r.created_at DESC, r.id DESC"
        );
        sqlx::query(&sql)
            .bind(clone_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?
            .iter()
            .map(reply_view_from_row)
            .collect()
    }

    async fn recent_for_clone(
        &self,
        clone_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ReplyHistoryItem>> {
        let rows = sqlx::query(
            "SELECT p.title, r.content \
             FROM replies r JOIN posts p ON p.id = r.post_id \
             WHERE r.clone_id = $1 AND NOT r.is_deleted AND NOT p.is_deleted \
             ORDER BY r.created_at DESC, r.id DESC \
             LIMIT $2",
        )
        .bind(clone_id)
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter()
            .map(|row| {
                decode(|| {
                    Ok(ReplyHistoryItem {
                        post_title: row.try_get("title")?,
                        content: row.try_get("content")?,
                    })
                })
            })
            .collect()
    }

    async fn soft_delete(&self, id: Uuid) -> Result<()> {
        let done = sqlx::query(
            "UPDATE replies SET is_deleted = TRUE, updated_at = now() \
             WHERE id = $1 AND NOT is_deleted",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        if done.rows_affected() == 0 {
            return Err(DomainError::not_found(Entity::Reply, id));
        }
        Ok(())
    }
}

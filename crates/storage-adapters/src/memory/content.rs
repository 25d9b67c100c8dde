//! Posts and replies.

use async_trait::async_trait;
use chrono::Utc;
use domains::{
    DomainError, Entity, Post, PostHistoryItem, PostRepository, PostView, Reply, ReplyHistoryItem,
    ReplyRepository, ReplyView, Result,
};
use uuid::Uuid;

use super::{sort_newest_first, sort_oldest_first, MemoryStore};

impl MemoryStore {
    fn post_view(&self, post: &Post) -> PostView {
        let board_name = self
            .boards
            .get(&post.board_id)
            .map(|b| b.name.clone())
            .unwrap_or_default();
        PostView {
            post_id: post.id,
            board_id: post.board_id,
            clone_id: post.clone_id,
            board_name,
            clone_name: self.clone_name(post.clone_id),
            title: post.title.clone(),
            content: post.content.clone(),
            view_count: post.view_count,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }

    fn reply_view(&self, reply: &Reply) -> ReplyView {
        ReplyView {
            reply_id: reply.id,
            post_id: reply.post_id,
            clone_id: reply.clone_id,
            clone_name: self.clone_name(reply.clone_id),
            parent_reply_id: reply.parent_reply_id,
            content: reply.content.clone(),
            created_at: reply.created_at,
        }
    }

    /// Names survive soft deletion so old content still shows its author.
    fn clone_name(&self, id: Uuid) -> String {
        self.clones
            .get(&id)
            .map(|c| c.name.clone())
            .unwrap_or_default()
    }

    fn live_reply(&self, id: Uuid) -> Option<Reply> {
        let reply = self
            .replies
            .get(&id)
            .filter(|r| !r.is_deleted)
            .map(|r| r.value().clone())?;
        self.live_post(reply.post_id).map(|_| reply)
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn insert(&self, post: &Post) -> Result<()> {
        self.posts.insert(post.id, post.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>> {
        Ok(self.live_post(id))
    }

    async fn view(&self, id: Uuid) -> Result<Option<PostView>> {
        Ok(self.live_post(id).map(|p| self.post_view(&p)))
    }

    async fn increment_views(&self, id: Uuid) -> Result<()> {
        match self.posts.get_mut(&id) {
            Some(mut post) if !post.is_deleted => {
                post.view_count += 1;
                Ok(())
            }
            _ => Err(DomainError::not_found(Entity::Post, id)),
        }
    }

    async fn list_by_board(&self, board_id: Uuid) -> Result<Vec<PostView>> {
        let mut posts = self.live_posts_where(|p| p.board_id == board_id);
        sort_newest_first(&mut posts, |p| (p.created_at, p.id));
        Ok(posts.iter().map(|p| self.post_view(p)).collect())
    }

    async fn list_by_clone(&self, clone_id: Uuid) -> Result<Vec<PostView>> {
        let mut posts = self.live_posts_where(|p| p.clone_id == clone_id);
        sort_newest_first(&mut posts, |p| (p.created_at, p.id));
        Ok(posts.iter().map(|p| self.post_view(p)).collect())
    }

    async fn recent_for_clone(&self, clone_id: Uuid, limit: usize) -> Result<Vec<PostHistoryItem>> {
        let mut posts = self.live_posts_where(|p| p.clone_id == clone_id);
        sort_newest_first(&mut posts, |p| (p.created_at, p.id));
        Ok(posts
            .into_iter()
            .take(limit)
            .map(|p| PostHistoryItem {
                board_name: self
                    .boards
                    .get(&p.board_id)
                    .map(|b| b.name.clone())
                    .unwrap_or_default(),
                post_title: p.title,
                post_content: p.content,
            })
            .collect())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<()> {
        match self.posts.get_mut(&id) {
            Some(mut post) if !post.is_deleted => {
                post.is_deleted = true;
                post.updated_at = Utc::now();
                Ok(())
            }
            _ => Err(DomainError::not_found(Entity::Post, id)),
        }
    }
}

#[async_trait]
impl ReplyRepository for MemoryStore {
    async fn insert(&self, reply: &Reply) -> Result<()> {
        self.replies.insert(reply.id, reply.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Reply>> {
        Ok(self.live_reply(id))
    }

    async fn view(&self, id: Uuid) -> Result<Option<ReplyView>> {
        Ok(self.live_reply(id).map(|r| self.reply_view(&r)))
    }

    async fn list_by_post(&self, post_id: Uuid) -> Result<Vec<ReplyView>> {
        let mut replies = self.live_replies_where(|r| r.post_id == post_id);
        sort_oldest_first(&mut replies, |r| (r.created_at, r.id));
        Ok(replies.iter().map(|r| self.reply_view(r)).collect())
    }

    async fn list_by_clone(&self, clone_id: Uuid) -> Result<Vec<ReplyView>> {
        let mut replies = self.live_replies_where(|r| r.clone_id == clone_id);
        sort_newest_first(&mut replies, |r| (r.created_at, r.id));
        Ok(replies.iter().map(|r| self.reply_view(r)).collect())
    }

    async fn recent_for_clone(
        &self,
        clone_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ReplyHistoryItem>> {
        let mut replies = self.live_replies_where(|r| r.clone_id == clone_id);
        sort_newest_first(&mut replies, |r| (r.created_at, r.id));
        Ok(replies
            .into_iter()
            .filter_map(|r| {
                self.live_post(r.post_id).map(|post| ReplyHistoryItem {
                    post_title: post.title,
                    content: r.content,
                })
            })
            .take(limit)
            .collect())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<()> {
        match self.replies.get_mut(&id) {
            Some(mut reply) if !reply.is_deleted => {
                reply.is_deleted = true;
                reply.updated_at = Utc::now();
                Ok(())
            }
            _ => Err(DomainError::not_found(Entity::Reply, id)),
        }
    }
}

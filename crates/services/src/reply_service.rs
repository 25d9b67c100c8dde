//! # ReplyService
//!
//! AI reply generation and reply reads. A reply may hang under a parent reply
//! of the same post; the parent is resolved before the AI service is asked
//! for anything.

use std::sync::Arc;

use domains::{
    AuthUser, BoardRepository, CloneRepository, ContentGenerator, DomainError, Entity,
    PostGenerationRequest, PostRepository, Reply, ReplyGenerationRequest, ReplyRepository,
    ReplyView, Result, HISTORY_LIMIT,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::access;

pub struct ReplyService {
    replies: Arc<dyn ReplyRepository>,
    posts: Arc<dyn PostRepository>,
    boards: Arc<dyn BoardRepository>,
    clones: Arc<dyn CloneRepository>,
    generator: Arc<dyn ContentGenerator>,
}

impl ReplyService {
    pub fn new(
        replies: Arc<dyn ReplyRepository>,
        posts: Arc<dyn PostRepository>,
        boards: Arc<dyn BoardRepository>,
        clones: Arc<dyn CloneRepository>,
        generator: Arc<dyn ContentGenerator>,
    ) -> Self {
        Self {
            replies,
            posts,
            boards,
            clones,
            generator,
        }
    }

    #[instrument(skip(self, actor), fields(user_id = %actor.user_id))]
    pub async fn create_reply(
        &self,
        actor: &AuthUser,
        post_id: Uuid,
        clone_id: Uuid,
        parent_reply_id: Option<Uuid>,
    ) -> Result<ReplyView> {
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found(Entity::Post, post_id))?;
        let board = access::require_board(self.boards.as_ref(), post.board_id).await?;
        let clone = access::require_author(self.clones.as_ref(), actor, clone_id).await?;

        if let Some(parent_id) = parent_reply_id {
            let parent = self
                .replies
                .find_by_id(parent_id)
                .await?
                .ok_or_else(|| DomainError::not_found(Entity::Reply, parent_id))?;
            if parent.post_id != post.id {
                return Err(DomainError::Validation(format!(
                    "parent reply {parent_id} belongs to another post"
                )));
            }
        }

        let post_history = self.posts.recent_for_clone(clone.id, HISTORY_LIMIT).await?;
        let reply_history = self.replies.recent_for_clone(clone.id, HISTORY_LIMIT).await?;

        let request = ReplyGenerationRequest {
            context: PostGenerationRequest {
                clone_id: clone.id,
                clone_description: clone.description.clone(),
                post_history,
                reply_history,
                board_description: board.description,
            },
            post_title: post.title,
            post_content: post.content,
        };
        let generated = self.generator.generate_reply(request).await?;
        if generated.content.trim().is_empty() {
            return Err(DomainError::ExternalService(
                "AI service returned empty reply content".into(),
            ));
        }

        let reply = Reply::new(post.id, clone.id, parent_reply_id, generated.content);
        self.replies.insert(&reply).await?;
        info!(reply_id = %reply.id, post_id = %post.id, "AI reply persisted");

        Ok(ReplyView {
            reply_id: reply.id,
            post_id: reply.post_id,
            clone_id: clone.id,
            clone_name: clone.name,
            parent_reply_id: reply.parent_reply_id,
            content: reply.content,
            created_at: reply.created_at,
        })
    }

    pub async fn get_reply(&self, id: Uuid) -> Result<ReplyView> {
        self.replies
            .view(id)
            .await?
            .ok_or_else(|| DomainError::not_found(Entity::Reply, id))
    }

    pub async fn list_by_post(&self, post_id: Uuid) -> Result<Vec<ReplyView>> {
        if self.posts.find_by_id(post_id).await?.is_none() {
            return Err(DomainError::not_found(Entity::Post, post_id));
        }
        self.replies.list_by_post(post_id).await
    }

    pub async fn list_by_clone(&self, clone_id: Uuid) -> Result<Vec<ReplyView>> {
        access::require_clone(self.clones.as_ref(), clone_id).await?;
        self.replies.list_by_clone(clone_id).await
    }

    #[instrument(skip(self, actor), fields(user_id = %actor.user_id))]
    pub async fn delete_reply(&self, actor: &AuthUser, id: Uuid) -> Result<()> {
        let reply = self
            .replies
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found(Entity::Reply, id))?;
        match self.clones.find_by_id(reply.clone_id).await? {
            Some(clone) => access::ensure_clone_owner(&clone, actor)?,
            None if actor.is_admin() => {}
            None => {
                return Err(DomainError::Forbidden(format!(
                    "author of reply {id} no longer exists"
                )))
            }
        }
        self.replies.soft_delete(id).await?;
        info!(reply_id = %id, "reply soft-deleted");
        Ok(())
    }
}

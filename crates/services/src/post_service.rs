//! # PostService
//!
//! Owns AI post generation: look up the board and the authoring clone, collect
//! the clone's recent writing as context, ask the AI service for a title and a
//! body, then persist the result as an ordinary post.
//!
//! The AI call happens before any write, so a failed generation leaves no row.

use std::sync::Arc;

use domains::{
    AuthUser, BoardRepository, CloneRepository, ContentGenerator, DomainError, Entity, Post,
    PostGenerationRequest, PostRepository, PostView, ReplyRepository, Result, HISTORY_LIMIT,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::access;

pub struct PostService {
    posts: Arc<dyn PostRepository>,
    replies: Arc<dyn ReplyRepository>,
    boards: Arc<dyn BoardRepository>,
    clones: Arc<dyn CloneRepository>,
    generator: Arc<dyn ContentGenerator>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        replies: Arc<dyn ReplyRepository>,
        boards: Arc<dyn BoardRepository>,
        clones: Arc<dyn CloneRepository>,
        generator: Arc<dyn ContentGenerator>,
    ) -> Self {
        Self {
            posts,
            replies,
            boards,
            clones,
            generator,
        }
    }

    /// Generates a post for `clone_id` on `board_id` and stores it.
    #[instrument(skip(self, actor), fields(user_id = %actor.user_id))]
    pub async fn create_post(
        &self,
        actor: &AuthUser,
        board_id: Uuid,
        clone_id: Uuid,
    ) -> Result<PostView> {
        let board = access::require_board(self.boards.as_ref(), board_id).await?;
        let clone = access::require_author(self.clones.as_ref(), actor, clone_id).await?;

        let post_history = self.posts.recent_for_clone(clone.id, HISTORY_LIMIT).await?;
        let reply_history = self.replies.recent_for_clone(clone.id, HISTORY_LIMIT).await?;

        let request = PostGenerationRequest {
            clone_id: clone.id,
            clone_description: clone.description.clone(),
            post_history,
            reply_history,
            board_description: board.description.clone(),
        };
        let generated = self.generator.generate_post(request).await?;
        if generated.title.trim().is_empty() || generated.content.trim().is_empty() {
            return Err(DomainError::ExternalService(
                "AI service returned an empty title or content".into(),
            ));
        }

        let post = Post::new(board.id, clone.id, generated.title, generated.content);
        self.posts.insert(&post).await?;
        info!(post_id = %post.id, "AI post persisted");

        Ok(PostView {
            post_id: post.id,
            board_id: board.id,
            clone_id: clone.id,
            board_name: board.name,
            clone_name: clone.name,
            title: post.title,
            content: post.content,
            view_count: post.view_count,
            created_at: post.created_at,
            updated_at: post.updated_at,
        })
    }

    /// Counts the read, then returns the post with the new view count.
    pub async fn get_post(&self, id: Uuid) -> Result<PostView> {
        if self.posts.find_by_id(id).await?.is_none() {
            return Err(DomainError::not_found(Entity::Post, id));
        }
        self.posts.increment_views(id).await?;
        self.posts
            .view(id)
            .await?
            .ok_or_else(|| DomainError::not_found(Entity::Post, id))
    }

    pub async fn list_by_board(&self, board_id: Uuid) -> Result<Vec<PostView>> {
        access::require_board(self.boards.as_ref(), board_id).await?;
        self.posts.list_by_board(board_id).await
    }

    pub async fn list_by_clone(&self, clone_id: Uuid) -> Result<Vec<PostView>> {
        access::require_clone(self.clones.as_ref(), clone_id).await?;
        self.posts.list_by_clone(clone_id).await
    }

    #[instrument(skip(self, actor), fields(user_id = %actor.user_id))]
    pub async fn delete_post(&self, actor: &AuthUser, id: Uuid) -> Result<()> {
        let post = self
            .posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found(Entity::Post, id))?;
        match self.clones.find_by_id(post.clone_id).await? {
            Some(clone) => access::ensure_clone_owner(&clone, actor)?,
            None if actor.is_admin() => {}
            None => {
                return Err(DomainError::Forbidden(format!(
                    "author of post {id} no longer exists"
                )))
            }
        }
        self.posts.soft_delete(id).await?;
        info!(post_id = %id, "post soft-deleted");
        Ok(())
    }
}

//! # CloneService
//!
//! Lifecycle of AI personas. A clone can be created already subscribed to a
//! list of boards; every listed board must exist before anything is written.

use std::sync::Arc;

use chrono::Utc;
use domains::validation::{self, CLONE_NAME_MAX};
use domains::{
    AiClone, AuthUser, BoardRepository, CloneBoard, CloneRepository, CloneStatistics,
    CloneSummary, DomainError, Entity, Result, SubscriptionRepository, UserRepository,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::access;

#[derive(Debug, Clone, Default)]
pub struct CreateClone {
    pub name: String,
    pub description: Option<String>,
    /// Boards to subscribe to, in order; duplicates are ignored
    pub board_ids: Vec<Uuid>,
}

/// Partial update. `None` leaves a field untouched; a blank description clears it.
#[derive(Debug, Clone, Default)]
pub struct UpdateClone {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

pub struct CloneService {
    clones: Arc<dyn CloneRepository>,
    boards: Arc<dyn BoardRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    users: Arc<dyn UserRepository>,
}

impl CloneService {
    pub fn new(
        clones: Arc<dyn CloneRepository>,
        boards: Arc<dyn BoardRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            clones,
            boards,
            subscriptions,
            users,
        }
    }

    #[instrument(skip(self, actor, input), fields(user_id = %actor.user_id))]
    pub async fn create(&self, actor: &AuthUser, input: CreateClone) -> Result<CloneSummary> {
        let name = validation::name("clone name", &input.name, CLONE_NAME_MAX)?;
        let description = validation::description(input.description.as_deref())?;
        let owner = self
            .users
            .find_by_id(actor.user_id)
            .await?
            .ok_or_else(|| DomainError::not_found(Entity::User, actor.user_id))?;

        let mut board_ids: Vec<Uuid> = Vec::with_capacity(input.board_ids.len());
        for id in input.board_ids {
            if !board_ids.contains(&id) {
                board_ids.push(id);
            }
        }
        for &board_id in &board_ids {
            access::require_board(self.boards.as_ref(), board_id).await?;
        }

        let clone = AiClone::new(owner.id, name, description);
        self.clones.insert(&clone).await?;
        for &board_id in &board_ids {
            self.subscriptions.insert(&CloneBoard::new(clone.id, board_id)).await?;
        }
        info!(clone_id = %clone.id, boards = board_ids.len(), "clone created");

        Ok(CloneSummary::from_clone(&clone, owner.nickname))
    }

    pub async fn get(&self, id: Uuid) -> Result<CloneSummary> {
        self.clones
            .summary(id)
            .await?
            .ok_or_else(|| DomainError::not_found(Entity::Clone, id))
    }

    pub async fn list_mine(&self, actor: &AuthUser) -> Result<Vec<CloneSummary>> {
        self.clones.list_by_user(actor.user_id).await
    }

    #[instrument(skip(self, actor, patch), fields(user_id = %actor.user_id))]
    pub async fn update(
        &self,
        actor: &AuthUser,
        id: Uuid,
        patch: UpdateClone,
    ) -> Result<CloneSummary> {
        let mut clone = access::require_clone(self.clones.as_ref(), id).await?;
        access::ensure_clone_owner(&clone, actor)?;

        if let Some(name) = patch.name.as_deref() {
            clone.name = validation::name("clone name", name, CLONE_NAME_MAX)?;
        }
        if let Some(description) = patch.description.as_deref() {
            clone.description = validation::description(Some(description))?;
        }
        if let Some(active) = patch.is_active {
            clone.is_active = active;
        }
        clone.updated_at = Utc::now();
        self.clones.update(&clone).await?;

        self.get(id).await
    }

    #[instrument(skip(self, actor), fields(user_id = %actor.user_id))]
    pub async fn delete(&self, actor: &AuthUser, id: Uuid) -> Result<()> {
        let clone = access::require_clone(self.clones.as_ref(), id).await?;
        access::ensure_clone_owner(&clone, actor)?;
        self.clones.soft_delete(id).await?;
        info!(clone_id = %id, "clone soft-deleted");
        Ok(())
    }

    pub async fn statistics(&self, id: Uuid) -> Result<CloneStatistics> {
        access::require_clone(self.clones.as_ref(), id).await?;
        self.clones.statistics(id).await
    }
}

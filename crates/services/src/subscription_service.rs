//! Clone-to-board subscriptions.
//!
//! A `(clone, board)` pair has at most one row. Unsubscribing deactivates it
//! and subscribing again brings the same row back.

use std::sync::Arc;

use domains::{
    AuthUser, BoardRepository, CloneBoard, CloneRepository, DomainError, Entity, Result,
    SubscriptionRepository,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::access;

pub struct SubscriptionService {
    subscriptions: Arc<dyn SubscriptionRepository>,
    boards: Arc<dyn BoardRepository>,
    clones: Arc<dyn CloneRepository>,
}

impl SubscriptionService {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        boards: Arc<dyn BoardRepository>,
        clones: Arc<dyn CloneRepository>,
    ) -> Self {
        Self {
            subscriptions,
            boards,
            clones,
        }
    }

    #[instrument(skip(self, actor), fields(user_id = %actor.user_id))]
    pub async fn subscribe(&self, actor: &AuthUser, board_id: Uuid, clone_id: Uuid) -> Result<()> {
        let clone = access::require_clone(self.clones.as_ref(), clone_id).await?;
        access::ensure_clone_owner(&clone, actor)?;

        match self.subscriptions.find(clone_id, board_id).await? {
            Some(existing) if existing.is_active => {
                Err(DomainError::AlreadySubscribed { clone_id, board_id })
            }
            Some(_) => {
                access::require_board(self.boards.as_ref(), board_id).await?;
                if !self.subscriptions.set_active(clone_id, board_id, true).await? {
                    return Err(DomainError::AlreadySubscribed { clone_id, board_id });
                }
                info!(%clone_id, %board_id, "subscription reactivated");
                Ok(())
            }
            None => {
                access::require_board(self.boards.as_ref(), board_id).await?;
                self.subscriptions.insert(&CloneBoard::new(clone_id, board_id)).await?;
                info!(%clone_id, %board_id, "subscription created");
                Ok(())
            }
        }
    }

    #[instrument(skip(self, actor), fields(user_id = %actor.user_id))]
    pub async fn unsubscribe(
        &self,
        actor: &AuthUser,
        board_id: Uuid,
        clone_id: Uuid,
    ) -> Result<()> {
        let clone = access::require_clone(self.clones.as_ref(), clone_id).await?;
        access::ensure_clone_owner(&clone, actor)?;

        let missing =
            || DomainError::not_found(Entity::Subscription, format!("{clone_id}/{board_id}"));
        match self.subscriptions.find(clone_id, board_id).await? {
            Some(existing) if existing.is_active => {
                if !self.subscriptions.set_active(clone_id, board_id, false).await? {
                    return Err(missing());
                }
                info!(%clone_id, %board_id, "subscription deactivated");
                Ok(())
            }
            _ => Err(missing()),
        }
    }
}

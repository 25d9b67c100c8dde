//! Boards, clones and the subscriptions between them.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use domains::{
    AiClone, Board, BoardRepository, BoardSummary, CloneBoard, CloneInBoard, CloneRepository,
    CloneStatistics, CloneSummary, DomainError, Entity, Result, SubscriptionRepository,
};
use uuid::Uuid;

use super::{count, sort_newest_first, sort_oldest_first, MemoryStore};

impl MemoryStore {
    fn board_summary(&self, board: &Board) -> BoardSummary {
        let clone_count = self
            .active_subscriptions_where(|s| s.board_id == board.id)
            .iter()
            .filter(|s| self.live_clone(s.clone_id).is_some())
            .count();
        let posts = self.live_posts_where(|p| p.board_id == board.id);
        let reply_count = self
            .live_replies_where(|r| posts.iter().any(|p| p.id == r.post_id))
            .len();

        BoardSummary {
            board_id: board.id,
            name: board.name.clone(),
            description: board.description.clone(),
            created_by: board.created_by,
            created_by_nickname: self.nickname_of(board.created_by),
            clone_count: count(clone_count),
            post_count: count(posts.len()),
            reply_count: count(reply_count),
            created_at: board.created_at,
            updated_at: board.updated_at,
        }
    }

    fn summaries_of(&self, board_ids: impl IntoIterator<Item = Uuid>) -> Vec<BoardSummary> {
        let mut boards: Vec<Board> = Vec::new();
        for id in board_ids {
            if let Some(board) = self.live_board(id) {
                if !boards.iter().any(|b| b.id == board.id) {
                    boards.push(board);
                }
            }
        }
        sort_newest_first(&mut boards, |b| (b.created_at, b.id));
        boards.iter().map(|b| self.board_summary(b)).collect()
    }
}

#[async_trait]
impl BoardRepository for MemoryStore {
    async fn insert(&self, board: &Board) -> Result<()> {
        self.boards.insert(board.id, board.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Board>> {
        Ok(self.live_board(id))
    }

    async fn summary(&self, id: Uuid) -> Result<Option<BoardSummary>> {
        Ok(self.live_board(id).map(|b| self.board_summary(&b)))
    }

    async fn list_summaries(&self) -> Result<Vec<BoardSummary>> {
        let ids: Vec<Uuid> = self.boards.iter().map(|b| b.id).collect();
        Ok(self.summaries_of(ids))
    }

    async fn list_subscribed_by_user(&self, user_id: Uuid) -> Result<Vec<BoardSummary>> {
        let ids: Vec<Uuid> = self
            .active_subscriptions_where(|_| true)
            .into_iter()
            .filter(|s| {
                self.live_clone(s.clone_id)
                    .is_some_and(|c| c.user_id == user_id)
            })
            .map(|s| s.board_id)
            .collect();
        Ok(self.summaries_of(ids))
    }

    async fn list_subscribed_by_clone(&self, clone_id: Uuid) -> Result<Vec<BoardSummary>> {
        let ids: Vec<Uuid> = self
            .active_subscriptions_where(|s| s.clone_id == clone_id)
            .into_iter()
            .map(|s| s.board_id)
            .collect();
        Ok(self.summaries_of(ids))
    }

    async fn update(&self, board: &Board) -> Result<()> {
        match self.boards.get_mut(&board.id) {
            Some(mut stored) if !stored.is_deleted => {
                stored.name = board.name.clone();
                stored.description = board.description.clone();
                stored.updated_at = board.updated_at;
                Ok(())
            }
            _ => Err(DomainError::not_found(Entity::Board, board.id)),
        }
    }

    async fn soft_delete(&self, id: Uuid) -> Result<()> {
        match self.boards.get_mut(&id) {
            Some(mut stored) if !stored.is_deleted => {
                stored.is_deleted = true;
                stored.updated_at = Utc::now();
                Ok(())
            }
            _ => Err(DomainError::not_found(Entity::Board, id)),
        }
    }
}

#[async_trait]
impl CloneRepository for MemoryStore {
    async fn insert(&self, clone: &AiClone) -> Result<()> {
        self.clones.insert(clone.id, clone.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AiClone>> {
        Ok(self.live_clone(id))
    }

    async fn summary(&self, id: Uuid) -> Result<Option<CloneSummary>> {
        Ok(self
            .live_clone(id)
            .map(|c| CloneSummary::from_clone(&c, self.nickname_of(c.user_id))))
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<CloneSummary>> {
        let mut clones: Vec<AiClone> = self
            .clones
            .iter()
            .filter(|c| c.user_id == user_id && !c.is_deleted)
            .map(|c| c.value().clone())
            .collect();
        sort_newest_first(&mut clones, |c| (c.created_at, c.id));
        let nickname = self.nickname_of(user_id);
        Ok(clones
            .iter()
            .map(|c| CloneSummary::from_clone(c, nickname.clone()))
            .collect())
    }

    async fn list_in_board(&self, board_id: Uuid) -> Result<Vec<CloneInBoard>> {
        let mut subscriptions = self.active_subscriptions_where(|s| s.board_id == board_id);
        sort_oldest_first(&mut subscriptions, |s| (s.created_at, s.clone_id));
        Ok(subscriptions
            .into_iter()
            .filter_map(|s| self.live_clone(s.clone_id))
            .map(|c| CloneInBoard {
                clone_id: c.id,
                board_id,
                owner_id: c.user_id,
                clone_name: c.name,
                clone_description: c.description,
                is_mine: false,
            })
            .collect())
    }

    async fn update(&self, clone: &AiClone) -> Result<()> {
        match self.clones.get_mut(&clone.id) {
            Some(mut stored) if !stored.is_deleted => {
                stored.name = clone.name.clone();
                stored.description = clone.description.clone();
                stored.is_active = clone.is_active;
                stored.updated_at = clone.updated_at;
                Ok(())
            }
            _ => Err(DomainError::not_found(Entity::Clone, clone.id)),
        }
    }

    async fn soft_delete(&self, id: Uuid) -> Result<()> {
        let now = Utc::now();
        match self.clones.get_mut(&id) {
            Some(mut stored) if !stored.is_deleted => {
                stored.is_deleted = true;
                stored.updated_at = now;
            }
            _ => return Err(DomainError::not_found(Entity::Clone, id)),
        }
        for mut sub in self.subscriptions.iter_mut() {
            if sub.clone_id == id && sub.is_active {
                sub.is_active = false;
                sub.updated_at = now;
            }
        }
        Ok(())
    }

    async fn statistics(&self, id: Uuid) -> Result<CloneStatistics> {
        let board_count = self
            .active_subscriptions_where(|s| s.clone_id == id)
            .iter()
            .filter(|s| self.live_board(s.board_id).is_some())
            .count();
        let post_count = self.live_posts_where(|p| p.clone_id == id).len();
        let reply_count = self.live_replies_where(|r| r.clone_id == id).len();
        Ok(CloneStatistics {
            board_count: count(board_count),
            post_count: count(post_count),
            reply_count: count(reply_count),
        })
    }
}

#[async_trait]
impl SubscriptionRepository for MemoryStore {
    async fn find(&self, clone_id: Uuid, board_id: Uuid) -> Result<Option<CloneBoard>> {
        Ok(self
            .subscriptions
            .get(&(clone_id, board_id))
            .map(|s| s.value().clone()))
    }

    async fn insert(&self, subscription: &CloneBoard) -> Result<()> {
        let key = (subscription.clone_id, subscription.board_id);
        match self.subscriptions.entry(key) {
            Entry::Occupied(_) => Err(DomainError::AlreadySubscribed {
                clone_id: subscription.clone_id,
                board_id: subscription.board_id,
            }),
            Entry::Vacant(slot) => {
                slot.insert(subscription.clone());
                Ok(())
            }
        }
    }

    async fn set_active(&self, clone_id: Uuid, board_id: Uuid, active: bool) -> Result<bool> {
        // The shard guard is held across the check and the write.
        let mut sub = self
            .subscriptions
            .get_mut(&(clone_id, board_id))
            .ok_or_else(|| {
                DomainError::not_found(Entity::Subscription, format!("{clone_id}/{board_id}"))
            })?;
        if sub.is_active == active {
            return Ok(false);
        }
        sub.is_active = active;
        sub.updated_at = Utc::now();
        Ok(true)
    }
}

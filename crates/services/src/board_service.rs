use std::sync::Arc;

use chrono::Utc;
use domains::validation::{self, BOARD_NAME_MAX};
use domains::{
    AuthUser, Board, BoardRepository, BoardSummary, CloneInBoard, CloneRepository, DomainError,
    Entity, Result,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::access;

/// Partial update. A blank description clears it.
#[derive(Debug, Clone, Default)]
pub struct UpdateBoard {
    pub name: Option<String>,
    pub description: Option<String>,
}

pub struct BoardService {
    boards: Arc<dyn BoardRepository>,
    clones: Arc<dyn CloneRepository>,
}

impl BoardService {
    pub fn new(boards: Arc<dyn BoardRepository>, clones: Arc<dyn CloneRepository>) -> Self {
        Self { boards, clones }
    }

    #[instrument(skip(self, actor, description), fields(user_id = %actor.user_id))]
    pub async fn create(
        &self,
        actor: &AuthUser,
        name: &str,
        description: Option<&str>,
    ) -> Result<BoardSummary> {
        let name = validation::name("board name", name, BOARD_NAME_MAX)?;
        let description = validation::description(description)?;

        let board = Board::new(actor.user_id, name, description);
        self.boards.insert(&board).await?;
        info!(board_id = %board.id, "board created");

        self.get(board.id).await
    }

    pub async fn get(&self, id: Uuid) -> Result<BoardSummary> {
        self.boards
            .summary(id)
            .await?
            .ok_or_else(|| DomainError::not_found(Entity::Board, id))
    }

    pub async fn list(&self) -> Result<Vec<BoardSummary>> {
        self.boards.list_summaries().await
    }

    /// Boards that any of the actor's clones subscribe to.
    pub async fn list_subscribed(&self, actor: &AuthUser) -> Result<Vec<BoardSummary>> {
        self.boards.list_subscribed_by_user(actor.user_id).await
    }

    pub async fn list_for_clone(&self, clone_id: Uuid) -> Result<Vec<BoardSummary>> {
        access::require_clone(self.clones.as_ref(), clone_id).await?;
        self.boards.list_subscribed_by_clone(clone_id).await
    }

    #[instrument(skip(self, actor, patch), fields(user_id = %actor.user_id))]
    pub async fn update(
        &self,
        actor: &AuthUser,
        id: Uuid,
        patch: UpdateBoard,
    ) -> Result<BoardSummary> {
        let mut board = access::require_board(self.boards.as_ref(), id).await?;
        access::ensure_board_creator(&board, actor)?;

        if let Some(name) = patch.name.as_deref() {
            board.name = validation::name("board name", name, BOARD_NAME_MAX)?;
        }
        if let Some(description) = patch.description.as_deref() {
            board.description = validation::description(Some(description))?;
        }
        board.updated_at = Utc::now();
        self.boards.update(&board).await?;

        self.get(id).await
    }

    #[instrument(skip(self, actor), fields(user_id = %actor.user_id))]
    pub async fn delete(&self, actor: &AuthUser, id: Uuid) -> Result<()> {
        let board = access::require_board(self.boards.as_ref(), id).await?;
        access::ensure_board_creator(&board, actor)?;
        self.boards.soft_delete(id).await?;
        info!(board_id = %id, "board soft-deleted");
        Ok(())
    }

    /// Clones subscribed to the board. `is_mine` is set for the viewer's own clones.
    pub async fn list_clones(
        &self,
        board_id: Uuid,
        viewer: Option<&AuthUser>,
    ) -> Result<Vec<CloneInBoard>> {
        access::require_board(self.boards.as_ref(), board_id).await?;
        let mut clones = self.clones.list_in_board(board_id).await?;
        if let Some(viewer) = viewer {
            for clone in &mut clones {
                clone.is_mine = clone.owner_id == viewer.user_id;
            }
        }
        Ok(clones)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{actor, admin, board};
    use domains::{MockBoardRepository, MockCloneRepository};

    fn summary_of(board: &Board) -> BoardSummary {
        BoardSummary {
            board_id: board.id,
            name: board.name.clone(),
            description: board.description.clone(),
            created_by: board.created_by,
            created_by_nickname: "creator".into(),
            clone_count: 0,
            post_count: 0,
            reply_count: 0,
            created_at: board.created_at,
            updated_at: board.updated_at,
        }
    }

    fn service(boards: MockBoardRepository, clones: MockCloneRepository) -> BoardService {
        BoardService::new(Arc::new(boards), Arc::new(clones))
    }

    #[tokio::test]
    async fn create_trims_name_and_returns_summary() {
        let user = actor();
        let mut boards = MockBoardRepository::new();
        boards
            .expect_insert()
            .withf(|b: &Board| b.name == "rust" && b.description.is_none())
            .times(1)
            .returning(|_| Ok(()));
        boards.expect_summary().returning(|id| {
            let mut b = board(Uuid::now_v7());
            b.id = id;
            b.name = "rust".into();
            Ok(Some(summary_of(&b)))
        });

        let summary = service(boards, MockCloneRepository::new())
            .create(&user, "  rust ", Some(" "))
            .await
            .unwrap();
        assert_eq!(summary.name, "rust");
    }

    #[tokio::test]
    async fn create_rejects_blank_and_long_names() {
        let svc = service(MockBoardRepository::new(), MockCloneRepository::new());
        let user = actor();
        assert!(svc.create(&user, "   ", None).await.is_err());
        let long = "b".repeat(BOARD_NAME_MAX + 1);
        assert!(svc.create(&user, &long, None).await.is_err());
    }

    #[tokio::test]
    async fn only_creator_or_admin_may_delete() {
        let creator = actor();
        let b = board(creator.user_id);
        let id = b.id;

        let build = |deletes: usize| {
            let mut boards = MockBoardRepository::new();
            let found = b.clone();
            boards.expect_find_by_id().returning(move |_| Ok(Some(found.clone())));
            boards.expect_soft_delete().times(deletes).returning(|_| Ok(()));
            service(boards, MockCloneRepository::new())
        };

        let err = build(0).delete(&actor(), id).await.unwrap_err();
        assert_eq!(err.code(), "ACCESS_DENIED");
        build(1).delete(&creator, id).await.unwrap();
        build(1).delete(&admin(), id).await.unwrap();
    }

    #[tokio::test]
    async fn list_clones_flags_the_viewers_own() {
        let viewer = actor();
        let b = board(viewer.user_id);
        let board_id = b.id;
        let mut boards = MockBoardRepository::new();
        boards.expect_find_by_id().returning(move |_| Ok(Some(b.clone())));
        let mut clones = MockCloneRepository::new();
        let mine = viewer.user_id;
        clones.expect_list_in_board().returning(move |board_id| {
            Ok([mine, Uuid::now_v7()]
                .into_iter()
                .map(|owner_id| CloneInBoard {
                    clone_id: Uuid::now_v7(),
                    board_id,
                    owner_id,
                    clone_name: "c".into(),
                    clone_description: None,
                    is_mine: false,
                })
                .collect())
        });

        let listed = service(boards, clones)
            .list_clones(board_id, Some(&viewer))
            .await
            .unwrap();
        assert_eq!(listed.iter().filter(|c| c.is_mine).count(), 1);
        assert!(listed[0].is_mine);
    }

    #[tokio::test]
    async fn get_missing_board_is_not_found() {
        let mut boards = MockBoardRepository::new();
        boards.expect_summary().returning(|_| Ok(None));
        let err = service(boards, MockCloneRepository::new())
            .get(Uuid::now_v7())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "BOARD_NOT_FOUND");
    }
}

//! Lookups and ownership checks shared by the services.

use domains::{
    AiClone, AuthUser, Board, BoardRepository, CloneRepository, DomainError, Entity, Result,
};
use uuid::Uuid;

pub(crate) async fn require_board(boards: &dyn BoardRepository, id: Uuid) -> Result<Board> {
    boards
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found(Entity::Board, id))
}

pub(crate) async fn require_clone(clones: &dyn CloneRepository, id: Uuid) -> Result<AiClone> {
    clones
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found(Entity::Clone, id))
}

/// Owners and admins may act on a clone.
pub(crate) fn ensure_clone_owner(clone: &AiClone, actor: &AuthUser) -> Result<()> {
    if clone.is_owned_by(actor.user_id) || actor.is_admin() {
        Ok(())
    } else {
        Err(DomainError::Forbidden(format!(
            "clone {} belongs to another user",
            clone.id
        )))
    }
}

pub(crate) fn ensure_board_creator(board: &Board, actor: &AuthUser) -> Result<()> {
    if board.created_by == actor.user_id || actor.is_admin() {
        Ok(())
    } else {
        Err(DomainError::Forbidden(format!(
            "board {} was created by another user",
            board.id
        )))
    }
}

/// A clone the actor may author content with.
pub(crate) async fn require_author(
    clones: &dyn CloneRepository,
    actor: &AuthUser,
    clone_id: Uuid,
) -> Result<AiClone> {
    let clone = require_clone(clones, clone_id).await?;
    ensure_clone_owner(&clone, actor)?;
    if !clone.is_active {
        return Err(DomainError::Validation(format!(
            "clone {} is inactive and cannot write",
            clone.id
        )));
    }
    Ok(clone)
}

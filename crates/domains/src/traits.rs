//! # Core Traits (Ports)
//!
//! Any adapter must implement these traits to be wired into the binary.
//! Read methods never return soft-deleted rows unless stated otherwise.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
#[cfg(any(test, feature = "testing"))]
use mockall::automock;
use uuid::Uuid;

use crate::auth::{TokenClaims, TokenKind, TokenPair};
use crate::error::Result;
use crate::generation::{
    GeneratedPost, GeneratedReply, PostGenerationRequest, ReplyGenerationRequest,
};
use crate::models::{AiClone, Board, CloneBoard, EmailVerification, Post, Reply, Role, User};
use crate::views::{
    BoardSummary, CloneInBoard, CloneStatistics, CloneSummary, PostHistoryItem, PostView,
    ReplyHistoryItem, ReplyView, UserStatistics,
};

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `DuplicateEmail` when the address is taken.
    async fn insert(&self, user: &User) -> Result<()>;
    /// Active users only.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    /// Includes inactive users so login can tell them apart.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn exists_by_email(&self, email: &str) -> Result<bool>;
    async fn update_nickname(&self, id: Uuid, nickname: &str) -> Result<()>;
    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<()>;
    async fn statistics(&self, id: Uuid) -> Result<UserStatistics>;
}

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait BoardRepository: Send + Sync {
    async fn insert(&self, board: &Board) -> Result<()>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Board>>;
    async fn summary(&self, id: Uuid) -> Result<Option<BoardSummary>>;
    async fn list_summaries(&self) -> Result<Vec<BoardSummary>>;
    /// Boards where at least one live clone of `user_id` holds an active subscription.
    async fn list_subscribed_by_user(&self, user_id: Uuid) -> Result<Vec<BoardSummary>>;
    async fn list_subscribed_by_clone(&self, clone_id: Uuid) -> Result<Vec<BoardSummary>>;
    async fn update(&self, board: &Board) -> Result<()>;
    async fn soft_delete(&self, id: Uuid) -> Result<()>;
}

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait CloneRepository: Send + Sync {
    async fn insert(&self, clone: &AiClone) -> Result<()>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AiClone>>;
    async fn summary(&self, id: Uuid) -> Result<Option<CloneSummary>>;
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<CloneSummary>>;
    /// Live clones with an active subscription; `is_mine` is left `false`.
    async fn list_in_board(&self, board_id: Uuid) -> Result<Vec<CloneInBoard>>;
    async fn update(&self, clone: &AiClone) -> Result<()>;
    /// Marks the clone deleted and deactivates all of its subscriptions.
    async fn soft_delete(&self, id: Uuid) -> Result<()>;
    async fn statistics(&self, id: Uuid) -> Result<CloneStatistics>;
}

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Returns inactive rows too; the caller decides between conflict and reactivation.
    async fn find(&self, clone_id: Uuid, board_id: Uuid) -> Result<Option<CloneBoard>>;
    /// Fails with `AlreadySubscribed` when the key exists.
    async fn insert(&self, subscription: &CloneBoard) -> Result<()>;
    /// Moves the row to `active` only if it is currently in the other state,
    /// as a single conditional write. Returns `false` when it already was.
    /// Fails with `NotFound` when there is no row.
    async fn set_active(&self, clone_id: Uuid, board_id: Uuid, active: bool) -> Result<bool>;
}

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn insert(&self, post: &Post) -> Result<()>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>>;
    async fn view(&self, id: Uuid) -> Result<Option<PostView>>;
    async fn increment_views(&self, id: Uuid) -> Result<()>;
    /// Newest first.
    async fn list_by_board(&self, board_id: Uuid) -> Result<Vec<PostView>>;
    /// Newest first.
    async fn list_by_clone(&self, clone_id: Uuid) -> Result<Vec<PostView>>;
    /// The clone's latest posts, newest first, at most `limit`.
    async fn recent_for_clone(&self, clone_id: Uuid, limit: usize) -> Result<Vec<PostHistoryItem>>;
    async fn soft_delete(&self, id: Uuid) -> Result<()>;
}

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait ReplyRepository: Send + Sync {
    async fn insert(&self, reply: &Reply) -> Result<()>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Reply>>;
    async fn view(&self, id: Uuid) -> Result<Option<ReplyView>>;
    /// Oldest first, so a parent always precedes its children.
    async fn list_by_post(&self, post_id: Uuid) -> Result<Vec<ReplyView>>;
    /// Newest first.
    async fn list_by_clone(&self, clone_id: Uuid) -> Result<Vec<ReplyView>>;
    /// The clone's latest replies on live posts, newest first, at most `limit`.
    async fn recent_for_clone(&self, clone_id: Uuid, limit: usize) -> Result<Vec<ReplyHistoryItem>>;
    async fn soft_delete(&self, id: Uuid) -> Result<()>;
}

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait VerificationRepository: Send + Sync {
    /// Replaces any earlier code for the same address.
    async fn upsert(&self, verification: &EmailVerification) -> Result<()>;
    async fn find(&self, email: &str) -> Result<Option<EmailVerification>>;
    async fn mark_verified(&self, email: &str, at: DateTime<Utc>) -> Result<()>;
}

/// External generative AI service.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate_post(&self, request: PostGenerationRequest) -> Result<GeneratedPost>;
    async fn generate_reply(&self, request: ReplyGenerationRequest) -> Result<GeneratedReply>;
}

/// Password hashing contract.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait PasswordService: Send + Sync {
    async fn hash(&self, password: &str) -> Result<String>;
    /// `false` for a wrong password or an unparsable hash.
    async fn verify(&self, password: &str, hash: &str) -> Result<bool>;
}

/// Token issuing and verification. Pure computation, no I/O.
#[cfg_attr(any(test, feature = "testing"), automock)]
pub trait TokenService: Send + Sync {
    fn issue(&self, user_id: Uuid, role: Role) -> Result<TokenPair>;
    /// Fails with `Unauthorized` on a bad signature, expiry or a kind mismatch.
    fn verify(&self, token: &str, expected: TokenKind) -> Result<TokenClaims>;
}

/// Denylist of token ids, kept until the token would have expired anyway.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Atomic test-and-set. Returns `false` when the id was already revoked.
    async fn revoke(&self, token_id: &str, expires_at: DateTime<Utc>) -> Result<bool>;
    async fn is_revoked(&self, token_id: &str) -> Result<bool>;
}

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification_code(&self, to: &str, code: &str) -> Result<()>;
}

//! ai-valley/crates/services/src/lib.rs
//!
//! Application services. Each service holds `Arc<dyn Port>` handles and owns
//! the business rules for one area; adapters are wired in by the binary.

use std::sync::Arc;

use chrono::Duration;
use domains::{
    BoardRepository, CloneRepository, ContentGenerator, Mailer, PasswordService, PostRepository,
    ReplyRepository, RevocationStore, SubscriptionRepository, TokenService, UserRepository,
    VerificationRepository,
};

mod access;
pub mod auth_service;
pub mod board_service;
pub mod clone_service;
pub mod post_service;
pub mod reply_service;
pub mod subscription_service;
pub mod user_service;

pub use auth_service::AuthService;
pub use board_service::{BoardService, UpdateBoard};
pub use clone_service::{CloneService, CreateClone, UpdateClone};
pub use post_service::PostService;
pub use reply_service::ReplyService;
pub use subscription_service::SubscriptionService;
pub use user_service::UserService;

/// Every adapter the services depend on.
#[derive(Clone)]
pub struct Ports {
    pub users: Arc<dyn UserRepository>,
    pub boards: Arc<dyn BoardRepository>,
    pub clones: Arc<dyn CloneRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub replies: Arc<dyn ReplyRepository>,
    pub verifications: Arc<dyn VerificationRepository>,
    pub generator: Arc<dyn ContentGenerator>,
    pub passwords: Arc<dyn PasswordService>,
    pub tokens: Arc<dyn TokenService>,
    pub revocations: Arc<dyn RevocationStore>,
    pub mailer: Arc<dyn Mailer>,
}

#[derive(Debug, Clone, Copy)]
pub struct ServiceOptions {
    /// How long an emailed verification code stays valid
    pub verification_ttl: Duration,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            verification_ttl: Duration::minutes(10),
        }
    }
}

/// The full set of services, shared by the HTTP layer.
#[derive(Clone)]
pub struct AppServices {
    pub users: Arc<UserService>,
    pub auth: Arc<AuthService>,
    pub boards: Arc<BoardService>,
    pub clones: Arc<CloneService>,
    pub subscriptions: Arc<SubscriptionService>,
    pub posts: Arc<PostService>,
    pub replies: Arc<ReplyService>,
}

impl AppServices {
    pub fn new(ports: Ports, options: ServiceOptions) -> Self {
        Self {
            users: Arc::new(UserService::new(
                ports.users.clone(),
                ports.passwords.clone(),
                ports.verifications.clone(),
            )),
            auth: Arc::new(AuthService::new(
                ports.users.clone(),
                ports.passwords.clone(),
                ports.tokens.clone(),
                ports.revocations.clone(),
                ports.verifications.clone(),
                ports.mailer.clone(),
                options.verification_ttl,
            )),
            boards: Arc::new(BoardService::new(
                ports.boards.clone(),
                ports.clones.clone(),
            )),
            clones: Arc::new(CloneService::new(
                ports.clones.clone(),
                ports.boards.clone(),
                ports.subscriptions.clone(),
                ports.users.clone(),
            )),
            subscriptions: Arc::new(SubscriptionService::new(
                ports.subscriptions.clone(),
                ports.boards.clone(),
                ports.clones.clone(),
            )),
            posts: Arc::new(PostService::new(
                ports.posts.clone(),
                ports.replies.clone(),
                ports.boards.clone(),
                ports.clones.clone(),
                ports.generator.clone(),
            )),
            replies: Arc::new(ReplyService::new(
                ports.replies,
                ports.posts,
                ports.boards,
                ports.clones,
                ports.generator,
            )),
        }
    }
}

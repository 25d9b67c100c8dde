//! # DomainError
//!
//! Centralized error handling for the AI Valley services.
//! Maps domain-specific failures to actionable error types; the API layer
//! turns each variant into an HTTP status and a stable `code`.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// Entity kinds that can be reported as missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Board,
    Clone,
    Post,
    Reply,
    Subscription,
}

impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::User => "USER",
            Entity::Board => "BOARD",
            Entity::Clone => "CLONE",
            Entity::Post => "POST",
            Entity::Reply => "REPLY",
            Entity::Subscription => "SUBSCRIPTION",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::User => "user",
            Entity::Board => "board",
            Entity::Clone => "clone",
            Entity::Post => "post",
            Entity::Reply => "reply",
            Entity::Subscription => "subscription",
        };
        f.write_str(name)
    }
}

/// The primary error type for all service operations.
#[derive(Error, Debug)]
pub enum DomainError {
    /// Resource not found (e.g., Board, Clone, Post)
    #[error("{entity} not found with ID {id}")]
    NotFound { entity: Entity, id: String },

    /// Validation failure (e.g., nickname too long, blank board name)
    #[error("validation error: {0}")]
    Validation(String),

    /// Unknown email, inactive account or wrong password
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Missing, malformed, expired or revoked token
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but not the owner of the resource
    #[error("access denied: {0}")]
    Forbidden(String),

    #[error("email {0} is already registered")]
    DuplicateEmail(String),

    #[error("clone {clone_id} is already subscribed to board {board_id}")]
    AlreadySubscribed { clone_id: Uuid, board_id: Uuid },

    /// AI service timeout, error status or unreadable body
    #[error("AI service failure: {0}")]
    ExternalService(String),

    #[error("failed to send email: {0}")]
    EmailSendFailure(String),

    /// Infrastructure failure (e.g., DB down)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity: Entity, id: impl ToString) -> Self {
        DomainError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        DomainError::Internal(err.to_string())
    }

    /// Stable machine-readable code for the error body.
    pub fn code(&self) -> String {
        match self {
            DomainError::NotFound { entity, .. } => format!("{}_NOT_FOUND", entity.as_str()),
            DomainError::Validation(_) => "INVALID_INPUT_VALUE".into(),
            DomainError::InvalidCredentials => "INVALID_CREDENTIALS".into(),
            DomainError::Unauthorized(_) => "UNAUTHORIZED".into(),
            DomainError::Forbidden(_) => "ACCESS_DENIED".into(),
            DomainError::DuplicateEmail(_) => "DUPLICATE_EMAIL".into(),
            DomainError::AlreadySubscribed { .. } => "ALREADY_SUBSCRIBED".into(),
            DomainError::ExternalService(_) => "AI_SERVICE_FAILURE".into(),
            DomainError::EmailSendFailure(_) => "EMAIL_SEND_FAIL".into(),
            DomainError::Internal(_) => "INTERNAL_SERVER_ERROR".into(),
        }
    }
}

/// A specialized Result type for AI Valley logic.
pub type Result<T> = std::result::Result<T, DomainError>;

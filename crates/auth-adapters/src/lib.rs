//! ai-valley/crates/auth-adapters/src/lib.rs
//!
//! Credential and identity adapters: Argon2 password hashing, JWT bearer
//! tokens (feature `auth-jwt`) and verification mailers (SMTP behind
//! feature `mail-smtp`).

pub mod mailer;
pub mod password;
#[cfg(feature = "auth-jwt")]
pub mod jwt;

#[cfg(feature = "auth-jwt")]
pub use jwt::{JwtConfig, JwtTokenService};
pub use mailer::LogMailer;
#[cfg(feature = "mail-smtp")]
pub use mailer::SmtpMailer;
pub use password::Argon2PasswordService;

//! ai-valley/crates/domains/src/lib.rs
//!
//! The central domain types and interface definitions for AI Valley.

pub mod auth;
pub mod error;
pub mod generation;
pub mod models;
pub mod traits;
pub mod validation;
pub mod views;

// Re-exporting for easier access in other crates
pub use auth::*;
pub use error::*;
pub use generation::*;
pub use models::*;
pub use traits::*;
pub use views::*;

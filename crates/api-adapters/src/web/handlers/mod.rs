//! HTTP handlers, one module per resource.

pub mod auth;
pub mod boards;
pub mod clones;
pub mod posts;
pub mod replies;
pub mod system;
pub mod users;

//! ai-valley/crates/storage-adapters/src/lib.rs
//!
//! Repository and revocation-store adapters.
//!
//! - `memory`: dashmap-backed store, always compiled. Used by tests and by the
//!   binary when no database URL is configured.
//! - `postgres`: sqlx store (feature `db-postgres`), migrations under `migrations/`.
//! - `revocation`: token denylists, in memory or in Redis (feature `redis`).

pub mod memory;
#[cfg(feature = "db-postgres")]
pub mod postgres;
pub mod revocation;

pub use memory::MemoryStore;
#[cfg(feature = "db-postgres")]
pub use postgres::PgStore;
pub use revocation::MemoryRevocationStore;
#[cfg(feature = "redis")]
pub use revocation::RedisRevocationStore;

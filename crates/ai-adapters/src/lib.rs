//! ai-valley/crates/ai-adapters/src/lib.rs
//!
//! Client for the external generative AI service that writes posts and
//! replies in the voice of a clone.

mod client;
mod wire;

pub use client::{AiClientConfig, HttpContentGenerator};

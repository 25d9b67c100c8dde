//! Inputs and outputs of AI content generation.

use uuid::Uuid;

use crate::views::{PostHistoryItem, ReplyHistoryItem};

/// Number of past posts and past replies handed to the AI service as context.
pub const HISTORY_LIMIT: usize = 3;

/// Everything the AI service needs to write a post as a given clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostGenerationRequest {
    pub clone_id: Uuid,
    pub clone_description: Option<String>,
    /// Newest first, at most [`HISTORY_LIMIT`] items
    pub post_history: Vec<PostHistoryItem>,
    /// Newest first, at most [`HISTORY_LIMIT`] items
    pub reply_history: Vec<ReplyHistoryItem>,
    pub board_description: Option<String>,
}

/// A post request plus the post being answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyGenerationRequest {
    pub context: PostGenerationRequest,
    pub post_title: String,
    pub post_content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPost {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedReply {
    pub content: String,
}

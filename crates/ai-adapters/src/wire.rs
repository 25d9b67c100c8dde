//! JSON shapes of the AI service. The service mixes `camelCase` and
//! `snake_case` keys; the renames below are part of its contract.

use domains::{PostGenerationRequest, PostHistoryItem, ReplyGenerationRequest, ReplyHistoryItem};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PostHistoryWire<'a> {
    board_name: &'a str,
    post_title: &'a str,
    post_content: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReplyHistoryWire<'a> {
    post_title: &'a str,
    content: &'a str,
}

/// Body of `POST /post`.
#[derive(Debug, Serialize)]
pub(crate) struct PostBody<'a> {
    #[serde(rename = "cloneId")]
    clone_id: Uuid,
    clone_description: Option<&'a str>,
    post_history: Vec<PostHistoryWire<'a>>,
    reply_history: Vec<ReplyHistoryWire<'a>>,
    board_description: Option<&'a str>,
}

/// Body of `POST /reply`: the post body plus the post being answered.
#[derive(Debug, Serialize)]
pub(crate) struct ReplyBody<'a> {
    #[serde(flatten)]
    context: PostBody<'a>,
    post_title: &'a str,
    post_content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PostAnswer {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReplyAnswer {
    pub content: String,
}

impl<'a> From<&'a PostHistoryItem> for PostHistoryWire<'a> {
    fn from(item: &'a PostHistoryItem) -> Self {
        Self {
            board_name: &item.board_name,
            post_title: &item.post_title,
            post_content: &item.post_content,
        }
    }
}

impl<'a> From<&'a ReplyHistoryItem> for ReplyHistoryWire<'a> {
    fn from(item: &'a ReplyHistoryItem) -> Self {
        Self {
            post_title: &item.post_title,
            content: &item.content,
        }
    }
}

impl<'a> From<&'a PostGenerationRequest> for PostBody<'a> {
    fn from(req: &'a PostGenerationRequest) -> Self {
        Self {
            clone_id: req.clone_id,
            clone_description: req.clone_description.as_deref(),
            post_history: req.post_history.iter().map(Into::into).collect(),
            reply_history: req.reply_history.iter().map(Into::into).collect(),
            board_description: req.board_description.as_deref(),
        }
    }
}

impl<'a> From<&'a ReplyGenerationRequest> for ReplyBody<'a> {
    fn from(req: &'a ReplyGenerationRequest) -> Self {
        Self {
            context: PostBody::from(&req.context),
            post_title: &req.post_title,
            post_content: &req.post_content,
        }
    }
}

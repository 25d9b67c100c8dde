//! # MemoryStore
//!
//! One dashmap per table. A single `MemoryStore` implements every repository
//! port, so the binary wraps it in an `Arc` and hands out one handle per port.
//!
//! Never hold a map guard while touching the same map again: dashmap shard
//! locks are not re-entrant. Reads clone rows out before joining.

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use domains::{AiClone, Board, CloneBoard, EmailVerification, Post, Reply, User};
use uuid::Uuid;

mod catalog;
mod content;
mod users;

#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<Uuid, User>,
    /// Lower-cased email to user id, the uniqueness constraint
    emails: DashMap<String, Uuid>,
    boards: DashMap<Uuid, Board>,
    clones: DashMap<Uuid, AiClone>,
    subscriptions: DashMap<(Uuid, Uuid), CloneBoard>,
    posts: DashMap<Uuid, Post>,
    replies: DashMap<Uuid, Reply>,
    verifications: DashMap<String, EmailVerification>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn nickname_of(&self, user_id: Uuid) -> String {
        self.users
            .get(&user_id)
            .map(|u| u.nickname.clone())
            .unwrap_or_default()
    }

    fn live_board(&self, id: Uuid) -> Option<Board> {
        self.boards.get(&id).filter(|b| !b.is_deleted).map(|b| b.value().clone())
    }

    fn live_clone(&self, id: Uuid) -> Option<AiClone> {
        self.clones.get(&id).filter(|c| !c.is_deleted).map(|c| c.value().clone())
    }

    fn live_post(&self, id: Uuid) -> Option<Post> {
        self.posts.get(&id).filter(|p| !p.is_deleted).map(|p| p.value().clone())
    }

    fn live_posts_where(&self, pred: impl Fn(&Post) -> bool) -> Vec<Post> {
        self.posts
            .iter()
            .filter(|p| !p.is_deleted && pred(p.value()))
            .map(|p| p.value().clone())
            .collect()
    }

    /// A reply is live only while its post is.
    fn live_replies_where(&self, pred: impl Fn(&Reply) -> bool) -> Vec<Reply> {
        let replies: Vec<Reply> = self
            .replies
            .iter()
            .filter(|r| !r.is_deleted && pred(r.value()))
            .map(|r| r.value().clone())
            .collect();
        replies
            .into_iter()
            .filter(|r| self.live_post(r.post_id).is_some())
            .collect()
    }

    fn active_subscriptions_where(&self, pred: impl Fn(&CloneBoard) -> bool) -> Vec<CloneBoard> {
        self.subscriptions
            .iter()
            .filter(|s| s.is_active && pred(s.value()))
            .map(|s| s.value().clone())
            .collect()
    }
}

/// Oldest first; v7 ids break ties between rows created in the same instant.
fn sort_oldest_first<T>(rows: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, Uuid)) {
    rows.sort_by_key(|r| key(r));
}

fn sort_newest_first<T>(rows: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, Uuid)) {
    rows.sort_by_key(|r| Reverse(key(r)));
}

fn count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

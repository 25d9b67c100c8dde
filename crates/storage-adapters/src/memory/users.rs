use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use domains::{
    DomainError, EmailVerification, Entity, Result, User, UserRepository, UserStatistics,
    VerificationRepository,
};
use uuid::Uuid;

use super::{count, MemoryStore};

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert(&self, user: &User) -> Result<()> {
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => return Err(DomainError::DuplicateEmail(user.email.clone())),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
            }
        }
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self
            .users
            .get(&id)
            .filter(|u| u.is_active)
            .map(|u| u.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let Some(id) = self.emails.get(email).map(|id| *id.value()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool> {
        Ok(self.emails.contains_key(email))
    }

    async fn update_nickname(&self, id: Uuid, nickname: &str) -> Result<()> {
        let mut user = self
            .users
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(Entity::User, id))?;
        user.nickname = nickname.to_string();
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        if let Some(mut user) = self.users.get_mut(&id) {
            user.last_login_at = Some(at);
        }
        Ok(())
    }

    async fn statistics(&self, id: Uuid) -> Result<UserStatistics> {
        let clone_ids: Vec<Uuid> = self
            .clones
            .iter()
            .filter(|c| c.user_id == id && !c.is_deleted)
            .map(|c| c.id)
            .collect();
        let posts = self.live_posts_where(|p| clone_ids.contains(&p.clone_id));
        let replies = self.live_replies_where(|r| clone_ids.contains(&r.clone_id));
        Ok(UserStatistics {
            clone_count: count(clone_ids.len()),
            post_count: count(posts.len()),
            reply_count: count(replies.len()),
        })
    }
}

#[async_trait]
impl VerificationRepository for MemoryStore {
    async fn upsert(&self, verification: &EmailVerification) -> Result<()> {
        self.verifications
            .insert(verification.email.clone(), verification.clone());
        Ok(())
    }

    async fn find(&self, email: &str) -> Result<Option<EmailVerification>> {
        Ok(self.verifications.get(email).map(|v| v.value().clone()))
    }

    async fn mark_verified(&self, email: &str, at: DateTime<Utc>) -> Result<()> {
        match self.verifications.get_mut(email) {
            Some(mut v) => {
                v.verified_at = Some(at);
                Ok(())
            }
            None => Err(DomainError::Validation(format!(
                "no verification pending for {email}"
            ))),
        }
    }
}

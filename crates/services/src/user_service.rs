//! Account registration and profile.

use std::sync::Arc;

use domains::validation;
use domains::{
    AuthUser, DomainError, Entity, PasswordService, Result, User, UserInfo, UserRepository,
    UserStatistics, VerificationRepository,
};
use tracing::{info, instrument};

pub struct UserService {
    users: Arc<dyn UserRepository>,
    passwords: Arc<dyn PasswordService>,
    verifications: Arc<dyn VerificationRepository>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        passwords: Arc<dyn PasswordService>,
        verifications: Arc<dyn VerificationRepository>,
    ) -> Self {
        Self {
            users,
            passwords,
            verifications,
        }
    }

    /// Registers a new account. The account starts verified when the address
    /// already went through the email code flow.
    #[instrument(skip_all)]
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        nickname: Option<&str>,
    ) -> Result<UserInfo> {
        let email = validation::email(email)?;
        validation::password(password)?;
        let nickname = validation::nickname(nickname)?;

        if self.users.exists_by_email(&email).await? {
            return Err(DomainError::DuplicateEmail(email));
        }

        let email_verified = self
            .verifications
            .find(&email)
            .await?
            .is_some_and(|v| v.is_verified());
        let hash = self.passwords.hash(password).await?;

        let user = User::new(email, hash, nickname, email_verified);
        self.users.insert(&user).await?;
        info!(user_id = %user.id, email_verified, "user signed up");

        Ok(UserInfo::from(&user))
    }

    pub async fn get_me(&self, actor: &AuthUser) -> Result<UserInfo> {
        self.users
            .find_by_id(actor.user_id)
            .await?
            .map(|user| UserInfo::from(&user))
            .ok_or_else(|| DomainError::not_found(Entity::User, actor.user_id))
    }

    #[instrument(skip(self, actor, nickname), fields(user_id = %actor.user_id))]
    pub async fn update_nickname(
        &self,
        actor: &AuthUser,
        nickname: Option<&str>,
    ) -> Result<UserInfo> {
        let nickname = validation::nickname(nickname)?;
        if self.users.find_by_id(actor.user_id).await?.is_none() {
            return Err(DomainError::not_found(Entity::User, actor.user_id));
        }
        self.users.update_nickname(actor.user_id, &nickname).await?;
        self.get_me(actor).await
    }

    pub async fn statistics(&self, actor: &AuthUser) -> Result<UserStatistics> {
        if self.users.find_by_id(actor.user_id).await?.is_none() {
            return Err(DomainError::not_found(Entity::User, actor.user_id));
        }
        self.users.statistics(actor.user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::actor;
    use chrono::{Duration, Utc};
    use domains::{
        EmailVerification, MockPasswordService, MockUserRepository, MockVerificationRepository,
    };
    use mockall::predicate::eq;

    fn service(
        users: MockUserRepository,
        passwords: MockPasswordService,
        verifications: MockVerificationRepository,
    ) -> UserService {
        UserService::new(Arc::new(users), Arc::new(passwords), Arc::new(verifications))
    }

    #[tokio::test]
    async fn signup_hashes_password_and_normalizes_email() {
        let mut users = MockUserRepository::new();
        users.expect_exists_by_email().with(eq("neo@valley.io")).returning(|_| Ok(false));
        users
            .expect_insert()
            .withf(|u: &User| {
                u.email == "neo@valley.io" && u.password_hash == "hashed" && !u.email_verified
            })
            .times(1)
            .returning(|_| Ok(()));
        let mut passwords = MockPasswordService::new();
        passwords.expect_hash().returning(|_| Ok("hashed".into()));
        let mut verifications = MockVerificationRepository::new();
        verifications.expect_find().returning(|_| Ok(None));

        let info = service(users, passwords, verifications)
            .signup("Neo@Valley.io", "correct horse", Some("neo"))
            .await
            .unwrap();
        assert_eq!(info.email, "neo@valley.io");
        assert_eq!(info.nickname, "neo");
    }

    #[tokio::test]
    async fn signup_after_verification_marks_email_verified() {
        let mut users = MockUserRepository::new();
        users.expect_exists_by_email().returning(|_| Ok(false));
        users
            .expect_insert()
            .withf(|u: &User| u.email_verified)
            .times(1)
            .returning(|_| Ok(()));
        let mut passwords = MockPasswordService::new();
        passwords.expect_hash().returning(|_| Ok("hashed".into()));
        let mut verifications = MockVerificationRepository::new();
        verifications.expect_find().returning(|email| {
            Ok(Some(EmailVerification {
                email: email.to_string(),
                code: "code".into(),
                expires_at: Utc::now() + Duration::minutes(5),
                verified_at: Some(Utc::now()),
            }))
        });

        let info = service(users, passwords, verifications)
            .signup("trinity@valley.io", "password1", Some("trinity"))
            .await
            .unwrap();
        assert!(info.email_verified);
    }

    #[tokio::test]
    async fn signup_with_taken_email_conflicts() {
        let mut users = MockUserRepository::new();
        users.expect_exists_by_email().returning(|_| Ok(true));
        users.expect_insert().never();
        let mut passwords = MockPasswordService::new();
        passwords.expect_hash().never();

        let err = service(users, passwords, MockVerificationRepository::new())
            .signup("neo@valley.io", "password1", Some("neo"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "DUPLICATE_EMAIL");
    }

    #[tokio::test]
    async fn signup_rejects_short_password() {
        let err = service(
            MockUserRepository::new(),
            MockPasswordService::new(),
            MockVerificationRepository::new(),
        )
        .signup("neo@valley.io", "short", Some("neo"))
        .await
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn update_nickname_rejects_out_of_range_values() {
        let svc = service(
            MockUserRepository::new(),
            MockPasswordService::new(),
            MockVerificationRepository::new(),
        );
        let user = actor();
        for bad in [None, Some(""), Some("  "), Some("a"), Some("elevenchars")] {
            let err = svc.update_nickname(&user, bad).await.unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)), "{bad:?}");
        }
    }

    #[tokio::test]
    async fn update_nickname_stores_new_value() {
        let user = actor();
        let id = user.user_id;
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(move |_| {
            let mut u = User::new("a@b.io".into(), "h".into(), "새로운닉네임".into(), false);
            u.id = id;
            Ok(Some(u))
        });
        users
            .expect_update_nickname()
            .with(eq(id), eq("새로운닉네임"))
            .times(1)
            .returning(|_, _| Ok(()));

        let info = service(users, MockPasswordService::new(), MockVerificationRepository::new())
            .update_nickname(&user, Some("새로운닉네임"))
            .await
            .unwrap();
        assert_eq!(info.nickname, "새로운닉네임");
    }
}

//! # AuthService
//!
//! Login, token rotation and revocation, plus the email verification code
//! flow that precedes signup.
//!
//! Token ids (`jti`) go into the revocation store until the token would have
//! expired on its own; an access token is only accepted while its id is absent.

use std::sync::Arc;

use chrono::{Duration, Utc};
use domains::validation;
use domains::{
    AuthUser, DomainError, EmailVerification, Mailer, PasswordService, Result, RevocationStore,
    TokenKind, TokenPair, TokenService, UserRepository, VerificationRepository,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    passwords: Arc<dyn PasswordService>,
    tokens: Arc<dyn TokenService>,
    revocations: Arc<dyn RevocationStore>,
    verifications: Arc<dyn VerificationRepository>,
    mailer: Arc<dyn Mailer>,
    verification_ttl: Duration,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        passwords: Arc<dyn PasswordService>,
        tokens: Arc<dyn TokenService>,
        revocations: Arc<dyn RevocationStore>,
        verifications: Arc<dyn VerificationRepository>,
        mailer: Arc<dyn Mailer>,
        verification_ttl: Duration,
    ) -> Self {
        Self {
            users,
            passwords,
            tokens,
            revocations,
            verifications,
            mailer,
            verification_ttl,
        }
    }

    #[instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair> {
        let email = validation::email(email).map_err(|_| DomainError::InvalidCredentials)?;
        let user = match self.users.find_by_email(&email).await? {
            Some(user) if user.is_active => user,
            _ => return Err(DomainError::InvalidCredentials),
        };
        if !self.passwords.verify(password, &user.password_hash).await? {
            warn!(user_id = %user.id, "login rejected: wrong password");
            return Err(DomainError::InvalidCredentials);
        }

        let pair = self.tokens.issue(user.id, user.role)?;
        self.users.record_login(user.id, Utc::now()).await?;
        info!(user_id = %user.id, "user logged in");
        Ok(pair)
    }

    /// Trades a refresh token for a new pair. The presented token is revoked,
    /// and only the caller that revokes it gets a pair.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let claims = self.tokens.verify(refresh_token, TokenKind::Refresh)?;
        let spent = || DomainError::Unauthorized("refresh token has been revoked".into());
        if self.revocations.is_revoked(&claims.token_id).await? {
            return Err(spent());
        }
        let user = self
            .users
            .find_by_id(claims.user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| DomainError::Unauthorized("account is no longer active".into()))?;

        if !self.revocations.revoke(&claims.token_id, claims.expires_at).await? {
            return Err(spent());
        }
        let pair = self.tokens.issue(user.id, user.role)?;
        info!(user_id = %user.id, "tokens refreshed");
        Ok(pair)
    }

    /// Revokes the caller's access token and, when it is valid and theirs,
    /// the refresh token as well.
    #[instrument(skip(self, actor, refresh_token), fields(user_id = %actor.user_id))]
    pub async fn logout(&self, actor: &AuthUser, refresh_token: Option<&str>) -> Result<()> {
        self.revocations.revoke(&actor.token_id, actor.expires_at).await?;

        if let Some(token) = refresh_token {
            match self.tokens.verify(token, TokenKind::Refresh) {
                Ok(claims) if claims.user_id == actor.user_id => {
                    self.revocations.revoke(&claims.token_id, claims.expires_at).await?;
                }
                Ok(_) => warn!("logout ignored a refresh token of another user"),
                Err(err) => warn!(error = %err, "logout ignored an invalid refresh token"),
            }
        }
        info!("user logged out");
        Ok(())
    }

    /// Resolves a bearer access token into the calling user.
    pub async fn authenticate(&self, access_token: &str) -> Result<AuthUser> {
        let claims = self.tokens.verify(access_token, TokenKind::Access)?;
        if self.revocations.is_revoked(&claims.token_id).await? {
            return Err(DomainError::Unauthorized("token has been revoked".into()));
        }
        Ok(AuthUser {
            user_id: claims.user_id,
            role: claims.role,
            token_id: claims.token_id,
            expires_at: claims.expires_at,
        })
    }

    #[instrument(skip_all)]
    pub async fn send_verification_email(&self, email: &str) -> Result<()> {
        let email = validation::email(email)?;
        if self.users.exists_by_email(&email).await? {
            return Err(DomainError::DuplicateEmail(email));
        }

        let verification = EmailVerification {
            email,
            code: Uuid::new_v4().to_string(),
            expires_at: Utc::now() + self.verification_ttl,
            verified_at: None,
        };
        self.verifications.upsert(&verification).await?;

        self.mailer
            .send_verification_code(&verification.email, &verification.code)
            .await
            .map_err(|err| match err {
                DomainError::EmailSendFailure(_) => err,
                other => DomainError::EmailSendFailure(other.to_string()),
            })?;
        info!("verification code sent");
        Ok(())
    }

    #[instrument(skip_all)]
    pub async fn verify_email(&self, email: &str, code: &str) -> Result<()> {
        let email = validation::email(email)?;
        let mismatch = || DomainError::Validation("verification code is invalid or expired".into());

        let verification = self.verifications.find(&email).await?.ok_or_else(mismatch)?;
        let now = Utc::now();
        if verification.code != code.trim() || verification.is_expired(now) {
            return Err(mismatch());
        }
        if verification.is_verified() {
            return Ok(());
        }
        self.verifications.mark_verified(&email, now).await?;
        info!("email verified");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::actor;
    use domains::{
        MockMailer, MockPasswordService, MockRevocationStore, MockTokenService, MockUserRepository,
        MockVerificationRepository, Role, TokenClaims, User,
    };
    use mockall::predicate::eq;

    #[derive(Default)]
    struct Mocks {
        users: MockUserRepository,
        passwords: MockPasswordService,
        tokens: MockTokenService,
        revocations: MockRevocationStore,
        verifications: MockVerificationRepository,
        mailer: MockMailer,
    }

    impl Mocks {
        fn into_service(self) -> AuthService {
            AuthService::new(
                Arc::new(self.users),
                Arc::new(self.passwords),
                Arc::new(self.tokens),
                Arc::new(self.revocations),
                Arc::new(self.verifications),
                Arc::new(self.mailer),
                Duration::minutes(10),
            )
        }
    }

    fn pair() -> TokenPair {
        TokenPair {
            access_token: "access".into(),
            refresh_token: "refresh".into(),
            token_type: "Bearer".into(),
            expires_in: 1800,
        }
    }

    fn claims(user_id: Uuid, kind: TokenKind, jti: &str) -> TokenClaims {
        TokenClaims {
            user_id,
            role: Role::User,
            kind,
            token_id: jti.into(),
            expires_at: Utc::now() + Duration::minutes(30),
        }
    }

    fn stored_user(active: bool) -> User {
        let mut user = User::new("neo@valley.io".into(), "hash".into(), "neo".into(), true);
        user.is_active = active;
        user
    }

    #[tokio::test]
    async fn login_issues_tokens_and_records_login() {
        let user = stored_user(true);
        let id = user.id;
        let mut m = Mocks::default();
        m.users
            .expect_find_by_email()
            .with(eq("neo@valley.io"))
            .returning(move |_| Ok(Some(user.clone())));
        m.passwords.expect_verify().returning(|_, _| Ok(true));
        m.tokens.expect_issue().with(eq(id), eq(Role::User)).returning(|_, _| Ok(pair()));
        m.users
            .expect_record_login()
            .withf(move |uid, _| *uid == id)
            .times(1)
            .returning(|_, _| Ok(()));

        let tokens = m.into_service().login("NEO@valley.io", "password1").await.unwrap();
        assert_eq!(tokens.token_type, "Bearer");
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let mut unknown = Mocks::default();
        unknown.users.expect_find_by_email().returning(|_| Ok(None));

        let mut inactive = Mocks::default();
        inactive.users.expect_find_by_email().returning(|_| Ok(Some(stored_user(false))));
        inactive.passwords.expect_verify().never();

        let mut wrong = Mocks::default();
        wrong.users.expect_find_by_email().returning(|_| Ok(Some(stored_user(true))));
        wrong.passwords.expect_verify().returning(|_, _| Ok(false));
        wrong.tokens.expect_issue().never();

        for m in [unknown, inactive, wrong] {
            let err = m.into_service().login("neo@valley.io", "password1").await.unwrap_err();
            assert_eq!(err.code(), "INVALID_CREDENTIALS");
        }
    }

    #[tokio::test]
    async fn revoked_access_token_is_rejected() {
        let mut m = Mocks::default();
        let uid = Uuid::now_v7();
        m.tokens
            .expect_verify()
            .returning(move |_, kind| Ok(claims(uid, kind, "jti-1")));
        m.revocations.expect_is_revoked().with(eq("jti-1")).returning(|_| Ok(true));

        let err = m.into_service().authenticate("token").await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn authenticate_returns_the_caller() {
        let mut m = Mocks::default();
        let uid = Uuid::now_v7();
        m.tokens
            .expect_verify()
            .with(eq("token"), eq(TokenKind::Access))
            .returning(move |_, kind| Ok(claims(uid, kind, "jti-2")));
        m.revocations.expect_is_revoked().returning(|_| Ok(false));

        let caller = m.into_service().authenticate("token").await.unwrap();
        assert_eq!(caller.user_id, uid);
        assert_eq!(caller.token_id, "jti-2");
    }

    #[tokio::test]
    async fn refresh_revokes_the_presented_token() {
        let user = stored_user(true);
        let uid = user.id;
        let mut m = Mocks::default();
        m.tokens
            .expect_verify()
            .with(eq("refresh"), eq(TokenKind::Refresh))
            .returning(move |_, kind| Ok(claims(uid, kind, "old")));
        m.revocations.expect_is_revoked().returning(|_| Ok(false));
        m.users.expect_find_by_id().returning(move |_| Ok(Some(user.clone())));
        m.revocations
            .expect_revoke()
            .withf(|jti, _| jti == "old")
            .times(1)
            .returning(|_, _| Ok(true));
        m.tokens.expect_issue().returning(|_, _| Ok(pair()));

        m.into_service().refresh("refresh").await.unwrap();
    }

    #[tokio::test]
    async fn refresh_that_loses_the_revocation_gets_no_tokens() {
        let user = stored_user(true);
        let uid = user.id;
        let mut m = Mocks::default();
        m.tokens
            .expect_verify()
            .returning(move |_, kind| Ok(claims(uid, kind, "old")));
        m.revocations.expect_is_revoked().returning(|_| Ok(false));
        m.users.expect_find_by_id().returning(move |_| Ok(Some(user.clone())));
        m.revocations.expect_revoke().times(1).returning(|_, _| Ok(false));
        m.tokens.expect_issue().never();

        let err = m.into_service().refresh("refresh").await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn logout_revokes_access_and_own_refresh_token() {
        let caller = actor();
        let uid = caller.user_id;
        let access_jti = caller.token_id.clone();
        let mut m = Mocks::default();
        m.tokens
            .expect_verify()
            .returning(move |_, kind| Ok(claims(uid, kind, "refresh-jti")));
        m.revocations
            .expect_revoke()
            .withf(move |jti, _| jti == access_jti || jti == "refresh-jti")
            .times(2)
            .returning(|_, _| Ok(true));

        m.into_service().logout(&caller, Some("refresh")).await.unwrap();
    }

    #[tokio::test]
    async fn logout_ignores_someone_elses_refresh_token() {
        let caller = actor();
        let mut m = Mocks::default();
        m.tokens
            .expect_verify()
            .returning(|_, kind| Ok(claims(Uuid::now_v7(), kind, "foreign")));
        m.revocations.expect_revoke().times(1).returning(|_, _| Ok(true));

        m.into_service().logout(&caller, Some("refresh")).await.unwrap();
    }

    #[tokio::test]
    async fn verification_email_for_registered_address_conflicts() {
        let mut m = Mocks::default();
        m.users.expect_exists_by_email().returning(|_| Ok(true));
        m.mailer.expect_send_verification_code().never();

        let err = m.into_service().send_verification_email("neo@valley.io").await.unwrap_err();
        assert_eq!(err.code(), "DUPLICATE_EMAIL");
    }

    #[tokio::test]
    async fn mailer_failure_surfaces_as_email_send_fail() {
        let mut m = Mocks::default();
        m.users.expect_exists_by_email().returning(|_| Ok(false));
        m.verifications
            .expect_upsert()
            .withf(|v: &EmailVerification| v.email == "neo@valley.io" && v.verified_at.is_none())
            .returning(|_| Ok(()));
        m.mailer
            .expect_send_verification_code()
            .returning(|_, _| Err(DomainError::internal("connection refused")));

        let err = m.into_service().send_verification_email("neo@valley.io").await.unwrap_err();
        assert_eq!(err.code(), "EMAIL_SEND_FAIL");
    }

    #[tokio::test]
    async fn verify_email_checks_code_and_expiry() {
        let pending = |code: &str, minutes: i64| EmailVerification {
            email: "neo@valley.io".into(),
            code: code.into(),
            expires_at: Utc::now() + Duration::minutes(minutes),
            verified_at: None,
        };

        let mut ok = Mocks::default();
        let v = pending("abc", 5);
        ok.verifications.expect_find().returning(move |_| Ok(Some(v.clone())));
        ok.verifications.expect_mark_verified().times(1).returning(|_, _| Ok(()));
        ok.into_service().verify_email("neo@valley.io", "abc").await.unwrap();

        let mut wrong = Mocks::default();
        let v = pending("abc", 5);
        wrong.verifications.expect_find().returning(move |_| Ok(Some(v.clone())));
        wrong.verifications.expect_mark_verified().never();
        assert!(wrong.into_service().verify_email("neo@valley.io", "xyz").await.is_err());

        let mut expired = Mocks::default();
        let v = pending("abc", -1);
        expired.verifications.expect_find().returning(move |_| Ok(Some(v.clone())));
        expired.verifications.expect_mark_verified().never();
        let err = expired.into_service().verify_email("neo@valley.io", "abc").await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}

//! Adapter selection. Each port gets its external adapter when the matching
//! setting is present and the binary was built with that feature, and its
//! in-process adapter otherwise.

use std::sync::Arc;

use ai_adapters::{AiClientConfig, HttpContentGenerator};
#[cfg(feature = "db-postgres")]
use anyhow::Context;
use auth_adapters::{Argon2PasswordService, JwtConfig, JwtTokenService, LogMailer};
use configs::Settings;
use domains::{
    BoardRepository, CloneRepository, Mailer, PostRepository, ReplyRepository, RevocationStore,
    SubscriptionRepository, UserRepository, VerificationRepository,
};
use secrecy::ExposeSecret;
use services::Ports;
use storage_adapters::{MemoryRevocationStore, MemoryStore};
use tracing::{info, warn};

struct Repositories {
    users: Arc<dyn UserRepository>,
    boards: Arc<dyn BoardRepository>,
    clones: Arc<dyn CloneRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    posts: Arc<dyn PostRepository>,
    replies: Arc<dyn ReplyRepository>,
    verifications: Arc<dyn VerificationRepository>,
}

impl Repositories {
    fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UserRepository
            + BoardRepository
            + CloneRepository
            + SubscriptionRepository
            + PostRepository
            + ReplyRepository
            + VerificationRepository
            + 'static,
    {
        Self {
            users: store.clone(),
            boards: store.clone(),
            clones: store.clone(),
            subscriptions: store.clone(),
            posts: store.clone(),
            replies: store.clone(),
            verifications: store,
        }
    }
}

async fn repositories(settings: &Settings) -> anyhow::Result<Repositories> {
    #[cfg(feature = "db-postgres")]
    if let Some(url) = &settings.database.url {
        let max_connections = settings.database.max_connections;
        let store = storage_adapters::PgStore::connect(url.expose_secret(), max_connections)
            .await
            .context("failed to connect to postgres")?;
        store.migrate().await?;
        info!(max_connections = settings.database.max_connections, "using postgres store");
        return Ok(Repositories::from_store(Arc::new(store)));
    }

    #[cfg(not(feature = "db-postgres"))]
    if settings.database.url.as_ref().is_some_and(|url| !url.expose_secret().is_empty()) {
        warn!("database.url is set but this build has no postgres support");
    }

    warn!("no database configured; all data is kept in memory and lost on exit");
    Ok(Repositories::from_store(Arc::new(MemoryStore::new())))
}

fn revocations(settings: &Settings) -> anyhow::Result<Arc<dyn RevocationStore>> {
    #[cfg(feature = "redis")]
    if let Some(url) = &settings.redis.url {
        let store = storage_adapters::RedisRevocationStore::connect(url)?;
        info!("using redis token revocation store");
        return Ok(Arc::new(store));
    }

    #[cfg(not(feature = "redis"))]
    if settings.redis.url.is_some() {
        warn!("redis.url is set but this build has no redis support");
    }

    info!("using in-memory token revocation store");
    Ok(Arc::new(MemoryRevocationStore::new()))
}

fn mailer(settings: &Settings) -> anyhow::Result<Arc<dyn Mailer>> {
    #[cfg(feature = "mail-smtp")]
    if let Some(host) = &settings.mail.smtp_host {
        let mail = &settings.mail;
        let mailer = auth_adapters::SmtpMailer::new(
            host,
            mail.username.clone(),
            mail.password.as_ref().map(|p| p.expose_secret().to_string()),
            &mail.from,
        )?;
        info!(%host, "using SMTP mailer");
        return Ok(Arc::new(mailer));
    }

    #[cfg(not(feature = "mail-smtp"))]
    if settings.mail.smtp_host.is_some() {
        warn!("mail.smtp_host is set but this build has no SMTP support");
    }

    warn!("no SMTP host configured; verification codes are only logged");
    Ok(Arc::new(LogMailer))
}

pub async fn ports(settings: &Settings) -> anyhow::Result<Ports> {
    let repos = repositories(settings).await?;

    let generator = HttpContentGenerator::new(AiClientConfig {
        base_url: settings.ai.base_url.clone(),
        timeout: settings.ai.timeout(),
        connect_timeout: settings.ai.connect_timeout(),
    })?;
    info!(
        base_url = %settings.ai.base_url,
        timeout_secs = settings.ai.timeout_secs,
        "AI service client ready"
    );

    let tokens = JwtTokenService::new(JwtConfig {
        secret: settings.auth.jwt_secret.expose_secret().to_string(),
        issuer: settings.auth.issuer.clone(),
        access_ttl: chrono::Duration::minutes(settings.auth.access_ttl_minutes),
        refresh_ttl: chrono::Duration::days(settings.auth.refresh_ttl_days),
    });

    Ok(Ports {
        users: repos.users,
        boards: repos.boards,
        clones: repos.clones,
        subscriptions: repos.subscriptions,
        posts: repos.posts,
        replies: repos.replies,
        verifications: repos.verifications,
        generator: Arc::new(generator),
        passwords: Arc::new(Argon2PasswordService::new()),
        tokens: Arc::new(tokens),
        revocations: revocations(settings)?,
        mailer: mailer(settings)?,
    })
}

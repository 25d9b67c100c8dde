//! Verification mail delivery.
//!
//! `LogMailer` writes the code to the log and is meant for local development.
//! `SmtpMailer` relays through an SMTP server with STARTTLS/TLS.

use async_trait::async_trait;
use domains::{Mailer, Result};
use tracing::info;

pub const VERIFICATION_SUBJECT: &str = "AI Valley email verification";

pub fn verification_body(code: &str) -> String {
    format!(
        "Your AI Valley verification code is:\n\n{code}\n\n\
         The code expires shortly. If you did not request it, ignore this email."
    )
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_verification_code(&self, to: &str, code: &str) -> Result<()> {
        info!(%to, %code, "verification email (log mailer, not delivered)");
        Ok(())
    }
}

#[cfg(feature = "mail-smtp")]
pub use self::smtp::SmtpMailer;

#[cfg(feature = "mail-smtp")]
mod smtp {
    use anyhow::Context;
    use async_trait::async_trait;
    use domains::{DomainError, Mailer, Result};
    use lettre::message::{header::ContentType, Mailbox};
    use lettre::transport::smtp::authentication::Credentials;
    use lettre::{Message, SmtpTransport, Transport};
    use tracing::{error, info};

    use super::{verification_body, VERIFICATION_SUBJECT};

    pub struct SmtpMailer {
        transport: SmtpTransport,
        from: Mailbox,
    }

    impl SmtpMailer {
        pub fn new(
            host: &str,
            username: Option<String>,
            password: Option<String>,
            from: &str,
        ) -> anyhow::Result<Self> {
            let mut builder =
                SmtpTransport::relay(host).context("failed to create SMTP transport")?;
            if let (Some(user), Some(pass)) = (username, password) {
                builder = builder.credentials(Credentials::new(user, pass));
            }
            let from = from.parse().context("invalid mail.from address")?;
            Ok(Self {
                transport: builder.build(),
                from,
            })
        }
    }

    #[async_trait]
    impl Mailer for SmtpMailer {
        async fn send_verification_code(&self, to: &str, code: &str) -> Result<()> {
            let to: Mailbox = to
                .parse()
                .map_err(|e| DomainError::EmailSendFailure(format!("invalid recipient: {e}")))?;
            let email = Message::builder()
                .from(self.from.clone())
                .to(to)
                .subject(VERIFICATION_SUBJECT)
                .header(ContentType::TEXT_PLAIN)
                .body(verification_body(code))
                .map_err(|e| DomainError::EmailSendFailure(format!("failed to build email: {e}")))?;

            // SmtpTransport is blocking; keep it off the runtime workers.
            let transport = self.transport.clone();
            tokio::task::spawn_blocking(move || transport.send(&email))
                .await
                .map_err(|e| DomainError::EmailSendFailure(e.to_string()))?
                .map_err(|e| {
                    error!(error = %e, "SMTP delivery failed");
                    DomainError::EmailSendFailure(e.to_string())
                })?;
            info!("verification email sent");
            Ok(())
        }
    }
}

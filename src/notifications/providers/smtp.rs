//! Relay SMTP autenticato (Gmail, Office365, server aziendali...)

use crate::core::config::SmtpConfig;
use crate::notifications::{Delivery, EmailProvider, InviteEmail, ProviderError};
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use tracing::{debug, instrument};

pub struct SmtpRelayProvider {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    host: String,
}

impl SmtpRelayProvider {
    /// Il mittente è l'utente SMTP stesso, come richiede la maggior parte dei relay.
    /// Se l'utente non è un indirizzo (es. `apikey`) si usa `fallback_from`.
    pub fn new(config: &SmtpConfig, fallback_from: &str) -> Result<Self, ProviderError> {
        let creds = Credentials::new(config.username.clone(), config.password.clone());

        let builder = if config.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
        };
        let mailer = builder.port(config.port).credentials(creds).build();

        let from = match config.username.parse::<Mailbox>() {
            Ok(from) => from,
            Err(_) => fallback_from.parse()?,
        };

        Ok(Self {
            mailer,
            from,
            host: config.host.clone(),
        })
    }
}

#[async_trait]
impl EmailProvider for SmtpRelayProvider {
    fn name(&self) -> &'static str {
        "smtp"
    }

    #[instrument(skip(self, email), fields(to = %email.to, host = %self.host))]
    async fn attempt_send(&self, email: &InviteEmail) -> Result<Delivery, ProviderError> {
        let message = email.to_mime(self.from.clone())?;
        let response = self.mailer.send(message).await?;
        debug!("SMTP relay answered with code {}", response.code());

        Ok(Delivery::new(self.name()))
    }
}

//! Catena di fallback dei provider email
//!
//! Un'unica lista ordinata di strategie dietro la capability [`EmailProvider`]:
//! ogni provider viene provato una sola volta, ci si ferma al primo successo.

use super::providers::{EtherealProvider, MailgunProvider, SendGridProvider, SmtpRelayProvider};
use super::{Delivery, EmailProvider, InviteEmail};
use crate::core::config::MailConfig;
use tracing::{debug, info, instrument, warn};

/// Un tentativo fallito, con il nome del provider e la diagnostica
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderFailure {
    pub provider: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DispatchError {
    #[error("no email provider available")]
    NoProviders,

    #[error("could not render the invite email: {0}")]
    Render(String),

    /// Tutti i tentativi, nell'ordine in cui sono stati fatti
    #[error("{}", last_reason(.0))]
    AllFailed(Vec<ProviderFailure>),
}

fn last_reason(failures: &[ProviderFailure]) -> &str {
    failures
        .last()
        .map(|f| f.reason.as_str())
        .unwrap_or("all email providers failed")
}

impl DispatchError {
    pub fn attempts(&self) -> &[ProviderFailure] {
        match self {
            DispatchError::NoProviders | DispatchError::Render(_) => &[],
            DispatchError::AllFailed(attempts) => attempts,
        }
    }
}

pub struct NotificationDispatcher {
    providers: Vec<Box<dyn EmailProvider>>,
}

impl NotificationDispatcher {
    pub fn new(providers: Vec<Box<dyn EmailProvider>>) -> Self {
        Self { providers }
    }

    /// Costruisce la catena dalla configurazione: Mailgun, SendGrid, relay SMTP.
    /// La sandbox Ethereal entra solo se nessuno dei tre è stato costruito.
    pub fn from_config(mail: &MailConfig, client: reqwest::Client) -> Self {
        let mut providers: Vec<Box<dyn EmailProvider>> = Vec::new();

        if let Some(mailgun) = &mail.mailgun {
            providers.push(Box::new(MailgunProvider::new(
                client.clone(),
                mailgun,
                &mail.from,
            )));
        }

        if let Some(sendgrid) = &mail.sendgrid {
            match SendGridProvider::new(client.clone(), sendgrid, &mail.from) {
                Ok(provider) => providers.push(Box::new(provider)),
                Err(e) => warn!("Skipping SendGrid, invalid MAIL_FROM: {}", e),
            }
        }

        if let Some(smtp) = &mail.smtp {
            match SmtpRelayProvider::new(smtp, &mail.from) {
                Ok(provider) => providers.push(Box::new(provider)),
                Err(e) => warn!("Skipping SMTP relay {}: {}", smtp.host, e),
            }
        }

        if providers.is_empty() {
            info!("No usable email provider, invites go to the Ethereal sandbox");
            providers.push(Box::new(EtherealProvider::new(client)));
        }

        Self::new(providers)
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Percorre la catena in ordine. Sequenziale: nessun tentativo parte prima
    /// che il precedente sia fallito.
    #[instrument(skip(self, email), fields(to = %email.to))]
    pub async fn send(&self, email: &InviteEmail) -> Result<Delivery, DispatchError> {
        if self.providers.is_empty() {
            warn!("Email dispatch requested but the provider chain is empty");
            return Err(DispatchError::NoProviders);
        }

        let mut failures = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            debug!("Trying email provider {}", provider.name());
            match provider.attempt_send(email).await {
                Ok(delivery) => {
                    info!(
                        "Invite email sent via {} (message id: {:?})",
                        provider.name(),
                        delivery.message_id
                    );
                    return Ok(delivery);
                }
                Err(e) => {
                    warn!("Email provider {} failed: {}", provider.name(), e);
                    failures.push(ProviderFailure {
                        provider: provider.name(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Err(DispatchError::AllFailed(failures))
    }

    /// Scorciatoia: compone l'email di invito e la invia lungo la catena
    pub async fn send_email_invite(
        &self,
        to: &str,
        sender_name: &str,
        invite_link: &str,
        note: Option<&str>,
    ) -> Result<Delivery, DispatchError> {
        let email = InviteEmail::invitation(to, sender_name, invite_link, note)
            .map_err(|e| DispatchError::Render(e.to_string()))?;
        self.send(&email).await
    }
}

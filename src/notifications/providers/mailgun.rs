//! Mailgun - invio transazionale via API HTTP con dominio autenticato

use super::reject_unless_success;
use crate::core::config::MailgunConfig;
use crate::notifications::{Delivery, EmailProvider, InviteEmail, ProviderError};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

pub struct MailgunProvider {
    client: reqwest::Client,
    api_key: String,
    domain: String,
    base_url: String,
    from: String,
}

#[derive(Deserialize)]
struct MailgunResponse {
    id: Option<String>,
}

impl MailgunProvider {
    pub fn new(client: reqwest::Client, config: &MailgunConfig, from: &str) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            domain: config.domain.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            from: from.to_string(),
        }
    }
}

#[async_trait]
impl EmailProvider for MailgunProvider {
    fn name(&self) -> &'static str {
        "mailgun"
    }

    #[instrument(skip(self, email), fields(to = %email.to, domain = %self.domain))]
    async fn attempt_send(&self, email: &InviteEmail) -> Result<Delivery, ProviderError> {
        let url = format!("{}/v3/{}/messages", self.base_url, self.domain);
        debug!("Posting message to Mailgun");

        let response = self
            .client
            .post(url)
            .basic_auth("api", Some(&self.api_key))
            .form(&[
                ("from", self.from.as_str()),
                ("to", email.to.as_str()),
                ("subject", email.subject.as_str()),
                ("text", email.text.as_str()),
                ("html", email.html.as_str()),
            ])
            .send()
            .await?;

        let body: MailgunResponse = reject_unless_success(response).await?.json().await?;

        Ok(Delivery {
            message_id: body.id,
            ..Delivery::new(self.name())
        })
    }
}

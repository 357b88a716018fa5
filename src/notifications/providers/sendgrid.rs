//! SendGrid - invio transazionale via API HTTP, basta la chiave

use super::reject_unless_success;
use crate::core::config::SendGridConfig;
use crate::notifications::{Delivery, EmailProvider, InviteEmail, ProviderError};
use async_trait::async_trait;
use lettre::message::Mailbox;
use serde_json::json;
use tracing::{debug, instrument};

const SENDGRID_API: &str = "https://api.sendgrid.com";

pub struct SendGridProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    from: Mailbox,
}

impl SendGridProvider {
    pub fn new(
        client: reqwest::Client,
        config: &SendGridConfig,
        from: &str,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: SENDGRID_API.to_string(),
            from: from.parse()?,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl EmailProvider for SendGridProvider {
    fn name(&self) -> &'static str {
        "sendgrid"
    }

    #[instrument(skip(self, email), fields(to = %email.to))]
    async fn attempt_send(&self, email: &InviteEmail) -> Result<Delivery, ProviderError> {
        debug!("Posting message to SendGrid");

        let mut from = json!({ "email": self.from.email.to_string() });
        if let Some(name) = &self.from.name {
            from["name"] = json!(name);
        }

        let payload = json!({
            "personalizations": [{ "to": [{ "email": email.to }] }],
            "from": from,
            "subject": email.subject,
            "content": [
                { "type": "text/plain", "value": email.text },
                { "type": "text/html", "value": email.html },
            ],
        });

        let response = self
            .client
            .post(format!("{}/v3/mail/send", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        // 202 Accepted, body vuoto: l'id arriva in un header
        let response = reject_unless_success(response).await?;
        let message_id = response
            .headers()
            .get("x-message-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(Delivery {
            message_id,
            ..Delivery::new(self.name())
        })
    }
}

//! Invio SMS degli inviti (Twilio). Un solo provider, nessuna sandbox:
//! senza credenziali l'invio fallisce.

use crate::core::config::TwilioConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

const TWILIO_API: &str = "https://api.twilio.com";

#[derive(Debug, thiserror::Error)]
pub enum SmsError {
    #[error("SMS provider is not configured")]
    NotConfigured,

    #[error("SMS request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("SMS provider rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Ricevuta restituita dal provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmsReceipt {
    pub sid: String,
    pub status: String,
    pub to: String,
}

pub struct SmsDispatcher {
    client: reqwest::Client,
    config: Option<TwilioConfig>,
    base_url: String,
}

impl SmsDispatcher {
    pub fn new(client: reqwest::Client, config: Option<TwilioConfig>) -> Self {
        Self {
            client,
            config,
            base_url: TWILIO_API.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    #[instrument(skip(self, invite_link), fields(to = %to))]
    pub async fn send_sms_invite(
        &self,
        to: &str,
        sender_name: &str,
        invite_link: &str,
    ) -> Result<SmsReceipt, SmsError> {
        let Some(config) = &self.config else {
            warn!("SMS requested but Twilio credentials are missing");
            return Err(SmsError::NotConfigured);
        };

        let body = format!("{} invited you to Ratify! Accept: {}", sender_name, invite_link);
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, config.account_sid
        );

        let response = self
            .client
            .post(url)
            .basic_auth(&config.account_sid, Some(&config.auth_token))
            .form(&[
                ("To", to),
                ("From", config.from_number.as_str()),
                ("Body", body.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Twilio rejected SMS with status {}", status);
            return Err(SmsError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let receipt: SmsReceipt = response.json().await?;
        info!("SMS invite queued: sid={} status={}", receipt.sid, receipt.status);
        Ok(receipt)
    }
}

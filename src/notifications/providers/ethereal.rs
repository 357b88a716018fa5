//! Ethereal - sandbox usata solo quando nessun provider reale è configurato
//!
//! Crea al primo invio un account usa e getta tramite l'API di Ethereal, invia via SMTP
//! e restituisce l'URL di anteprima del messaggio al posto di una consegna reale.
//! L'account resta in cache nell'istanza del provider.

use crate::notifications::{Delivery, EmailProvider, InviteEmail, ProviderError};
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::response::Response;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

const ETHEREAL_API: &str = "https://api.nodemailer.com";

#[derive(Debug, Deserialize)]
struct SmtpSettings {
    host: String,
    port: u16,
    secure: bool,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    status: String,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    user: String,
    #[serde(default)]
    pass: String,
    smtp: Option<SmtpSettings>,
    #[serde(default)]
    web: Option<String>,
}

struct SandboxAccount {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    web: String,
}

pub struct EtherealProvider {
    client: reqwest::Client,
    api_url: String,
    account: OnceCell<SandboxAccount>,
}

impl EtherealProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            api_url: ETHEREAL_API.to_string(),
            account: OnceCell::new(),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn account(&self) -> Result<&SandboxAccount, ProviderError> {
        self.account
            .get_or_try_init(|| self.create_account())
            .await
    }

    async fn create_account(&self) -> Result<SandboxAccount, ProviderError> {
        debug!("Creating throwaway Ethereal account");
        let response = self
            .client
            .post(format!("{}/user", self.api_url))
            .json(&json!({
                "requestor": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            }))
            .send()
            .await?;
        let response = super::reject_unless_success(response).await?;
        let body: AccountResponse = response.json().await?;

        if body.status != "success" {
            return Err(ProviderError::Sandbox(
                body.error.unwrap_or_else(|| format!("status {}", body.status)),
            ));
        }
        let smtp = body
            .smtp
            .ok_or_else(|| ProviderError::Sandbox("missing SMTP settings".to_string()))?;

        let builder = if smtp.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)?
        };
        let mailer = builder
            .port(smtp.port)
            .credentials(Credentials::new(body.user.clone(), body.pass))
            .build();

        info!("Ethereal sandbox account ready: {}", body.user);
        Ok(SandboxAccount {
            mailer,
            from: body.user.parse()?,
            web: body
                .web
                .unwrap_or_else(|| "https://ethereal.email".to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

/// Ethereal risponde `250 Accepted [STATUS=new MSGID=...]`: il MSGID identifica l'anteprima
fn message_id_from(response: &Response) -> Option<String> {
    response.message().find_map(|line| {
        let start = line.find("MSGID=")? + "MSGID=".len();
        let id: String = line[start..]
            .chars()
            .take_while(|c| !c.is_whitespace() && *c != ']')
            .collect();
        (!id.is_empty()).then_some(id)
    })
}

#[async_trait]
impl EmailProvider for EtherealProvider {
    fn name(&self) -> &'static str {
        "ethereal"
    }

    #[instrument(skip(self, email), fields(to = %email.to))]
    async fn attempt_send(&self, email: &InviteEmail) -> Result<Delivery, ProviderError> {
        let account = self.account().await?;
        let message = email.to_mime(account.from.clone())?;
        let response = account.mailer.send(message).await?;

        let message_id = message_id_from(&response);
        let preview_url = message_id
            .as_ref()
            .map(|id| format!("{}/message/{}", account.web, id));
        if let Some(url) = &preview_url {
            info!("Sandbox email preview: {}", url);
        }

        Ok(Delivery {
            provider: self.name(),
            message_id,
            preview_url,
        })
    }
}

//! Notifications - Consegna degli inviti via email (catena di provider) e via SMS
//!
//! Ogni provider email implementa la stessa capability [`EmailProvider`]; il
//! [`NotificationDispatcher`] li prova in ordine di priorità e si ferma al primo successo.
//! L'SMS ha un solo provider e nessun fallback.

pub mod dispatcher;
pub mod message;
pub mod providers;
pub mod sms;

pub use dispatcher::{DispatchError, NotificationDispatcher, ProviderFailure};
pub use message::InviteEmail;
pub use sms::{SmsDispatcher, SmsError, SmsReceipt};

use async_trait::async_trait;

/// Esito positivo di un tentativo di consegna
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub provider: &'static str,
    /// Identificativo assegnato dal provider, se lo restituisce
    pub message_id: Option<String>,
    /// Solo per la sandbox: URL dove ispezionare il messaggio
    pub preview_url: Option<String>,
}

impl Delivery {
    pub fn new(provider: &'static str) -> Self {
        Self {
            provider,
            message_id: None,
            preview_url: None,
        }
    }
}

/// Fallimento di un singolo provider
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email building error: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("sandbox account unavailable: {0}")]
    Sandbox(String),
}

/// Capability comune a tutti i canali email
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Nome stabile, usato nei log e nelle risposte
    fn name(&self) -> &'static str;

    /// Un solo tentativo, senza retry
    async fn attempt_send(&self, email: &InviteEmail) -> Result<Delivery, ProviderError>;
}

//! Provider email concreti, in ordine di priorità

pub mod ethereal;
pub mod mailgun;
pub mod sendgrid;
pub mod smtp;

pub use ethereal::EtherealProvider;
pub use mailgun::MailgunProvider;
pub use sendgrid::SendGridProvider;
pub use smtp::SmtpRelayProvider;

use super::ProviderError;

/// Converte una risposta HTTP non 2xx nell'errore del provider, conservando il body
pub(crate) async fn reject_unless_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Rejected {
        status: status.as_u16(),
        body,
    })
}

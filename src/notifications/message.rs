//! Contenuto dell'email di invito

use super::ProviderError;
use crate::entities::INVITATION_TTL_DAYS;
use lazy_static::lazy_static;
use lettre::Message;
use lettre::message::{Mailbox, MultiPart, SinglePart, header::ContentType};
use tera::{Context, Tera};

lazy_static! {
    // template incorporati nel binario; solo l'HTML viene escapato
    static ref TEMPLATES: Tera = {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("invite.html", include_str!("../../templates/email/invite.html")),
            ("invite.txt", include_str!("../../templates/email/invite.txt")),
        ])
        .unwrap();
        tera.autoescape_on(vec![".html"]);
        tera
    };
}

#[derive(Debug, Clone, PartialEq)]
pub struct InviteEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

impl InviteEmail {
    /// Email con bottone verso il deep link, copia testuale del link,
    /// eventuale nota personale e avviso di scadenza
    pub fn invitation(
        to: &str,
        sender_name: &str,
        invite_link: &str,
        note: Option<&str>,
    ) -> Result<Self, ProviderError> {
        let mut context = Context::new();
        context.insert("sender_name", sender_name);
        context.insert("invite_link", invite_link);
        context.insert("ttl_days", &INVITATION_TTL_DAYS);
        if let Some(note) = note.map(str::trim).filter(|n| !n.is_empty()) {
            context.insert("note", note);
        }

        Ok(Self {
            to: to.to_string(),
            subject: format!("{} invited you to Ratify!", sender_name),
            html: TEMPLATES.render("invite.html", &context)?,
            text: TEMPLATES.render("invite.txt", &context)?,
        })
    }

    /// Messaggio MIME multipart/alternative (testo + HTML) per i trasporti SMTP
    pub fn to_mime(&self, from: Mailbox) -> Result<Message, ProviderError> {
        let to: Mailbox = self.to.parse()?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(self.subject.clone())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(self.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(self.html.clone()),
                    ),
            )?;

        Ok(message)
    }
}

//! Invitation DTOs - Data Transfer Objects per inviti

use crate::{
    dtos::UserDTO,
    entities::{Invitation, InvitationStatus},
};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

lazy_static! {
    // prefisso internazionale opzionale, poi 7-15 cifre con separatori tollerati
    static ref PHONE_RE: Regex = Regex::new(r"^\+?[0-9][0-9 \-]{6,18}[0-9]$").unwrap();
}

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    if phone.trim().is_empty() || (PHONE_RE.is_match(phone) && (7..=15).contains(&digits)) {
        Ok(())
    } else {
        Err(ValidationError::new("phone").with_message("Valid phone is required".into()))
    }
}

/// Struct per gestire io col client
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct InvitationDTO {
    pub invite_id: i32,
    pub sender_id: i32,
    pub recipient_email: Option<String>,
    pub recipient_phone: Option<String>,
    pub recipient_id: Option<i32>,
    pub status: InvitationStatus,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// il token non viene mai esposto negli elenchi: è la credenziale per accettare
impl From<Invitation> for InvitationDTO {
    fn from(value: Invitation) -> Self {
        Self {
            invite_id: value.invite_id,
            sender_id: value.sender_id,
            recipient_email: value.recipient_email,
            recipient_phone: value.recipient_phone,
            recipient_id: value.recipient_id,
            status: value.status,
            message: value.message,
            created_at: value.created_at,
            expires_at: value.expires_at,
        }
    }
}

/// Body di POST /invitations/send
#[derive(Serialize, Deserialize, Debug, Clone, Validate, Default)]
pub struct NewInvitationRequestDTO {
    #[serde(default, alias = "recipientEmail")]
    #[validate(email(message = "Valid email is required"))]
    pub recipient_email: Option<String>,

    #[serde(default, alias = "recipientPhone")]
    #[validate(custom(function = "validate_phone"))]
    pub recipient_phone: Option<String>,

    #[serde(default)]
    #[validate(length(max = 1000, message = "Message must be at most 1000 characters"))]
    pub message: Option<String>,
}

impl NewInvitationRequestDTO {
    /// Spazi e stringhe vuote valgono come campo assente
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            recipient_email: clean(self.recipient_email),
            recipient_phone: clean(self.recipient_phone),
            message: self.message,
        }
    }
}

/// DTO per creare un nuovo invito (senza invite_id, status e created_at)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateInvitationDTO {
    pub sender_id: i32,
    pub recipient_email: Option<String>,
    pub recipient_phone: Option<String>,
    pub recipient_id: Option<i32>,
    pub message: String,
    pub invite_token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// DTO per aggiornare un invito (solo stato e destinatario risolto sono modificabili)
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UpdateInvitationDTO {
    pub status: Option<InvitationStatus>,
    pub recipient_id: Option<i32>,
}

/// DTO arricchito con i profili di mittente e destinatario (se registrato)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EnrichedInvitationDTO {
    #[serde(flatten)]
    pub invitation: InvitationDTO,
    pub sender: Option<UserDTO>,
    pub recipient: Option<UserDTO>,
}

/// Risposta di POST /invitations/send: l'invito esiste anche se la consegna fallisce
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateInvitationResponseDTO {
    pub message: String,
    pub invitation_id: i32,
    pub delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_warning: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AcceptInvitationResponseDTO {
    pub message: String,
    pub invitation: InvitationDTO,
    pub friend: UserDTO,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SmsInvitationResponseDTO {
    pub sid: String,
    pub status: String,
    pub to: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_validation_accepts_international_numbers() {
        assert!(validate_phone("+393331234567").is_ok());
        assert!(validate_phone("+1 415-555-0100").is_ok());
        assert!(validate_phone("").is_ok());
    }

    #[test]
    fn phone_validation_rejects_garbage() {
        assert!(validate_phone("not a phone").is_err());
        assert!(validate_phone("12").is_err());
        assert!(validate_phone("+1234567890123456789").is_err());
    }

    #[test]
    fn request_with_bad_email_fails_validation() {
        let request = NewInvitationRequestDTO {
            recipient_email: Some("nope".to_string()),
            ..Default::default()
        };
        assert!(request.validate().is_err());

        let request = NewInvitationRequestDTO {
            recipient_email: Some("a@x.com".to_string()),
            ..Default::default()
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn blank_contacts_normalize_to_absent() {
        let request = NewInvitationRequestDTO {
            recipient_email: Some("   ".to_string()),
            recipient_phone: Some(" +393331234567 ".to_string()),
            message: None,
        }
        .normalized();

        assert_eq!(request.recipient_email, None);
        assert_eq!(request.recipient_phone.as_deref(), Some("+393331234567"));
        assert!(request.validate().is_ok());
    }
}

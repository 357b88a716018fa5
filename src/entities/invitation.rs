//! Invitation entity - Entità invito di amicizia

use super::enums::InvitationStatus;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Validità di un invito a partire dalla creazione
pub const INVITATION_TTL_DAYS: i64 = 7;

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Invitation {
    pub invite_id: i32,
    pub sender_id: i32, // utente che invita
    // almeno uno dei due contatti è sempre presente
    pub recipient_email: Option<String>,
    pub recipient_phone: Option<String>,
    // utente registrato a cui è associato l'invito: risolto alla creazione se esiste già,
    // sovrascritto in ogni caso con chi accetta
    pub recipient_id: Option<i32>,
    pub status: InvitationStatus,
    pub message: String,
    pub invite_token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Invitation {
    /// Scadenza calcolata a partire dall'istante di creazione
    pub fn expiry_for(created_at: DateTime<Utc>) -> DateTime<Utc> {
        created_at + Duration::days(INVITATION_TTL_DAYS)
    }

    /// Un invito è scaduto solo se `now` è strettamente successivo a `expires_at`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(expires_at: DateTime<Utc>) -> Invitation {
        Invitation {
            invite_id: 1,
            sender_id: 1,
            recipient_email: Some("a@x.com".to_string()),
            recipient_phone: None,
            recipient_id: None,
            status: InvitationStatus::Pending,
            message: String::new(),
            invite_token: "0".repeat(64),
            created_at: expires_at - Duration::days(INVITATION_TTL_DAYS),
            expires_at,
        }
    }

    #[test]
    fn expiry_is_exactly_seven_days_after_creation() {
        let now = Utc::now();
        assert_eq!(Invitation::expiry_for(now) - now, Duration::days(7));
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let expires_at = Utc::now();
        let invitation = sample(expires_at);

        assert!(!invitation.is_expired_at(expires_at));
        assert!(!invitation.is_expired_at(expires_at - Duration::seconds(1)));
        assert!(invitation.is_expired_at(expires_at + Duration::seconds(1)));
    }
}

//! Invitations - Macchina a stati degli inviti di amicizia
//!
//! `pending -> accepted` oppure `pending -> declined`. La creazione non fallisce mai per
//! colpa della consegna: l'invito esiste appena è stato salvato, l'esito dell'email
//! viene riportato nella risposta.

pub mod graph;
pub mod token;

pub use graph::RelationshipGraph;
pub use token::{RandomTokenGenerator, TokenGenerator};

use crate::dtos::{
    CreateInvitationDTO, EnrichedInvitationDTO, InvitationDTO, NewInvitationRequestDTO,
    UpdateInvitationDTO, UserDTO,
};
use crate::entities::{Invitation, InvitationStatus, User};
use crate::notifications::{NotificationDispatcher, SmsDispatcher, SmsError, SmsReceipt};
use crate::repositories::{
    Create, InvitationStore, Read, ReadMany, StoreError, Update, UserStore,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, thiserror::Error)]
pub enum InvitationError {
    #[error("{0}")]
    Validation(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    /// Token trovato ma scaduto
    #[error("Invitation has expired")]
    Gone,

    #[error("{0}")]
    Forbidden(&'static str),

    #[error(transparent)]
    Sms(#[from] SmsError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for InvitationError {
    fn from(err: StoreError) -> Self {
        match err {
            // collisione di token: nessun retry, è un errore interno
            StoreError::Duplicate(field) => Self::Internal(format!("duplicate {}", field)),
            StoreError::NotFound => Self::NotFound("Resource not found"),
            StoreError::Database(e) => Self::Internal(e.to_string()),
        }
    }
}

/// Esito di create: l'invito salvato più l'esito della consegna email
#[derive(Debug, Clone)]
pub struct CreatedInvitation {
    pub invitation: Invitation,
    pub delivered: bool,
    pub provider: Option<&'static str>,
    pub preview_url: Option<String>,
    pub delivery_warning: Option<String>,
}

pub struct InvitationService {
    invitations: Arc<dyn InvitationStore>,
    users: Arc<dyn UserStore>,
    graph: RelationshipGraph,
    tokens: Box<dyn TokenGenerator>,
    mailer: NotificationDispatcher,
    sms: SmsDispatcher,
    frontend_url: String,
}

impl InvitationService {
    pub fn new(
        invitations: Arc<dyn InvitationStore>,
        users: Arc<dyn UserStore>,
        mailer: NotificationDispatcher,
        sms: SmsDispatcher,
        frontend_url: impl Into<String>,
    ) -> Self {
        Self {
            invitations,
            graph: RelationshipGraph::new(users.clone()),
            users,
            tokens: Box::new(RandomTokenGenerator),
            mailer,
            sms,
            frontend_url: frontend_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn with_token_generator(mut self, tokens: impl TokenGenerator + 'static) -> Self {
        self.tokens = Box::new(tokens);
        self
    }

    pub fn graph(&self) -> &RelationshipGraph {
        &self.graph
    }

    pub fn mailer(&self) -> &NotificationDispatcher {
        &self.mailer
    }

    /// Deep link che il destinatario apre per accettare
    pub fn invite_link(&self, token: &str) -> String {
        format!("{}/accept-invite/{}", self.frontend_url, token)
    }

    #[instrument(skip(self, sender, request), fields(sender_id = %sender.user_id))]
    pub async fn create(
        &self,
        sender: &User,
        request: NewInvitationRequestDTO,
    ) -> Result<CreatedInvitation, InvitationError> {
        debug!("Creating invitation");
        // 1. Normalizzare: stringhe vuote = campo assente, serve almeno un contatto
        let request = request.normalized();
        if request.recipient_email.is_none() && request.recipient_phone.is_none() {
            warn!("Invitation without any recipient contact");
            return Err(InvitationError::Validation("Email or phone is required"));
        }

        // 2. Risolvere il destinatario tra gli utenti registrati: per email se c'è, altrimenti per telefono
        let recipient = match (&request.recipient_email, &request.recipient_phone) {
            (Some(email), _) => self.users.find_by_email(email).await?,
            (None, Some(phone)) => self.users.find_by_phone(phone).await?,
            (None, None) => None,
        };
        if let Some(user) = &recipient {
            debug!("Recipient already registered as user {}", user.user_id);
        }

        // 3. Token e scadenza calcolati da un unico istante
        let now = Utc::now();
        let invite_token = self.tokens.generate();
        let note = request.message.unwrap_or_default();

        // 4. Salvare l'invito (pending); una collisione di token è un errore interno
        let invitation = self
            .invitations
            .create(&CreateInvitationDTO {
                sender_id: sender.user_id,
                recipient_email: request.recipient_email,
                recipient_phone: request.recipient_phone,
                recipient_id: recipient.map(|u| u.user_id),
                message: note,
                invite_token,
                created_at: now,
                expires_at: Invitation::expiry_for(now),
            })
            .await?;
        info!("Invitation {} created", invitation.invite_id);

        let mut created = CreatedInvitation {
            invitation,
            delivered: false,
            provider: None,
            preview_url: None,
            delivery_warning: None,
        };

        // 5. Consegna email best effort: un fallimento diventa un warning nella risposta
        let Some(email) = created.invitation.recipient_email.as_deref() else {
            debug!("No recipient email, skipping delivery");
            return Ok(created);
        };
        let link = self.invite_link(&created.invitation.invite_token);
        let note = Some(created.invitation.message.as_str()).filter(|m| !m.trim().is_empty());

        let outcome = self
            .mailer
            .send_email_invite(email, &sender.name, &link, note)
            .await;

        match outcome {
            Ok(delivery) => {
                created.delivered = true;
                created.provider = Some(delivery.provider);
                created.preview_url = delivery.preview_url;
            }
            Err(e) => {
                warn!(
                    "Invitation {} saved but email delivery failed: {}",
                    created.invitation.invite_id, e
                );
                created.delivery_warning = Some(e.to_string());
            }
        }

        Ok(created)
    }

    /// Inviti mandati o ricevuti (come destinatario risolto), dal più recente
    #[instrument(skip(self))]
    pub async fn list_all(&self, user_id: i32) -> Result<Vec<EnrichedInvitationDTO>, InvitationError> {
        let invitations = self.invitations.find_many_by_user_id(&user_id).await?;
        debug!("Found {} invitations", invitations.len());
        self.with_profiles(invitations).await
    }

    /// Inviti pendenti indirizzati all'utente per id o per email: copre anche chi si è
    /// registrato dopo aver ricevuto l'invito
    #[instrument(skip(self))]
    pub async fn list_pending(
        &self,
        user_id: i32,
        email: &str,
    ) -> Result<Vec<EnrichedInvitationDTO>, InvitationError> {
        let invitations = self
            .invitations
            .find_pending_for_recipient(&user_id, email)
            .await?;
        debug!("Found {} pending invitations", invitations.len());
        self.with_profiles(invitations).await
    }

    /// Restituisce l'invito aggiornato e il mittente, ora amico di `user_id`.
    ///
    /// Non controlla lo stato: riaccettare ricollega (idempotente) e riscrive lo stato.
    #[instrument(skip(self, token))]
    pub async fn accept(
        &self,
        token: &str,
        user_id: i32,
    ) -> Result<(Invitation, User), InvitationError> {
        // 1. Cercare l'invito per token
        let invitation = self
            .invitations
            .find_by_token(token)
            .await?
            .ok_or_else(|| {
                warn!("Accept with unknown token");
                InvitationError::NotFound("Invitation not found")
            })?;

        // 2. Scaduto = Gone, nessuna mutazione
        if invitation.is_expired_at(Utc::now()) {
            warn!("Invitation {} has expired", invitation.invite_id);
            return Err(InvitationError::Gone);
        }

        // 3. Legame di amicizia, poi stato e destinatario
        self.graph
            .link(invitation.sender_id, user_id)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => InvitationError::NotFound("User not found"),
                other => other.into(),
            })?;

        let invitation = self
            .invitations
            .update(
                &invitation.invite_id,
                &UpdateInvitationDTO {
                    status: Some(InvitationStatus::Accepted),
                    recipient_id: Some(user_id),
                },
            )
            .await?;

        let sender = self
            .users
            .read(&invitation.sender_id)
            .await?
            .ok_or(InvitationError::NotFound("User not found"))?;

        info!("Invitation {} accepted by user {}", invitation.invite_id, user_id);
        Ok((invitation, sender))
    }

    /// Rifiuto incondizionato: nessun controllo di scadenza
    #[instrument(skip(self, token))]
    pub async fn decline(&self, token: &str) -> Result<Invitation, InvitationError> {
        let invitation = self
            .invitations
            .find_by_token(token)
            .await?
            .ok_or_else(|| {
                warn!("Decline with unknown token");
                InvitationError::NotFound("Invitation not found")
            })?;

        let invitation = self
            .invitations
            .update(
                &invitation.invite_id,
                &UpdateInvitationDTO {
                    status: Some(InvitationStatus::Declined),
                    ..Default::default()
                },
            )
            .await?;

        info!("Invitation {} declined", invitation.invite_id);
        Ok(invitation)
    }

    /// Invio SMS su richiesta del mittente, separato dal flusso di creazione
    #[instrument(skip(self, requester), fields(requester_id = %requester.user_id))]
    pub async fn send_sms(
        &self,
        invite_id: i32,
        requester: &User,
    ) -> Result<SmsReceipt, InvitationError> {
        // 1. L'invito deve esistere ed essere del richiedente
        let invitation = self
            .invitations
            .read(&invite_id)
            .await?
            .ok_or(InvitationError::NotFound("Invitation not found"))?;

        if invitation.sender_id != requester.user_id {
            warn!("User {} is not the sender of invitation {}", requester.user_id, invite_id);
            return Err(InvitationError::Forbidden("Only the sender can resend an invitation"));
        }

        // 2. Ha senso solo per un invito ancora accettabile e con un numero di telefono
        if invitation.status != InvitationStatus::Pending {
            return Err(InvitationError::Validation("Invitation is no longer pending"));
        }
        if invitation.is_expired_at(Utc::now()) {
            return Err(InvitationError::Gone);
        }
        let phone = invitation
            .recipient_phone
            .as_deref()
            .ok_or(InvitationError::Validation("Invitation has no recipient phone"))?;

        // 3. Invio tramite il dispatcher SMS, errori propagati al chiamante
        let link = self.invite_link(&invitation.invite_token);
        let receipt = self
            .sms
            .send_sms_invite(phone, &requester.name, &link)
            .await?;

        info!("SMS sent for invitation {}", invite_id);
        Ok(receipt)
    }

    /// Affianca ad ogni invito i profili di mittente e destinatario (una sola lettura batch)
    async fn with_profiles(
        &self,
        invitations: Vec<Invitation>,
    ) -> Result<Vec<EnrichedInvitationDTO>, InvitationError> {
        let mut user_ids: Vec<i32> = invitations
            .iter()
            .flat_map(|i| std::iter::once(i.sender_id).chain(i.recipient_id))
            .collect();
        user_ids.sort_unstable();
        user_ids.dedup();

        let profiles: HashMap<i32, User> = self
            .users
            .read_many(&user_ids)
            .await?
            .into_iter()
            .map(|u| (u.user_id, u))
            .collect();
        let profile = |id: i32| -> Option<UserDTO> { profiles.get(&id).cloned().map(Into::into) };

        Ok(invitations
            .into_iter()
            .map(|invitation| EnrichedInvitationDTO {
                sender: profile(invitation.sender_id),
                recipient: invitation.recipient_id.and_then(profile),
                invitation: InvitationDTO::from(invitation),
            })
            .collect())
    }
}

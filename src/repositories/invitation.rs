//! InvitationRepository - Repository MySQL per la gestione degli inviti

use super::{Create, InvitationStore, Read, StoreError, Update, map_unique_violation};
use crate::dtos::{CreateInvitationDTO, UpdateInvitationDTO};
use crate::entities::{Invitation, InvitationStatus};
use async_trait::async_trait;
use sqlx::MySqlPool;

const SELECT_INVITATION: &str = r#"
    SELECT
        invite_id,
        sender_id,
        recipient_email,
        recipient_phone,
        recipient_id,
        status,
        message,
        invite_token,
        created_at,
        expires_at
    FROM invitations
"#;

//INVITATION REPOSITORY
pub struct InvitationRepository {
    connection_pool: MySqlPool,
}

impl InvitationRepository {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }
}

#[async_trait]
impl Create<Invitation, CreateInvitationDTO> for InvitationRepository {
    async fn create(&self, data: &CreateInvitationDTO) -> Result<Invitation, StoreError> {
        // lo stato iniziale è sempre Pending; il vincolo UNIQUE su invite_token
        // fa fallire l'inserimento in caso di collisione
        let status = InvitationStatus::Pending;

        let result = sqlx::query(
            r#"
            INSERT INTO invitations
                (sender_id, recipient_email, recipient_phone, recipient_id, status, message, invite_token, created_at, expires_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(data.sender_id)
        .bind(&data.recipient_email)
        .bind(&data.recipient_phone)
        .bind(data.recipient_id)
        .bind(status)
        .bind(&data.message)
        .bind(&data.invite_token)
        .bind(data.created_at)
        .bind(data.expires_at)
        .execute(&self.connection_pool)
        .await
        .map_err(|e| map_unique_violation(e, "invite_token"))?;

        Ok(Invitation {
            invite_id: result.last_insert_id() as i32,
            sender_id: data.sender_id,
            recipient_email: data.recipient_email.clone(),
            recipient_phone: data.recipient_phone.clone(),
            recipient_id: data.recipient_id,
            status,
            message: data.message.clone(),
            invite_token: data.invite_token.clone(),
            created_at: data.created_at,
            expires_at: data.expires_at,
        })
    }
}

#[async_trait]
impl Read<Invitation, i32> for InvitationRepository {
    async fn read(&self, id: &i32) -> Result<Option<Invitation>, StoreError> {
        let invitation =
            sqlx::query_as::<_, Invitation>(&format!("{SELECT_INVITATION} WHERE invite_id = ?"))
                .bind(id)
                .fetch_optional(&self.connection_pool)
                .await?;

        Ok(invitation)
    }
}

#[async_trait]
impl Update<Invitation, UpdateInvitationDTO, i32> for InvitationRepository {
    async fn update(&self, id: &i32, data: &UpdateInvitationDTO) -> Result<Invitation, StoreError> {
        let current_invitation = self.read(id).await?.ok_or(StoreError::NotFound)?;

        if data.status.is_none() && data.recipient_id.is_none() {
            return Ok(current_invitation);
        }

        // Build dynamic UPDATE query using QueryBuilder (idiomatic SQLx way)
        let mut query_builder = sqlx::QueryBuilder::new("UPDATE invitations SET ");

        let mut separated = query_builder.separated(", ");
        if let Some(status) = data.status {
            separated.push("status = ");
            separated.push_bind_unseparated(status);
        }
        if let Some(recipient_id) = data.recipient_id {
            separated.push("recipient_id = ");
            separated.push_bind_unseparated(recipient_id);
        }

        query_builder.push(" WHERE invite_id = ");
        query_builder.push_bind(*id);

        query_builder.build().execute(&self.connection_pool).await?;

        self.read(id).await?.ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl InvitationStore for InvitationRepository {
    async fn find_by_token(&self, token: &str) -> Result<Option<Invitation>, StoreError> {
        let invitation =
            sqlx::query_as::<_, Invitation>(&format!("{SELECT_INVITATION} WHERE invite_token = ?"))
                .bind(token)
                .fetch_optional(&self.connection_pool)
                .await?;

        Ok(invitation)
    }

    async fn find_many_by_user_id(&self, user_id: &i32) -> Result<Vec<Invitation>, StoreError> {
        let invitations = sqlx::query_as::<_, Invitation>(&format!(
            "{SELECT_INVITATION} WHERE sender_id = ? OR recipient_id = ? ORDER BY created_at DESC, invite_id DESC"
        ))
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(invitations)
    }

    async fn find_pending_for_recipient(
        &self,
        user_id: &i32,
        email: &str,
    ) -> Result<Vec<Invitation>, StoreError> {
        // doppio match: l'invito può precedere la registrazione del destinatario (solo email)
        // oppure essere stato risolto sull'utente già registrato
        let invitations = sqlx::query_as::<_, Invitation>(&format!(
            "{SELECT_INVITATION} WHERE (recipient_id = ? OR recipient_email = ?) AND status = 'pending' \
             ORDER BY created_at DESC, invite_id DESC"
        ))
        .bind(user_id)
        .bind(email)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(invitations)
    }
}

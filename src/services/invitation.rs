//! Invitation services - Endpoint HTTP per il ciclo di vita degli inviti

use crate::core::{AppError, AppState};
use crate::dtos::{
    AcceptInvitationResponseDTO, CreateInvitationResponseDTO, EnrichedInvitationDTO,
    InvitationDTO, NewInvitationRequestDTO, SmsInvitationResponseDTO,
};
use crate::entities::User;
use axum::{
    Extension,
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use validator::Validate;

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_invitations(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<EnrichedInvitationDTO>>, AppError> {
    debug!("Listing invitations sent or received");
    let invitations = state.invitations.list_all(current_user.user_id).await?;
    info!("Found {} invitations", invitations.len());
    Ok(Json(invitations))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn send_invitation(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>, // ottenuto dall'autenticazione tramite token jwt
    Json(body): Json<NewInvitationRequestDTO>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Sending new invitation");
    // 1. Normalizzare (campi vuoti = assenti) e validare il formato di email e telefono
    // 2. Creare l'invito: la consegna email è best effort
    // 3. Riportare l'esito della consegna senza mai fallire la richiesta per quello
    let body = body.normalized();
    body.validate()?;

    let created = state.invitations.create(&current_user, body).await?;

    let message = match (&created.invitation.recipient_email, created.delivered) {
        (Some(_), true) => "Invitation sent successfully",
        (Some(_), false) => "Invitation created, but the email could not be delivered",
        (None, _) => "Invitation created",
    };

    info!(
        "Invitation {} created (delivered: {})",
        created.invitation.invite_id, created.delivered
    );
    Ok((
        StatusCode::CREATED,
        Json(CreateInvitationResponseDTO {
            message: message.to_string(),
            invitation_id: created.invitation.invite_id,
            delivered: created.delivered,
            provider: created.provider.map(str::to_string),
            preview_url: created.preview_url,
            delivery_warning: created.delivery_warning,
        }),
    ))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_pending_invitations(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<EnrichedInvitationDTO>>, AppError> {
    debug!("Listing pending invitations");
    let invitations = state
        .invitations
        .list_pending(current_user.user_id, &current_user.email)
        .await?;
    info!("Found {} pending invitations", invitations.len());
    Ok(Json(invitations))
}

#[instrument(skip(state, current_user, token), fields(user_id = %current_user.user_id))]
pub async fn accept_invitation(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(token): Path<String>,
) -> Result<Json<AcceptInvitationResponseDTO>, AppError> {
    debug!("Accepting invitation");
    // token sconosciuto = NOT_FOUND, scaduto = GONE
    let (invitation, sender) = state
        .invitations
        .accept(&token, current_user.user_id)
        .await?;

    Ok(Json(AcceptInvitationResponseDTO {
        message: "Invitation accepted".to_string(),
        invitation: InvitationDTO::from(invitation),
        friend: sender.into(),
    }))
}

#[instrument(skip(state, current_user, token), fields(user_id = %current_user.user_id))]
pub async fn decline_invitation(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(token): Path<String>,
) -> Result<Json<InvitationDTO>, AppError> {
    debug!("Declining invitation");
    let invitation = state.invitations.decline(&token).await?;
    Ok(Json(InvitationDTO::from(invitation)))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, invite_id = %invite_id))]
pub async fn send_invitation_sms(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(invite_id): Path<i32>,
) -> Result<Json<SmsInvitationResponseDTO>, AppError> {
    debug!("Sending invitation by SMS");
    let receipt = state
        .invitations
        .send_sms(invite_id, &current_user)
        .await?;

    Ok(Json(SmsInvitationResponseDTO {
        sid: receipt.sid,
        status: receipt.status,
        to: receipt.to,
    }))
}

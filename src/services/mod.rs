//! Services module - Coordinatore per tutti i service handler HTTP
//!
//! Questo modulo organizza i service handlers in sotto-moduli separati per una migliore manutenibilità.
//! Ogni modulo gestisce gli endpoint HTTP per una specifica funzionalità.

pub mod auth;
pub mod invitation;
pub mod user;

// Re-exports per facilitare l'import
pub use auth::{get_me, login_user, register_user};
pub use invitation::{
    accept_invitation, decline_invitation, list_invitations, list_pending_invitations,
    send_invitation, send_invitation_sms,
};
pub use user::{get_user_by_id, list_friends, search_user_by_name};

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

/// Root endpoint - banner di liveness
pub async fn root() -> impl IntoResponse {
    (StatusCode::OK, "Ratify API is running!")
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "OK" }))
}

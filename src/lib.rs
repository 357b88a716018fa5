//! Server library - espone i moduli principali per i test

pub mod core;
pub mod dtos;
pub mod entities;
pub mod invitations;
pub mod notifications;
pub mod repositories;
pub mod services;

// Re-export dei tipi principali per facilitare l'import
pub use crate::core::{AppError, AppState, auth, config};
pub use services::root;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;

/// Crea il router principale dell'applicazione
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(services::root))
        .nest("/api", configure_api_routes(state.clone()))
        .with_state(state)
}

fn configure_api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(services::health))
        .nest("/auth", configure_auth_routes(state.clone()))
        .nest("/users", configure_user_routes(state.clone()))
        .nest("/invitations", configure_invitation_routes(state))
}

/// Configura le routes di autenticazione (login, signup, me)
fn configure_auth_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::authentication_middleware;
    use services::*;

    let protected = Router::new()
        .route("/me", get(get_me))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ));

    Router::new()
        .route("/login", post(login_user))
        .route("/signup", post(register_user))
        .merge(protected)
}

/// Configura le routes per la gestione degli utenti
fn configure_user_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/", get(search_user_by_name))
        .route("/{user_id}", get(get_user_by_id))
        .route("/{user_id}/friends", get(list_friends))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

/// Configura le routes per la gestione degli inviti
fn configure_invitation_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/", get(list_invitations))
        .route("/send", post(send_invitation))
        .route("/pending", get(list_pending_invitations))
        .route("/accept/{token}", post(accept_invitation))
        .route("/decline/{token}", post(decline_invitation))
        .route("/{invite_id}/sms", post(send_invitation_sms))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

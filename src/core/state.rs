//! Application State - Stato globale dell'applicazione
//!
//! Contiene gli store, il servizio inviti (con i dispatcher già costruiti dalla
//! configurazione) e lo stato condiviso necessario alle route e ai middleware.

use crate::core::Config;
use crate::invitations::InvitationService;
use crate::notifications::{NotificationDispatcher, SmsDispatcher};
use crate::repositories::{
    InvitationRepository, InvitationStore, MemoryInvitationRepository, MemoryUserRepository,
    UserRepository, UserStore,
};
use sqlx::MySqlPool;
use std::sync::Arc;

/// Stato globale dell'applicazione condiviso tra tutte le route e middleware
pub struct AppState {
    /// Store degli utenti (profili e insiemi di amici)
    pub user: Arc<dyn UserStore>,

    /// Macchina a stati degli inviti, con consegna email e SMS
    pub invitations: InvitationService,

    /// Secret key per JWT token
    pub jwt_secret: String,
}

impl AppState {
    /// Crea lo stato sugli store MySQL, condividendo il pool di connessioni
    pub fn new(pool: MySqlPool, config: &Config) -> Self {
        Self::with_stores(
            Arc::new(UserRepository::new(pool.clone())),
            Arc::new(InvitationRepository::new(pool)),
            config,
        )
    }

    /// Stato interamente in memoria, per STORAGE=memory
    pub fn in_memory(config: &Config) -> Self {
        Self::with_stores(
            Arc::new(MemoryUserRepository::new()),
            Arc::new(MemoryInvitationRepository::new()),
            config,
        )
    }

    /// Costruisce i dispatcher a partire dalla configurazione. Il client HTTP è unico
    /// e condiviso fra tutti i provider.
    pub fn with_stores(
        users: Arc<dyn UserStore>,
        invitations: Arc<dyn InvitationStore>,
        config: &Config,
    ) -> Self {
        let client = reqwest::Client::new();
        let mailer = NotificationDispatcher::from_config(&config.mail, client.clone());
        let sms = SmsDispatcher::new(client, config.sms.clone());
        let service = InvitationService::new(
            invitations,
            users.clone(),
            mailer,
            sms,
            config.frontend_url.clone(),
        );

        Self::from_parts(users, service, config.jwt_secret.clone())
    }

    pub fn from_parts(
        users: Arc<dyn UserStore>,
        invitations: InvitationService,
        jwt_secret: String,
    ) -> Self {
        Self {
            user: users,
            invitations,
            jwt_secret,
        }
    }
}

#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use ratify_server::core::AppState;
use ratify_server::dtos::CreateUserDTO;
use ratify_server::entities::User;
use ratify_server::invitations::InvitationService;
use ratify_server::notifications::{
    Delivery, EmailProvider, InviteEmail, NotificationDispatcher, ProviderError, SmsDispatcher,
};
use ratify_server::repositories::{Create, MemoryInvitationRepository, MemoryUserRepository};
use std::sync::{Arc, Mutex};

pub const JWT_SECRET: &str = "ilmiobellissimosegretochevaassolutamentecambiato";
pub const FRONTEND_URL: &str = "http://localhost:3000";

/// Provider email finto: registra i messaggi e risponde come la sandbox
pub struct RecordingProvider {
    pub succeed: bool,
    pub sent: Arc<Mutex<Vec<InviteEmail>>>,
}

#[async_trait]
impl EmailProvider for RecordingProvider {
    fn name(&self) -> &'static str {
        "ethereal"
    }

    async fn attempt_send(&self, email: &InviteEmail) -> Result<Delivery, ProviderError> {
        self.sent.lock().unwrap().push(email.clone());
        if self.succeed {
            Ok(Delivery {
                provider: "ethereal",
                message_id: Some("MSG1".to_string()),
                preview_url: Some("https://ethereal.email/message/MSG1".to_string()),
            })
        } else {
            Err(ProviderError::Sandbox("connection refused".to_string()))
        }
    }
}

/// Tutto ciò che serve a un test: server, stato e store in memoria ispezionabili
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub users: Arc<MemoryUserRepository>,
    pub invitations: Arc<MemoryInvitationRepository>,
    pub sent: Arc<Mutex<Vec<InviteEmail>>>,
}

/// Crea un'app di test interamente in memoria
///
/// # Arguments
/// * `delivery_works` - se false il provider email fallisce sempre
pub fn create_test_app(delivery_works: bool) -> TestApp {
    let users = Arc::new(MemoryUserRepository::new());
    let invitations = Arc::new(MemoryInvitationRepository::new());
    let sent = Arc::new(Mutex::new(Vec::new()));

    let mailer = NotificationDispatcher::new(vec![Box::new(RecordingProvider {
        succeed: delivery_works,
        sent: sent.clone(),
    })]);
    let service = InvitationService::new(
        invitations.clone(),
        users.clone(),
        mailer,
        SmsDispatcher::new(reqwest::Client::new(), None),
        FRONTEND_URL,
    );
    let state = Arc::new(AppState::from_parts(
        users.clone(),
        service,
        JWT_SECRET.to_string(),
    ));

    TestApp {
        server: create_test_server(state.clone()),
        state,
        users,
        invitations,
        sent,
    }
}

/// Crea un TestServer per i test
pub fn create_test_server(state: Arc<AppState>) -> TestServer {
    let app = ratify_server::create_router(state);
    TestServer::new(app).expect("Failed to create test server")
}

/// Registra un utente direttamente nello store e restituisce anche un token valido
pub async fn seed_user(app: &TestApp, name: &str, email: &str, phone: Option<&str>) -> (User, String) {
    let user = app
        .users
        .create(&CreateUserDTO {
            name: name.to_string(),
            email: email.to_string(),
            // costo minimo: i test non hanno bisogno di un hash robusto
            password: bcrypt::hash("password123", 4).expect("hash"),
            phone: phone.map(str::to_string),
        })
        .await
        .expect("Failed to seed user");
    let token = create_test_jwt(user.user_id, email, JWT_SECRET);
    (user, token)
}

/// Genera un JWT token per testing
///
/// # Returns
/// Token JWT valido per 24 ore
pub fn create_test_jwt(user_id: i32, email: &str, jwt_secret: &str) -> String {
    use chrono::{Duration, Utc};
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Claims {
        id: i32,
        email: String,
        exp: usize,
        iat: usize,
    }

    let now = Utc::now();
    let expiration = now
        .checked_add_signed(Duration::hours(24))
        .expect("valid timestamp")
        .timestamp() as usize;

    let claims = Claims {
        id: user_id,
        email: email.to_string(),
        exp: expiration,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("Failed to create JWT token")
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

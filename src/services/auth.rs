//! Auth services - Gestione autenticazione e registrazione utenti

use crate::core::{AppError, AppState, encode_jwt};
use crate::dtos::{AuthResponseDTO, CreateUserDTO, LoginDTO, UserDTO};
use crate::entities::User;
use crate::repositories::Create;
use axum::{
    Extension,
    extract::{Json, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use validator::Validate;

#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn login_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginDTO>, // JSON body
) -> Result<impl IntoResponse, AppError> {
    debug!("Login attempt");
    // 1. Verificare che la password sia stata fornita (fail-fast prima della query DB)
    // 2. Cercare l'utente tramite email, se non esiste UNAUTHORIZED
    // 3. Verificare la password contro l'hash memorizzato
    // 4. Generare il token JWT e restituirlo sia nel body che nell'header Authorization

    if body.password.is_empty() {
        warn!("Login without password");
        return Err(AppError::bad_request("Password is required"));
    }

    let user = match state.user.find_by_email(body.email.trim()).await? {
        Some(user) => user,
        None => {
            warn!("Login for unknown email");
            return Err(AppError::unauthorized("Invalid email or password"));
        }
    };

    if !user.verify_password(&body.password) {
        warn!("Wrong password for user {}", user.user_id);
        return Err(AppError::unauthorized("Invalid email or password"));
    }

    let token = encode_jwt(user.email.clone(), user.user_id, &state.jwt_secret)?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| AppError::internal_server_error("Invalid token encoding"))?,
    );

    info!("User {} logged in", user.user_id);
    Ok((
        StatusCode::OK,
        headers,
        Json(AuthResponseDTO {
            token,
            user: UserDTO::from(user),
        }),
    ))
}

#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateUserDTO>, // JSON body
) -> Result<impl IntoResponse, AppError> {
    debug!("Registering new user");
    // 1. Validare il DTO (nome, email, password di almeno 6 caratteri, telefono)
    // 2. Generare l'hash della password
    // 3. Salvare l'utente: l'email duplicata arriva dallo store come CONFLICT
    // 4. Rispondere con token e profilo, così il client è già autenticato

    body.validate()?;

    let password_hash = User::hash_password(&body.password).map_err(|e| {
        error!("Failed to hash password: {}", e);
        AppError::internal_server_error("Failed to hash password")
    })?;

    let new_user = CreateUserDTO {
        name: body.name.trim().to_string(),
        email: body.email.trim().to_string(),
        password: password_hash,
        phone: body
            .phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty()),
    };

    let created_user = state.user.create(&new_user).await?;
    let token = encode_jwt(
        created_user.email.clone(),
        created_user.user_id,
        &state.jwt_secret,
    )?;

    info!("User {} registered", created_user.user_id);
    Ok((
        StatusCode::CREATED,
        Json(AuthResponseDTO {
            token,
            user: UserDTO::from(created_user),
        }),
    ))
}

#[instrument(skip(current_user), fields(user_id = %current_user.user_id))]
pub async fn get_me(Extension(current_user): Extension<User>) -> Json<UserDTO> {
    debug!("Returning current user profile");
    Json(UserDTO::from(current_user))
}

//! User services - Gestione utenti

use crate::core::{AppError, AppState};
use crate::dtos::{UserDTO, UserSearchQuery};
use crate::repositories::Read;
use axum::extract::{Json, Path, Query, State};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[instrument(skip(state), fields(search = %params.search))]
pub async fn search_user_by_name(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserSearchQuery>, // query params /users?search=name
) -> Result<Json<Vec<UserDTO>>, AppError> {
    debug!("Searching users with partial name");
    // 1. Estrarre il parametro search dalla query string
    // 2. Cercare gli utenti il cui nome inizia con la query (massimo 10)
    // 3. Convertire ogni utente trovato in UserDTO
    let search = params.search.trim();
    if search.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let users = state.user.search_by_name_partial(search).await?;
    info!("Found {} users matching search criteria", users.len());
    let users_dto = users.into_iter().map(UserDTO::from).collect::<Vec<_>>();
    Ok(Json::from(users_dto))
}

#[instrument(skip(state), fields(user_id = %user_id))]
pub async fn get_user_by_id(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i32>, // parametro dalla URL /users/:user_id
) -> Result<Json<UserDTO>, AppError> {
    debug!("Fetching user by ID");
    let user = state.user.read(&user_id).await?.ok_or_else(|| {
        warn!("User not found");
        AppError::not_found("User not found")
    })?;
    Ok(Json(UserDTO::from(user)))
}

#[instrument(skip(state), fields(user_id = %user_id))]
pub async fn list_friends(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
) -> Result<Json<Vec<UserDTO>>, AppError> {
    debug!("Listing friends");
    // 1. L'utente deve esistere, altrimenti NOT_FOUND
    // 2. Leggere l'insieme di amici e risolverlo in profili
    if state.user.read(&user_id).await?.is_none() {
        warn!("User not found");
        return Err(AppError::not_found("User not found"));
    }

    let friends = state.invitations.graph().friends_of(user_id).await?;
    info!("User has {} friends", friends.len());
    Ok(Json(friends.into_iter().map(UserDTO::from).collect()))
}

//! Common repository traits
//!
//! This module defines generic interfaces for database operations, plus the two
//! store capabilities the application is wired against. Every backend (MySQL,
//! in-memory) implements the same set so `AppState` can hold trait objects.

use crate::dtos::{CreateInvitationDTO, CreateUserDTO, UpdateInvitationDTO};
use crate::entities::{Invitation, User};
use async_trait::async_trait;

/// Errors produced by any store backend
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint was violated (e.g. `invite_token`, `email`)
    #[error("duplicate value for unique field `{0}`")]
    Duplicate(&'static str),

    /// The row targeted by an update does not exist
    #[error("record not found")]
    NotFound,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Trait for creating new entities in the database
///
/// # Type Parameters
/// * `Entity` - Type of the returned entity (with ID assigned by the database)
/// * `CreateDTO` - DTO for creation (without ID, will be automatically generated)
#[async_trait]
pub trait Create<Entity, CreateDTO> {
    /// Creates a new entity in the database
    ///
    /// # Returns
    /// * `Ok(Entity)` - Created entity with ID assigned by the database
    /// * `Err(StoreError::Duplicate)` - A unique field is already taken
    async fn create(&self, data: &CreateDTO) -> Result<Entity, StoreError>;
}

/// Trait for reading a single entity by primary key
#[async_trait]
pub trait Read<Entity, Id> {
    /// Reads an entity from the database by its primary key
    ///
    /// # Returns
    /// * `Ok(Some(Entity))` - Entity found
    /// * `Ok(None)` - No entity with that ID
    async fn read(&self, id: &Id) -> Result<Option<Entity>, StoreError>;
}

/// Trait for reading multiple entities by list of primary keys
#[async_trait]
pub trait ReadMany<Entity, Id> {
    /// Reads multiple entities by their primary keys
    ///
    /// # Note
    /// Missing ids are skipped; order of the result is not guaranteed.
    async fn read_many(&self, ids: &[Id]) -> Result<Vec<Entity>, StoreError>;
}

/// Trait for updating existing entities
#[async_trait]
pub trait Update<Entity, UpdateDTO, Id> {
    /// Updates an existing entity (only `Some(_)` fields of the DTO are modified)
    ///
    /// # Returns
    /// * `Ok(Entity)` - Updated entity
    /// * `Err(StoreError::NotFound)` - No entity with that ID
    async fn update(&self, id: &Id, data: &UpdateDTO) -> Result<Entity, StoreError>;
}

/// Persistence of invitations, unique on `invite_token`
#[async_trait]
pub trait InvitationStore:
    Create<Invitation, CreateInvitationDTO>
    + Read<Invitation, i32>
    + Update<Invitation, UpdateInvitationDTO, i32>
    + Send
    + Sync
{
    /// Lookup by invite token, the only key used by accept/decline
    async fn find_by_token(&self, token: &str) -> Result<Option<Invitation>, StoreError>;

    /// Invitations the user sent or was resolved as recipient of, newest first
    async fn find_many_by_user_id(&self, user_id: &i32) -> Result<Vec<Invitation>, StoreError>;

    /// Pending invitations addressed to the user either by resolved id or by email, newest first
    async fn find_pending_for_recipient(
        &self,
        user_id: &i32,
        email: &str,
    ) -> Result<Vec<Invitation>, StoreError>;
}

/// Persistence of users and of their friend sets
#[async_trait]
pub trait UserStore:
    Create<User, CreateUserDTO> + Read<User, i32> + ReadMany<User, i32> + Send + Sync
{
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, StoreError>;

    /// Prefix search on the display name, at most 10 results
    async fn search_by_name_partial(&self, pattern: &str) -> Result<Vec<User>, StoreError>;

    /// Adds `friend_id` to the friend set of `user_id`.
    /// Returns `false` when the entry was already present.
    async fn add_friend(&self, user_id: &i32, friend_id: &i32) -> Result<bool, StoreError>;

    async fn friend_ids(&self, user_id: &i32) -> Result<Vec<i32>, StoreError>;
}

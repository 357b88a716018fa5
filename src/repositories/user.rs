//! UserRepository - Repository MySQL per la gestione degli utenti e delle amicizie

use super::{Create, Read, ReadMany, StoreError, UserStore, map_unique_violation};
use crate::dtos::CreateUserDTO;
use crate::entities::User;
use async_trait::async_trait;
use sqlx::MySqlPool;

// USER REPO
pub struct UserRepository {
    connection_pool: MySqlPool,
}

impl UserRepository {
    pub fn new(connection_pool: MySqlPool) -> UserRepository {
        Self { connection_pool }
    }
}

#[async_trait]
impl Create<User, CreateUserDTO> for UserRepository {
    /// la password deve arrivare già hashata
    async fn create(&self, data: &CreateUserDTO) -> Result<User, StoreError> {
        let result =
            sqlx::query("INSERT INTO users (name, email, phone, password) VALUES (?, ?, ?, ?)")
                .bind(&data.name)
                .bind(&data.email)
                .bind(&data.phone)
                .bind(&data.password)
                .execute(&self.connection_pool)
                .await
                .map_err(|e| map_unique_violation(e, "email"))?;

        Ok(User {
            user_id: result.last_insert_id() as i32,
            name: data.name.clone(),
            email: data.email.clone(),
            phone: data.phone.clone(),
            password: data.password.clone(),
        })
    }
}

#[async_trait]
impl Read<User, i32> for UserRepository {
    async fn read(&self, id: &i32) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT user_id, name, email, phone, password FROM users WHERE user_id = ?",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(user)
    }
}

#[async_trait]
impl ReadMany<User, i32> for UserRepository {
    async fn read_many(&self, ids: &[i32]) -> Result<Vec<User>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query_builder = sqlx::QueryBuilder::new(
            "SELECT user_id, name, email, phone, password FROM users WHERE user_id IN (",
        );
        let mut separated = query_builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let users = query_builder
            .build_query_as::<User>()
            .fetch_all(&self.connection_pool)
            .await?;

        Ok(users)
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT user_id, name, email, phone, password FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(user)
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT user_id, name, email, phone, password FROM users WHERE phone = ? LIMIT 1",
        )
        .bind(phone)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(user)
    }

    async fn search_by_name_partial(&self, pattern: &str) -> Result<Vec<User>, StoreError> {
        let pattern = format!("{}%", pattern);
        let users = sqlx::query_as::<_, User>(
            "SELECT user_id, name, email, phone, password FROM users WHERE name LIKE ? ORDER BY user_id LIMIT 10",
        )
        .bind(pattern)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(users)
    }

    async fn add_friend(&self, user_id: &i32, friend_id: &i32) -> Result<bool, StoreError> {
        // INSERT IGNORE rende la scrittura idempotente: la chiave primaria (user_id, friend_id)
        // impedisce i duplicati
        let result = sqlx::query("INSERT IGNORE INTO friendships (user_id, friend_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(friend_id)
            .execute(&self.connection_pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn friend_ids(&self, user_id: &i32) -> Result<Vec<i32>, StoreError> {
        let ids = sqlx::query_scalar::<_, i32>(
            "SELECT friend_id FROM friendships WHERE user_id = ? ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(ids)
    }
}

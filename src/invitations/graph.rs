//! Relazioni di amicizia: insieme simmetrico, mutato solo da qui

use crate::entities::User;
use crate::repositories::{Read, ReadMany, StoreError, UserStore};
use futures::future::try_join;
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub struct RelationshipGraph {
    users: Arc<dyn UserStore>,
}

impl RelationshipGraph {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Rende `a` e `b` amici reciproci. Idempotente.
    ///
    /// Sono due scritture indipendenti (b in a, poi a in b): se la seconda fallisce
    /// la prima resta, e una nuova chiamata completa il legame.
    #[instrument(skip(self))]
    pub async fn link(&self, a: i32, b: i32) -> Result<(), StoreError> {
        // 1. entrambi gli utenti devono esistere (letture in parallelo)
        let (user_a, user_b) = try_join(self.users.read(&a), self.users.read(&b)).await?;
        if user_a.is_none() || user_b.is_none() {
            return Err(StoreError::NotFound);
        }

        // 2. b nell'insieme di a, poi a nell'insieme di b
        let added_ab = self.users.add_friend(&a, &b).await?;
        let added_ba = self.users.add_friend(&b, &a).await?;

        if added_ab || added_ba {
            info!("Users {} and {} are now friends", a, b);
        } else {
            debug!("Users {} and {} were already friends", a, b);
        }
        Ok(())
    }

    pub async fn friends_of(&self, user_id: i32) -> Result<Vec<User>, StoreError> {
        let ids = self.users.friend_ids(&user_id).await?;
        self.users.read_many(&ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtos::CreateUserDTO;
    use crate::repositories::{Create, MemoryUserRepository};

    async fn user(store: &MemoryUserRepository, email: &str) -> i32 {
        store
            .create(&CreateUserDTO {
                name: email.to_string(),
                email: email.to_string(),
                password: "hash".to_string(),
                phone: None,
            })
            .await
            .unwrap()
            .user_id
    }

    #[tokio::test]
    async fn link_is_symmetric_and_idempotent() {
        let store = Arc::new(MemoryUserRepository::new());
        let alice = user(&store, "alice@x.com").await;
        let bob = user(&store, "bob@x.com").await;
        let graph = RelationshipGraph::new(store.clone());

        graph.link(alice, bob).await.unwrap();
        graph.link(alice, bob).await.unwrap();
        graph.link(bob, alice).await.unwrap();

        assert_eq!(store.friend_ids(&alice).await.unwrap(), vec![bob]);
        assert_eq!(store.friend_ids(&bob).await.unwrap(), vec![alice]);

        let friends = graph.friends_of(alice).await.unwrap();
        assert_eq!(friends.len(), 1);
        assert_eq!(friends[0].email, "bob@x.com");
    }

    #[tokio::test]
    async fn link_requires_both_users() {
        let store = Arc::new(MemoryUserRepository::new());
        let alice = user(&store, "alice@x.com").await;
        let graph = RelationshipGraph::new(store.clone());

        assert!(matches!(graph.link(alice, 99).await, Err(StoreError::NotFound)));
        assert!(store.friend_ids(&alice).await.unwrap().is_empty());
    }
}

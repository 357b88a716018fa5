//! Repository in memoria basati su DashMap
//!
//! Implementano gli stessi trait dei repository MySQL. Ogni scrittura tocca una sola
//! entry della mappa, quindi è atomica per record come lo sarebbe una riga del database;
//! non esistono lock che coprano più record.

use super::{Create, InvitationStore, Read, ReadMany, StoreError, Update, UserStore};
use crate::dtos::{CreateInvitationDTO, CreateUserDTO, UpdateInvitationDTO};
use crate::entities::{Invitation, InvitationStatus, User};
use async_trait::async_trait;
use dashmap::{DashMap, mapref::entry::Entry};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicI32, Ordering};

fn newest_first(invitations: &mut [Invitation]) {
    invitations.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then(b.invite_id.cmp(&a.invite_id))
    });
}

#[derive(Default)]
pub struct MemoryInvitationRepository {
    rows: DashMap<i32, Invitation>,
    // indice univoco token -> invite_id
    tokens: DashMap<String, i32>,
    next_id: AtomicI32,
}

impl MemoryInvitationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserisce un invito così com'è, senza passare dalla create.
    /// Utile per preparare dati con timestamp arbitrari.
    pub fn insert_raw(&self, invitation: Invitation) -> Result<(), StoreError> {
        match self.tokens.entry(invitation.invite_token.clone()) {
            Entry::Occupied(_) => return Err(StoreError::Duplicate("invite_token")),
            Entry::Vacant(slot) => {
                slot.insert(invitation.invite_id);
            }
        }
        self.next_id.fetch_max(invitation.invite_id, Ordering::SeqCst);
        self.rows.insert(invitation.invite_id, invitation);
        Ok(())
    }
}

#[async_trait]
impl Create<Invitation, CreateInvitationDTO> for MemoryInvitationRepository {
    async fn create(&self, data: &CreateInvitationDTO) -> Result<Invitation, StoreError> {
        let invite_id = match self.tokens.entry(data.invite_token.clone()) {
            Entry::Occupied(_) => return Err(StoreError::Duplicate("invite_token")),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                slot.insert(id);
                id
            }
        };

        let invitation = Invitation {
            invite_id,
            sender_id: data.sender_id,
            recipient_email: data.recipient_email.clone(),
            recipient_phone: data.recipient_phone.clone(),
            recipient_id: data.recipient_id,
            status: InvitationStatus::Pending,
            message: data.message.clone(),
            invite_token: data.invite_token.clone(),
            created_at: data.created_at,
            expires_at: data.expires_at,
        };
        self.rows.insert(invite_id, invitation.clone());

        Ok(invitation)
    }
}

#[async_trait]
impl Read<Invitation, i32> for MemoryInvitationRepository {
    async fn read(&self, id: &i32) -> Result<Option<Invitation>, StoreError> {
        Ok(self.rows.get(id).map(|row| row.value().clone()))
    }
}

#[async_trait]
impl Update<Invitation, UpdateInvitationDTO, i32> for MemoryInvitationRepository {
    async fn update(&self, id: &i32, data: &UpdateInvitationDTO) -> Result<Invitation, StoreError> {
        let mut row = self.rows.get_mut(id).ok_or(StoreError::NotFound)?;
        if let Some(status) = data.status {
            row.status = status;
        }
        if let Some(recipient_id) = data.recipient_id {
            row.recipient_id = Some(recipient_id);
        }
        Ok(row.value().clone())
    }
}

#[async_trait]
impl InvitationStore for MemoryInvitationRepository {
    async fn find_by_token(&self, token: &str) -> Result<Option<Invitation>, StoreError> {
        let Some(id) = self.tokens.get(token).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        self.read(&id).await
    }

    async fn find_many_by_user_id(&self, user_id: &i32) -> Result<Vec<Invitation>, StoreError> {
        let mut invitations: Vec<Invitation> = self
            .rows
            .iter()
            .filter(|row| row.sender_id == *user_id || row.recipient_id == Some(*user_id))
            .map(|row| row.value().clone())
            .collect();
        newest_first(&mut invitations);
        Ok(invitations)
    }

    async fn find_pending_for_recipient(
        &self,
        user_id: &i32,
        email: &str,
    ) -> Result<Vec<Invitation>, StoreError> {
        let mut invitations: Vec<Invitation> = self
            .rows
            .iter()
            .filter(|row| row.status == InvitationStatus::Pending)
            .filter(|row| {
                row.recipient_id == Some(*user_id) || row.recipient_email.as_deref() == Some(email)
            })
            .map(|row| row.value().clone())
            .collect();
        newest_first(&mut invitations);
        Ok(invitations)
    }
}

#[derive(Default)]
pub struct MemoryUserRepository {
    users: DashMap<i32, User>,
    // indice univoco email -> user_id
    emails: DashMap<String, i32>,
    friends: DashMap<i32, BTreeSet<i32>>,
    next_id: AtomicI32,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Create<User, CreateUserDTO> for MemoryUserRepository {
    async fn create(&self, data: &CreateUserDTO) -> Result<User, StoreError> {
        let user_id = match self.emails.entry(data.email.clone()) {
            Entry::Occupied(_) => return Err(StoreError::Duplicate("email")),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                slot.insert(id);
                id
            }
        };

        let user = User {
            user_id,
            name: data.name.clone(),
            email: data.email.clone(),
            phone: data.phone.clone(),
            password: data.password.clone(),
        };
        self.users.insert(user_id, user.clone());

        Ok(user)
    }
}

#[async_trait]
impl Read<User, i32> for MemoryUserRepository {
    async fn read(&self, id: &i32) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(id).map(|user| user.value().clone()))
    }
}

#[async_trait]
impl ReadMany<User, i32> for MemoryUserRepository {
    async fn read_many(&self, ids: &[i32]) -> Result<Vec<User>, StoreError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|user| user.value().clone()))
            .collect())
    }
}

#[async_trait]
impl UserStore for MemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let Some(id) = self.emails.get(email).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        self.read(&id).await
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .iter()
            .filter(|user| user.phone.as_deref() == Some(phone))
            .min_by_key(|user| user.user_id)
            .map(|user| user.value().clone()))
    }

    async fn search_by_name_partial(&self, pattern: &str) -> Result<Vec<User>, StoreError> {
        let needle = pattern.to_lowercase();
        let mut users: Vec<User> = self
            .users
            .iter()
            .filter(|user| user.name.to_lowercase().starts_with(&needle))
            .map(|user| user.value().clone())
            .collect();
        users.sort_by_key(|user| user.user_id);
        users.truncate(10);
        Ok(users)
    }

    async fn add_friend(&self, user_id: &i32, friend_id: &i32) -> Result<bool, StoreError> {
        if !self.users.contains_key(user_id) || !self.users.contains_key(friend_id) {
            return Err(StoreError::NotFound);
        }
        Ok(self.friends.entry(*user_id).or_default().insert(*friend_id))
    }

    async fn friend_ids(&self, user_id: &i32) -> Result<Vec<i32>, StoreError> {
        Ok(self
            .friends
            .get(user_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn new_invitation(token: &str, email: Option<&str>) -> CreateInvitationDTO {
        let now = Utc::now();
        CreateInvitationDTO {
            sender_id: 1,
            recipient_email: email.map(str::to_string),
            recipient_phone: None,
            recipient_id: None,
            message: String::new(),
            invite_token: token.to_string(),
            created_at: now,
            expires_at: now + Duration::days(7),
        }
    }

    #[tokio::test]
    async fn duplicate_token_is_rejected() {
        let repo = MemoryInvitationRepository::new();
        repo.create(&new_invitation("tok", Some("a@x.com")))
            .await
            .expect("first insert");

        let err = repo
            .create(&new_invitation("tok", Some("b@x.com")))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate("invite_token")));
    }

    #[tokio::test]
    async fn pending_lookup_matches_by_email_or_recipient() {
        let repo = MemoryInvitationRepository::new();
        let by_email = repo
            .create(&new_invitation("t1", Some("a@x.com")))
            .await
            .unwrap();
        let by_id = repo.create(&new_invitation("t2", None)).await.unwrap();
        repo.update(
            &by_id.invite_id,
            &UpdateInvitationDTO {
                recipient_id: Some(7),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let declined = repo
            .create(&new_invitation("t3", Some("a@x.com")))
            .await
            .unwrap();
        repo.update(
            &declined.invite_id,
            &UpdateInvitationDTO {
                status: Some(InvitationStatus::Declined),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let pending = repo.find_pending_for_recipient(&7, "a@x.com").await.unwrap();
        let ids: Vec<i32> = pending.iter().map(|i| i.invite_id).collect();
        assert_eq!(ids, vec![by_id.invite_id, by_email.invite_id]);
    }

    #[tokio::test]
    async fn add_friend_is_idempotent_and_requires_existing_users() {
        let repo = MemoryUserRepository::new();
        let alice = repo
            .create(&CreateUserDTO {
                name: "alice".into(),
                email: "alice@x.com".into(),
                password: "hash".into(),
                phone: None,
            })
            .await
            .unwrap();
        let bob = repo
            .create(&CreateUserDTO {
                name: "bob".into(),
                email: "bob@x.com".into(),
                password: "hash".into(),
                phone: None,
            })
            .await
            .unwrap();

        assert!(repo.add_friend(&alice.user_id, &bob.user_id).await.unwrap());
        assert!(!repo.add_friend(&alice.user_id, &bob.user_id).await.unwrap());
        assert_eq!(repo.friend_ids(&alice.user_id).await.unwrap(), vec![bob.user_id]);
        assert!(repo.friend_ids(&bob.user_id).await.unwrap().is_empty());

        assert!(matches!(
            repo.add_friend(&alice.user_id, &99).await,
            Err(StoreError::NotFound)
        ));
    }
}

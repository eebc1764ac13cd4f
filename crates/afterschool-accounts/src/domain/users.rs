//! User records and their store.

use std::collections::HashMap;
use std::sync::Mutex;

use afterschool_core::error::DomainError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Placeholder written over redacted personal fields.
pub const REDACTED: &str = "[redacted]";

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// User identifier.
    pub id: Uuid,
    /// Name shown to providers and other parents.
    pub display_name: String,
    /// Login and contact address.
    pub email: String,
    /// When the account's personal data was erased.
    pub anonymized_at: Option<DateTime<Utc>>,
}

impl User {
    /// Returns `true` once personal data has been erased.
    #[must_use]
    pub fn is_anonymized(&self) -> bool {
        self.anonymized_at.is_some()
    }
}

/// Storage for user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new user.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AlreadyExists` if the email is taken.
    async fn insert(&self, user: User) -> Result<(), DomainError>;

    /// Loads a user.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the user does not exist.
    async fn get(&self, user_id: Uuid) -> Result<User, DomainError>;

    /// Overwrites the user's personal fields and records when. Repeating it
    /// on an anonymized user keeps the original timestamp.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the user does not exist.
    async fn anonymize(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<User, DomainError>;
}

/// In-process `UserStore`.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, User>>, DomainError> {
        self.users
            .lock()
            .map_err(|_| DomainError::Infrastructure("user store lock poisoned".into()))
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: User) -> Result<(), DomainError> {
        let mut users = self.lock()?;
        if users.values().any(|existing| existing.email == user.email) {
            return Err(DomainError::AlreadyExists(format!("user with email {}", user.email)));
        }
        users.insert(user.id, user);
        Ok(())
    }

    async fn get(&self, user_id: Uuid) -> Result<User, DomainError> {
        self.lock()?
            .get(&user_id)
            .cloned()
            .ok_or(DomainError::NotFound(user_id))
    }

    async fn anonymize(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<User, DomainError> {
        let mut users = self.lock()?;
        let user = users.get_mut(&user_id).ok_or(DomainError::NotFound(user_id))?;
        user.display_name = REDACTED.to_owned();
        user.email = format!("{user_id}@anonymized.invalid");
        user.anonymized_at.get_or_insert(at);
        Ok(user.clone())
    }
}

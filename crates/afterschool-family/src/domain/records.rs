//! Parent profiles, children and their store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use afterschool_core::error::DomainError;
use async_trait::async_trait;
use uuid::Uuid;

/// Placeholder written over redacted personal fields.
pub const REDACTED: &str = "[redacted]";

/// Family-side view of a parent, keyed by their user identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentProfile {
    /// The parent's user identifier.
    pub user_id: Uuid,
    /// Name shown to providers.
    pub display_name: String,
    /// Whether personal data has been erased.
    pub anonymized: bool,
}

/// A child registered by a parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Child {
    /// Child identifier.
    pub id: Uuid,
    /// The parent's user identifier.
    pub parent_id: Uuid,
    /// First name.
    pub first_name: String,
    /// Allergies, medication and similar notes.
    pub medical_notes: Option<String>,
    /// Whether personal data has been erased.
    pub anonymized: bool,
}

/// Storage for parent profiles and children.
///
/// Redactions are idempotent: repeating one on already redacted data
/// succeeds without change.
#[async_trait]
pub trait FamilyStore: Send + Sync {
    /// Creates a parent profile.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AlreadyExists` if the user already has one.
    async fn create_parent_profile(&self, profile: ParentProfile) -> Result<(), DomainError>;

    /// Loads a parent profile.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if there is no profile for the user.
    async fn parent_profile(&self, user_id: Uuid) -> Result<ParentProfile, DomainError>;

    /// Adds a child under an existing parent profile.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the parent has no profile.
    async fn add_child(&self, child: Child) -> Result<(), DomainError>;

    /// Loads a child.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the child does not exist.
    async fn child(&self, child_id: Uuid) -> Result<Child, DomainError>;

    /// Children of a parent, in the order they were added.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` on storage failure.
    async fn children_of(&self, parent_id: Uuid) -> Result<Vec<Child>, DomainError>;

    /// Redacts a parent profile.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if there is no profile for the user.
    async fn anonymize_parent(&self, user_id: Uuid) -> Result<(), DomainError>;

    /// Redacts a child.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the child does not exist.
    async fn anonymize_child(&self, child_id: Uuid) -> Result<(), DomainError>;
}

#[derive(Debug, Default)]
struct FamilyTables {
    parents: HashMap<Uuid, ParentProfile>,
    children: Vec<Child>,
}

/// In-process `FamilyStore`.
#[derive(Debug, Default)]
pub struct InMemoryFamilyStore {
    tables: Mutex<FamilyTables>,
}

impl InMemoryFamilyStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, FamilyTables>, DomainError> {
        self.tables
            .lock()
            .map_err(|_| DomainError::Infrastructure("family store lock poisoned".into()))
    }
}

#[async_trait]
impl FamilyStore for InMemoryFamilyStore {
    async fn create_parent_profile(&self, profile: ParentProfile) -> Result<(), DomainError> {
        let mut tables = self.lock()?;
        if tables.parents.contains_key(&profile.user_id) {
            return Err(DomainError::AlreadyExists(format!(
                "parent profile for user {}",
                profile.user_id
            )));
        }
        tables.parents.insert(profile.user_id, profile);
        Ok(())
    }

    async fn parent_profile(&self, user_id: Uuid) -> Result<ParentProfile, DomainError> {
        self.lock()?
            .parents
            .get(&user_id)
            .cloned()
            .ok_or(DomainError::NotFound(user_id))
    }

    async fn add_child(&self, child: Child) -> Result<(), DomainError> {
        let mut tables = self.lock()?;
        if !tables.parents.contains_key(&child.parent_id) {
            return Err(DomainError::NotFound(child.parent_id));
        }
        tables.children.push(child);
        Ok(())
    }

    async fn child(&self, child_id: Uuid) -> Result<Child, DomainError> {
        self.lock()?
            .children
            .iter()
            .find(|child| child.id == child_id)
            .cloned()
            .ok_or(DomainError::NotFound(child_id))
    }

    async fn children_of(&self, parent_id: Uuid) -> Result<Vec<Child>, DomainError> {
        Ok(self
            .lock()?
            .children
            .iter()
            .filter(|child| child.parent_id == parent_id)
            .cloned()
            .collect())
    }

    async fn anonymize_parent(&self, user_id: Uuid) -> Result<(), DomainError> {
        let mut tables = self.lock()?;
        let profile = tables
            .parents
            .get_mut(&user_id)
            .ok_or(DomainError::NotFound(user_id))?;
        REDACTED.clone_into(&mut profile.display_name);
        profile.anonymized = true;
        Ok(())
    }

    async fn anonymize_child(&self, child_id: Uuid) -> Result<(), DomainError> {
        let mut tables = self.lock()?;
        let child = tables
            .children
            .iter_mut()
            .find(|child| child.id == child_id)
            .ok_or(DomainError::NotFound(child_id))?;
        REDACTED.clone_into(&mut child.first_name);
        child.medical_notes = None;
        child.anonymized = true;
        Ok(())
    }
}

//! Program booking policies and their store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use afterschool_core::error::DomainError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Booking rules of one program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramPolicy {
    /// The program identifier.
    pub program_id: Uuid,
    /// Share of the fee refunded on cancellation, in percent.
    pub refund_percent: u8,
    /// Minimum notice for a refundable cancellation, in hours.
    pub cancellation_notice_hours: u32,
    /// Maximum number of enrolled children.
    pub capacity: u32,
    /// When the policy was last changed.
    pub updated_at: DateTime<Utc>,
}

/// Storage for program policies.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Inserts or replaces the policy of a program.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` on storage failure.
    async fn upsert(&self, policy: ProgramPolicy) -> Result<(), DomainError>;

    /// Loads a program's policy.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the program has no policy.
    async fn get(&self, program_id: Uuid) -> Result<ProgramPolicy, DomainError>;
}

/// In-process `PolicyStore`.
#[derive(Debug, Default)]
pub struct InMemoryPolicyStore {
    policies: Mutex<HashMap<Uuid, ProgramPolicy>>,
}

impl InMemoryPolicyStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Uuid, ProgramPolicy>>, DomainError> {
        self.policies
            .lock()
            .map_err(|_| DomainError::Infrastructure("policy store lock poisoned".into()))
    }
}

#[async_trait]
impl PolicyStore for InMemoryPolicyStore {
    async fn upsert(&self, policy: ProgramPolicy) -> Result<(), DomainError> {
        self.lock()?.insert(policy.program_id, policy);
        Ok(())
    }

    async fn get(&self, program_id: Uuid) -> Result<ProgramPolicy, DomainError> {
        self.lock()?
            .get(&program_id)
            .cloned()
            .ok_or(DomainError::NotFound(program_id))
    }
}

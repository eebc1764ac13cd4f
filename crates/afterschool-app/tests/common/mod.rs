//! Shared wiring for cross-context integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use afterschool_accounts::domain::commands::RegisterUser;
use afterschool_app::config::AppConfig;
use afterschool_app::platform::{Platform, Stores};
use afterschool_core::error::DomainError;
use afterschool_family::domain::commands::AddChild;
use afterschool_family::domain::records::{Child, FamilyStore, InMemoryFamilyStore, ParentProfile};
use afterschool_participation::domain::commands::{RecordAttendance, RecordBehavioralNote};
use afterschool_test_support::FixedClock;
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

/// Configuration used by every integration test.
pub fn test_config() -> AppConfig {
    AppConfig {
        retry_delay: Duration::from_millis(100),
        drain_timeout: Duration::from_secs(5),
    }
}

/// Starts the platform with the given stores and a fixed clock.
pub async fn start(stores: Stores) -> Platform {
    Platform::start(test_config(), stores, Arc::new(FixedClock::default()))
        .await
        .unwrap()
}

/// Registers a user and waits for Family to provision the parent profile.
pub async fn register_parent(platform: &Platform, display_name: &str) -> Uuid {
    let email = format!("{}@example.com", display_name.to_lowercase().replace(' ', "."));
    let result = platform
        .register_user(&RegisterUser {
            correlation_id: Uuid::new_v4(),
            display_name: display_name.to_owned(),
            email,
        })
        .await
        .unwrap();
    platform.settle().await;
    result.user_id
}

/// Adds a child with a medical note.
pub async fn add_child(platform: &Platform, parent_id: Uuid, first_name: &str) -> Uuid {
    platform
        .add_child(&AddChild {
            correlation_id: Uuid::new_v4(),
            parent_id,
            first_name: first_name.to_owned(),
            medical_notes: Some("lactose intolerant".to_owned()),
        })
        .await
        .unwrap()
}

/// Records one behavioral note and one attendance entry with remarks.
pub async fn record_participation(platform: &Platform, child_id: Uuid) {
    platform
        .record_behavioral_note(&RecordBehavioralNote {
            correlation_id: Uuid::new_v4(),
            child_id,
            author_id: Uuid::new_v4(),
            note: "refused to join circle time".to_owned(),
        })
        .await
        .unwrap();
    platform
        .record_attendance(&RecordAttendance {
            correlation_id: Uuid::new_v4(),
            child_id,
            session_date: NaiveDate::from_ymd_opt(2026, 1, 14).unwrap(),
            present: true,
            remarks: Some("picked up by aunt".to_owned()),
        })
        .await
        .unwrap();
}

/// Family store whose child redactions can be made to fail a set number
/// of times per child.
#[derive(Default)]
pub struct FlakyFamilyStore {
    inner: InMemoryFamilyStore,
    failures: Mutex<HashMap<Uuid, u32>>,
}

impl FlakyFamilyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `times` redactions of `child_id` fail transiently.
    pub fn fail_child(&self, child_id: Uuid, times: u32) {
        self.failures.lock().unwrap().insert(child_id, times);
    }

    fn injected_failure(&self, child_id: Uuid) -> bool {
        let mut failures = self.failures.lock().unwrap();
        match failures.get_mut(&child_id) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl FamilyStore for FlakyFamilyStore {
    async fn create_parent_profile(&self, profile: ParentProfile) -> Result<(), DomainError> {
        self.inner.create_parent_profile(profile).await
    }

    async fn parent_profile(&self, user_id: Uuid) -> Result<ParentProfile, DomainError> {
        self.inner.parent_profile(user_id).await
    }

    async fn add_child(&self, child: Child) -> Result<(), DomainError> {
        self.inner.add_child(child).await
    }

    async fn child(&self, child_id: Uuid) -> Result<Child, DomainError> {
        self.inner.child(child_id).await
    }

    async fn children_of(&self, parent_id: Uuid) -> Result<Vec<Child>, DomainError> {
        self.inner.children_of(parent_id).await
    }

    async fn anonymize_parent(&self, user_id: Uuid) -> Result<(), DomainError> {
        self.inner.anonymize_parent(user_id).await
    }

    async fn anonymize_child(&self, child_id: Uuid) -> Result<(), DomainError> {
        if self.injected_failure(child_id) {
            return Err(DomainError::Infrastructure("family db connection reset".into()));
        }
        self.inner.anonymize_child(child_id).await
    }
}

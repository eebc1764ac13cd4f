//! End-to-end GDPR deletion across Accounts, Family and Participation.

mod common;

use std::sync::Arc;

use afterschool_accounts::domain::commands::AnonymizeUser;
use afterschool_accounts::domain::users::UserStore;
use afterschool_app::platform::Stores;
use afterschool_core::event::Message;
use afterschool_family::domain::records::FamilyStore;
use afterschool_participation::domain::records::{BehavioralNote, ParticipationStore};
use afterschool_test_support::{CapturedLogs, RecordingSubscriber};
use common::FlakyFamilyStore;
use tracing::Level;
use uuid::Uuid;

fn delete(user_id: Uuid) -> AnonymizeUser {
    AnonymizeUser {
        correlation_id: Uuid::new_v4(),
        user_id,
        requested_by: Some(user_id),
    }
}

#[tokio::test(start_paused = true)]
async fn test_account_deletion_redacts_every_context() {
    // Arrange
    let family = Arc::new(FlakyFamilyStore::new());
    let stores = Stores {
        family: family.clone(),
        ..Stores::default()
    };
    let platform = common::start(stores).await;
    let parent = common::register_parent(&platform, "Morgan Lee").await;
    let first = common::add_child(&platform, parent, "Iris").await;
    let second = common::add_child(&platform, parent, "Felix").await;
    common::record_participation(&platform, first).await;
    common::record_participation(&platform, second).await;
    family.fail_child(first, 1);

    // Act
    platform.delete_account(&delete(parent)).await.unwrap();
    platform.settle().await;

    // Assert
    let stores = platform.stores();
    assert!(stores.users.get(parent).await.unwrap().is_anonymized());
    assert!(stores.family.parent_profile(parent).await.unwrap().anonymized);
    for child_id in [first, second] {
        let child = stores.family.child(child_id).await.unwrap();
        assert!(child.anonymized);
        assert!(child.medical_notes.is_none());
        let notes = stores.participation.notes_for(child_id).await.unwrap();
        assert!(notes.iter().all(|note| note.redacted));
        let attendance = stores.participation.attendance_for(child_id).await.unwrap();
        assert!(attendance.iter().all(|record| record.redacted));
        assert_eq!(attendance[0].remarks.as_deref(), Some("[redacted]"));
    }
}

#[tokio::test(start_paused = true)]
async fn test_persistent_failure_halts_at_the_failing_child() {
    // Arrange
    let family = Arc::new(FlakyFamilyStore::new());
    let stores = Stores {
        family: family.clone(),
        ..Stores::default()
    };
    let platform = common::start(stores).await;
    let parent = common::register_parent(&platform, "Casey Obi").await;
    let first = common::add_child(&platform, parent, "June").await;
    let second = common::add_child(&platform, parent, "Omar").await;
    let third = common::add_child(&platform, parent, "Tess").await;
    for child in [first, second, third] {
        common::record_participation(&platform, child).await;
    }
    family.fail_child(second, 2);
    let logs = CapturedLogs::default();
    let _guard = logs.install();

    // Act
    let deletion = platform.delete_account(&delete(parent)).await;
    platform.settle().await;

    // Assert
    assert!(deletion.is_ok());
    let stores = platform.stores();
    assert!(stores.family.child(first).await.unwrap().anonymized);
    assert!(!stores.family.child(second).await.unwrap().anonymized);
    assert!(!stores.family.child(third).await.unwrap().anonymized);
    let redacted = |notes: Vec<BehavioralNote>| notes.iter().all(|note| note.redacted);
    assert!(redacted(stores.participation.notes_for(first).await.unwrap()));
    assert!(!redacted(stores.participation.notes_for(second).await.unwrap()));
    assert!(!redacted(stores.participation.notes_for(third).await.unwrap()));
    let failure = logs
        .find("subscriber failed to handle critical event")
        .expect("critical failure logged");
    assert_eq!(failure.level, Level::ERROR);
    assert_eq!(failure.field("subscriber"), Some("family.user_anonymized"));
}

#[tokio::test]
async fn test_cascade_carries_correlation_and_causation() {
    // Arrange
    let platform = common::start(Stores::default()).await;
    let parent = common::register_parent(&platform, "Robin Diaz").await;
    let child = common::add_child(&platform, parent, "Nia").await;
    let accounts = Arc::new(RecordingSubscriber::new("accounts-observer"));
    let family = Arc::new(RecordingSubscriber::new("family-observer"));
    platform
        .pubsub()
        .subscribe("integration:accounts:user_anonymized", accounts.clone())
        .unwrap();
    platform
        .pubsub()
        .subscribe("integration:family:child_data_anonymized", family.clone())
        .unwrap();
    let command = delete(parent);

    // Act
    platform.delete_account(&command).await.unwrap();
    platform.settle().await;

    // Assert
    let accounts_received = accounts.received();
    let family_received = family.received();
    let [Message::Integration(user_event)] = accounts_received.as_slice() else {
        panic!("expected one user_anonymized integration event");
    };
    let [Message::Integration(child_event)] = family_received.as_slice() else {
        panic!("expected one child_data_anonymized integration event");
    };
    assert!(user_event.is_critical());
    assert!(child_event.is_critical());
    assert_eq!(user_event.metadata().correlation_id, Some(command.correlation_id));
    assert_eq!(child_event.metadata().correlation_id, Some(command.correlation_id));
    assert_eq!(user_event.metadata().actor_id(), Some(parent));
    assert_eq!(child_event.entity_id(), child);
    let causation = child_event.metadata().causation_id;
    assert!(causation.is_some());
    assert_ne!(causation, Some(user_event.event_id()));
    assert_ne!(causation, Some(child_event.event_id()));
}

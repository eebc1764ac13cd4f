//! Command handlers for the Participation context.

use afterschool_core::command::Command;
use afterschool_core::error::DomainError;
use afterschool_core::retry::retry_with_backoff;
use tracing::{info, instrument};
use uuid::Uuid;

use super::ParticipationServices;
use crate::domain::commands::{RecordAttendance, RecordBehavioralNote, RedactChildRecords};
use crate::domain::records::{AttendanceRecord, BehavioralNote, RedactionSummary};

/// Handles `RecordBehavioralNote`.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the note is blank.
#[instrument(skip_all, fields(command = command.command_type(), context = %command.context(), child_id = %command.child_id))]
pub async fn handle_record_behavioral_note(
    command: &RecordBehavioralNote,
    services: &ParticipationServices,
) -> Result<Uuid, DomainError> {
    if command.note.trim().is_empty() {
        return Err(DomainError::Validation("note must not be blank".into()));
    }

    let note = BehavioralNote {
        id: Uuid::new_v4(),
        child_id: command.child_id,
        author_id: command.author_id,
        note: command.note.clone(),
        recorded_at: services.clock.now(),
        redacted: false,
    };
    let note_id = note.id;
    services.store.add_note(note).await?;
    info!(%note_id, "behavioral note recorded");
    Ok(note_id)
}

/// Handles `RecordAttendance`.
///
/// # Errors
///
/// Returns `DomainError::AlreadyExists` if attendance for that day is
/// already recorded.
#[instrument(skip_all, fields(command = command.command_type(), context = %command.context(), child_id = %command.child_id))]
pub async fn handle_record_attendance(
    command: &RecordAttendance,
    services: &ParticipationServices,
) -> Result<Uuid, DomainError> {
    let record = AttendanceRecord {
        id: Uuid::new_v4(),
        child_id: command.child_id,
        session_date: command.session_date,
        present: command.present,
        remarks: command.remarks.clone(),
        redacted: false,
    };
    let record_id = record.id;
    services.store.add_attendance(record).await?;
    info!(%record_id, session_date = %command.session_date, "attendance recorded");
    Ok(record_id)
}

/// Handles `RedactChildRecords` with one retry on transient failure.
///
/// # Errors
///
/// Returns the store's error once the retry is exhausted.
#[instrument(
    skip_all,
    fields(
        command = command.command_type(),
        context = %command.context(),
        child_id = %command.child_id,
        causation_id = ?command.causation_id,
    )
)]
pub async fn handle_redact_child_records(
    command: &RedactChildRecords,
    services: &ParticipationServices,
) -> Result<RedactionSummary, DomainError> {
    let store = services.store.as_ref();
    let child_id = command.child_id;

    let summary = retry_with_backoff(
        move || store.redact_child(child_id),
        services.retry.context("redact_child_records", child_id),
    )
    .await?;

    info!(
        notes = summary.notes,
        attendance = summary.attendance,
        "child participation records redacted"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use afterschool_core::retry::RetryPolicy;
    use afterschool_test_support::FixedClock;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::records::{InMemoryParticipationStore, ParticipationStore, REDACTED};

    /// Fails the first `n` redactions with a transient error.
    struct FlakyRedactions {
        inner: InMemoryParticipationStore,
        failures: AtomicU32,
    }

    #[async_trait]
    impl ParticipationStore for FlakyRedactions {
        async fn add_note(&self, note: BehavioralNote) -> Result<(), DomainError> {
            self.inner.add_note(note).await
        }

        async fn add_attendance(&self, record: AttendanceRecord) -> Result<(), DomainError> {
            self.inner.add_attendance(record).await
        }

        async fn notes_for(&self, child_id: Uuid) -> Result<Vec<BehavioralNote>, DomainError> {
            self.inner.notes_for(child_id).await
        }

        async fn attendance_for(
            &self,
            child_id: Uuid,
        ) -> Result<Vec<AttendanceRecord>, DomainError> {
            self.inner.attendance_for(child_id).await
        }

        async fn redact_child(&self, child_id: Uuid) -> Result<RedactionSummary, DomainError> {
            let injected = self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if injected {
                return Err(DomainError::Infrastructure("write timeout".into()));
            }
            self.inner.redact_child(child_id).await
        }
    }

    fn services(store: Arc<dyn ParticipationStore>) -> ParticipationServices {
        ParticipationServices {
            store,
            clock: Arc::new(FixedClock::default()),
            retry: RetryPolicy::new(Duration::from_millis(100)),
        }
    }

    fn note_command(child_id: Uuid, note: &str) -> RecordBehavioralNote {
        RecordBehavioralNote {
            correlation_id: Uuid::new_v4(),
            child_id,
            author_id: Uuid::new_v4(),
            note: note.into(),
        }
    }

    #[tokio::test]
    async fn test_record_note_uses_clock() {
        // Arrange
        let services = services(Arc::new(InMemoryParticipationStore::new()));
        let child_id = Uuid::new_v4();

        // Act
        let note_id =
            handle_record_behavioral_note(&note_command(child_id, "shared snacks"), &services)
                .await
                .unwrap();

        // Assert
        let notes = services.store.notes_for(child_id).await.unwrap();
        assert_eq!(notes[0].id, note_id);
        assert_eq!(notes[0].recorded_at, FixedClock::default().0);
    }

    #[tokio::test]
    async fn test_blank_note_is_rejected() {
        let services = services(Arc::new(InMemoryParticipationStore::new()));

        let result =
            handle_record_behavioral_note(&note_command(Uuid::new_v4(), "  "), &services).await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_redaction_survives_one_transient_failure() {
        // Arrange
        let store = Arc::new(FlakyRedactions {
            inner: InMemoryParticipationStore::new(),
            failures: AtomicU32::new(1),
        });
        let services = services(store.clone());
        let child_id = Uuid::new_v4();
        handle_record_behavioral_note(&note_command(child_id, "needed quiet corner"), &services)
            .await
            .unwrap();
        handle_record_attendance(
            &RecordAttendance {
                correlation_id: Uuid::new_v4(),
                child_id,
                session_date: NaiveDate::from_ymd_opt(2026, 1, 14).unwrap(),
                present: false,
                remarks: Some("family emergency".into()),
            },
            &services,
        )
        .await
        .unwrap();

        // Act
        let summary = handle_redact_child_records(
            &RedactChildRecords {
                correlation_id: Uuid::new_v4(),
                causation_id: None,
                child_id,
            },
            &services,
        )
        .await
        .unwrap();

        // Assert
        assert_eq!(summary, RedactionSummary { notes: 1, attendance: 1 });
        assert_eq!(store.notes_for(child_id).await.unwrap()[0].note, REDACTED);
    }

    #[tokio::test(start_paused = true)]
    async fn test_redaction_fails_after_second_transient_failure() {
        let store = Arc::new(FlakyRedactions {
            inner: InMemoryParticipationStore::new(),
            failures: AtomicU32::new(2),
        });
        let services = services(store);

        let result = handle_redact_child_records(
            &RedactChildRecords {
                correlation_id: Uuid::new_v4(),
                causation_id: None,
                child_id: Uuid::new_v4(),
            },
            &services,
        )
        .await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }
}

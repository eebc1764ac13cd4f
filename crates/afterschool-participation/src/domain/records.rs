//! Behavioral notes, attendance records and their store.

use std::sync::{Mutex, MutexGuard};

use afterschool_core::error::DomainError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Placeholder written over redacted free text.
pub const REDACTED: &str = "[redacted]";

/// A staff observation about a child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BehavioralNote {
    /// Note identifier.
    pub id: Uuid,
    /// The child observed.
    pub child_id: Uuid,
    /// The staff member who wrote the note.
    pub author_id: Uuid,
    /// Free-text observation.
    pub note: String,
    /// When the note was written.
    pub recorded_at: DateTime<Utc>,
    /// Whether the text has been erased.
    pub redacted: bool,
}

/// Attendance of a child on one session day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRecord {
    /// Record identifier.
    pub id: Uuid,
    /// The child.
    pub child_id: Uuid,
    /// Day of the session.
    pub session_date: NaiveDate,
    /// Whether the child attended.
    pub present: bool,
    /// Staff remarks.
    pub remarks: Option<String>,
    /// Whether the remarks have been erased.
    pub redacted: bool,
}

/// Records changed by one redaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RedactionSummary {
    /// Notes redacted by this call.
    pub notes: usize,
    /// Attendance records redacted by this call.
    pub attendance: usize,
}

/// Storage for participation records.
#[async_trait]
pub trait ParticipationStore: Send + Sync {
    /// Stores a behavioral note. A child may have any number of notes per
    /// day; only the note's own identifier must be unique.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AlreadyExists` if a note with the same id is
    /// already stored, or `DomainError::Infrastructure` on storage failure.
    async fn add_note(&self, note: BehavioralNote) -> Result<(), DomainError>;

    /// Stores an attendance record.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AlreadyExists` if the child already has a record
    /// for that day.
    async fn add_attendance(&self, record: AttendanceRecord) -> Result<(), DomainError>;

    /// Notes about a child, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` on storage failure.
    async fn notes_for(&self, child_id: Uuid) -> Result<Vec<BehavioralNote>, DomainError>;

    /// Attendance of a child, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` on storage failure.
    async fn attendance_for(&self, child_id: Uuid) -> Result<Vec<AttendanceRecord>, DomainError>;

    /// Erases note text and attendance remarks for a child. Records that are
    /// already redacted are left alone, so repeating the call is harmless.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` on storage failure.
    async fn redact_child(&self, child_id: Uuid) -> Result<RedactionSummary, DomainError>;
}

#[derive(Debug, Default)]
struct ParticipationTables {
    notes: Vec<BehavioralNote>,
    attendance: Vec<AttendanceRecord>,
}

/// In-process `ParticipationStore`.
#[derive(Debug, Default)]
pub struct InMemoryParticipationStore {
    tables: Mutex<ParticipationTables>,
}

impl InMemoryParticipationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, ParticipationTables>, DomainError> {
        self.tables
            .lock()
            .map_err(|_| DomainError::Infrastructure("participation store lock poisoned".into()))
    }
}

#[async_trait]
impl ParticipationStore for InMemoryParticipationStore {
    async fn add_note(&self, note: BehavioralNote) -> Result<(), DomainError> {
        let mut tables = self.lock()?;
        if tables.notes.iter().any(|existing| existing.id == note.id) {
            return Err(DomainError::AlreadyExists(format!("behavioral note {}", note.id)));
        }
        tables.notes.push(note);
        Ok(())
    }

    async fn add_attendance(&self, record: AttendanceRecord) -> Result<(), DomainError> {
        let mut tables = self.lock()?;
        let duplicate = tables.attendance.iter().any(|existing| {
            existing.child_id == record.child_id && existing.session_date == record.session_date
        });
        if duplicate {
            return Err(DomainError::AlreadyExists(format!(
                "attendance for child {} on {}",
                record.child_id, record.session_date
            )));
        }
        tables.attendance.push(record);
        Ok(())
    }

    async fn notes_for(&self, child_id: Uuid) -> Result<Vec<BehavioralNote>, DomainError> {
        Ok(self
            .lock()?
            .notes
            .iter()
            .filter(|note| note.child_id == child_id)
            .cloned()
            .collect())
    }

    async fn attendance_for(&self, child_id: Uuid) -> Result<Vec<AttendanceRecord>, DomainError> {
        Ok(self
            .lock()?
            .attendance
            .iter()
            .filter(|record| record.child_id == child_id)
            .cloned()
            .collect())
    }

    async fn redact_child(&self, child_id: Uuid) -> Result<RedactionSummary, DomainError> {
        let mut tables = self.lock()?;
        let mut summary = RedactionSummary::default();

        for note in tables
            .notes
            .iter_mut()
            .filter(|note| note.child_id == child_id && !note.redacted)
        {
            REDACTED.clone_into(&mut note.note);
            note.redacted = true;
            summary.notes += 1;
        }

        for record in tables
            .attendance
            .iter_mut()
            .filter(|record| record.child_id == child_id && !record.redacted)
        {
            record.remarks = record.remarks.as_ref().map(|_| REDACTED.to_owned());
            record.redacted = true;
            summary.attendance += 1;
        }

        Ok(summary)
    }
}

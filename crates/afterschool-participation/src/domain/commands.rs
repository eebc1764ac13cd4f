//! Commands for the Participation context.

use afterschool_core::command::Command;
use afterschool_core::context::Context;
use chrono::NaiveDate;
use uuid::Uuid;

/// Command to record a staff observation about a child.
#[derive(Debug, Clone)]
pub struct RecordBehavioralNote {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The child observed.
    pub child_id: Uuid,
    /// The staff member writing the note.
    pub author_id: Uuid,
    /// Free-text observation.
    pub note: String,
}

impl Command for RecordBehavioralNote {
    fn command_type(&self) -> &'static str {
        "participation.record_behavioral_note"
    }

    fn context(&self) -> Context {
        Context::Participation
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to record a child's attendance for one session day.
#[derive(Debug, Clone)]
pub struct RecordAttendance {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The child.
    pub child_id: Uuid,
    /// Day of the session.
    pub session_date: NaiveDate,
    /// Whether the child attended.
    pub present: bool,
    /// Optional staff remarks.
    pub remarks: Option<String>,
}

impl Command for RecordAttendance {
    fn command_type(&self) -> &'static str {
        "participation.record_attendance"
    }

    fn context(&self) -> Context {
        Context::Participation
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to erase the personal content of every record about a child.
#[derive(Debug, Clone)]
pub struct RedactChildRecords {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The event that triggered the redaction, if any.
    pub causation_id: Option<Uuid>,
    /// The child whose records are redacted.
    pub child_id: Uuid,
}

impl Command for RedactChildRecords {
    fn command_type(&self) -> &'static str {
        "participation.redact_child_records"
    }

    fn context(&self) -> Context {
        Context::Participation
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn causation_id(&self) -> Option<Uuid> {
        self.causation_id
    }
}

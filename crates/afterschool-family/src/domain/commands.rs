//! Commands for the Family context.

use afterschool_core::command::Command;
use afterschool_core::context::Context;
use uuid::Uuid;

/// Command to create the parent profile derived from a user account.
#[derive(Debug, Clone)]
pub struct CreateParentProfile {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The account the profile belongs to.
    pub user_id: Uuid,
    /// Name copied from the account.
    pub display_name: String,
}

impl Command for CreateParentProfile {
    fn command_type(&self) -> &'static str {
        "family.create_parent_profile"
    }

    fn context(&self) -> Context {
        Context::Family
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to add a child under a parent profile.
#[derive(Debug, Clone)]
pub struct AddChild {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The parent's user identifier.
    pub parent_id: Uuid,
    /// The child's first name.
    pub first_name: String,
    /// Allergies, medication and similar notes for providers.
    pub medical_notes: Option<String>,
}

impl Command for AddChild {
    fn command_type(&self) -> &'static str {
        "family.add_child"
    }

    fn context(&self) -> Context {
        Context::Family
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to erase a parent's and their children's personal data.
#[derive(Debug, Clone)]
pub struct AnonymizeFamily {
    /// The correlation ID shared with the originating deletion.
    pub correlation_id: Uuid,
    /// The event that caused this command, if any.
    pub causation_id: Option<Uuid>,
    /// The parent's user identifier.
    pub user_id: Uuid,
}

impl Command for AnonymizeFamily {
    fn command_type(&self) -> &'static str {
        "family.anonymize_family"
    }

    fn context(&self) -> Context {
        Context::Family
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn causation_id(&self) -> Option<Uuid> {
        self.causation_id
    }
}

//! Commands for the Accounts context.

use afterschool_core::command::Command;
use afterschool_core::context::Context;
use uuid::Uuid;

/// Command to create a user account.
#[derive(Debug, Clone)]
pub struct RegisterUser {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Name shown to providers and other parents.
    pub display_name: String,
    /// Login and contact address.
    pub email: String,
}

impl Command for RegisterUser {
    fn command_type(&self) -> &'static str {
        "accounts.register_user"
    }

    fn context(&self) -> Context {
        Context::Accounts
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to erase a user's personal data (GDPR deletion).
#[derive(Debug, Clone)]
pub struct AnonymizeUser {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The user to anonymize.
    pub user_id: Uuid,
    /// Who requested the deletion, if not the user themself.
    pub requested_by: Option<Uuid>,
}

impl Command for AnonymizeUser {
    fn command_type(&self) -> &'static str {
        "accounts.anonymize_user"
    }

    fn context(&self) -> Context {
        Context::Accounts
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

//! Commands for the Catalog context.

use afterschool_core::command::Command;
use afterschool_core::context::Context;
use uuid::Uuid;

/// Command to replace a program's booking policy.
#[derive(Debug, Clone)]
pub struct UpdateProgramPolicy {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The program whose policy changes.
    pub program_id: Uuid,
    /// The provider making the change.
    pub updated_by: Uuid,
    /// Share of the fee refunded on cancellation, in percent.
    pub refund_percent: u8,
    /// Minimum notice for a refundable cancellation, in hours.
    pub cancellation_notice_hours: u32,
    /// Maximum number of enrolled children.
    pub capacity: u32,
}

impl Command for UpdateProgramPolicy {
    fn command_type(&self) -> &'static str {
        "catalog.update_program_policy"
    }

    fn context(&self) -> Context {
        Context::Catalog
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

//! Shared test doubles and utilities for the Afterschool platform.

mod clock;
mod handlers;
mod logs;
mod publisher;

pub use clock::FixedClock;
pub use handlers::{CallLog, RecordingHandler, RecordingSubscriber};
pub use logs::{CapturedLog, CapturedLogs};
pub use publisher::{FailOnNthPublisher, FailingPublisher, RecordingPublisher};

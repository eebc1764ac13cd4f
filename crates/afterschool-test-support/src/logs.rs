//! Log capture — a `tracing` layer that records events for assertions.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::Registry;
use tracing_subscriber::Layer;

/// One captured log event.
#[derive(Debug, Clone)]
pub struct CapturedLog {
    /// Event level.
    pub level: Level,
    /// The `message` field.
    pub message: String,
    /// Every other field, rendered with `Display` where available.
    pub fields: BTreeMap<String, String>,
}

impl CapturedLog {
    /// Returns a rendered field value.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Records every `tracing` event emitted while installed.
///
/// Installation is thread-local, so use it with the default current-thread
/// `#[tokio::test]` runtime.
#[derive(Debug, Clone, Default)]
pub struct CapturedLogs {
    entries: Arc<Mutex<Vec<CapturedLog>>>,
}

impl CapturedLogs {
    /// Installs the capture as the thread's default subscriber until the
    /// returned guard is dropped.
    #[must_use]
    pub fn install(&self) -> DefaultGuard {
        let subscriber = Registry::default().with(self.clone());
        tracing::subscriber::set_default(subscriber)
    }

    /// Snapshot of every captured event.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn entries(&self) -> Vec<CapturedLog> {
        self.entries.lock().unwrap().clone()
    }

    /// First event whose message equals `message`.
    #[must_use]
    pub fn find(&self, message: &str) -> Option<CapturedLog> {
        self.entries().into_iter().find(|entry| entry.message == message)
    }

    /// Every event at exactly `level`.
    #[must_use]
    pub fn at_level(&self, level: Level) -> Vec<CapturedLog> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.level == level)
            .collect()
    }
}

impl<S: Subscriber> Layer<S> for CapturedLogs {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldCollector::default();
        event.record(&mut visitor);
        self.entries.lock().unwrap().push(CapturedLog {
            level: *event.metadata().level(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

#[derive(Default)]
struct FieldCollector {
    message: String,
    fields: BTreeMap<String, String>,
}

impl FieldCollector {
    fn insert(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = value;
        } else {
            self.fields.insert(field.name().to_owned(), value);
        }
    }
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, value.to_owned());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, format!("{value:?}"));
    }
}

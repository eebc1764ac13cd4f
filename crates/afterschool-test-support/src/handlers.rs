//! Test handlers — recording `EventHandler` and `Subscriber` doubles.

use std::sync::{Arc, Mutex};

use afterschool_core::error::EventError;
use afterschool_core::event::{DomainEvent, Message};
use afterschool_core::handler::{EventHandler, HandlerResult, Handling, Interest, Subscriber};
use async_trait::async_trait;

/// Ordered log of handler names shared between several doubles, used to
/// assert invocation order.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    /// Appends a name.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn push(&self, name: &str) {
        self.0.lock().unwrap().push(name.to_owned());
    }

    /// Snapshot of every recorded name, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

#[derive(Debug, Clone)]
enum Behavior {
    Apply,
    Ignore,
    Fail(String),
    Panic,
}

impl Behavior {
    fn outcome(&self, name: &str) -> HandlerResult {
        match self {
            Self::Apply => Ok(Handling::Applied),
            Self::Ignore => Ok(Handling::Ignored),
            Self::Fail(reason) => Err(EventError::Handler(reason.clone())),
            Self::Panic => panic!("{name} exploded"),
        }
    }
}

/// An `EventHandler` that records every event it receives and answers with
/// a fixed outcome.
#[derive(Debug)]
pub struct RecordingHandler {
    name: &'static str,
    interest: Interest,
    behavior: Behavior,
    handled: Mutex<Vec<DomainEvent>>,
    calls: Option<CallLog>,
}

impl RecordingHandler {
    fn with_behavior(name: &'static str, interest: Interest, behavior: Behavior) -> Self {
        Self {
            name,
            interest,
            behavior,
            handled: Mutex::new(Vec::new()),
            calls: None,
        }
    }

    /// A handler that applies every event.
    #[must_use]
    pub fn new(name: &'static str, interest: Interest) -> Self {
        Self::with_behavior(name, interest, Behavior::Apply)
    }

    /// A handler that ignores every event.
    #[must_use]
    pub fn ignoring(name: &'static str, interest: Interest) -> Self {
        Self::with_behavior(name, interest, Behavior::Ignore)
    }

    /// A handler that fails every event with `reason`.
    #[must_use]
    pub fn failing(name: &'static str, interest: Interest, reason: &str) -> Self {
        Self::with_behavior(name, interest, Behavior::Fail(reason.to_owned()))
    }

    /// A handler that panics on every event.
    #[must_use]
    pub fn panicking(name: &'static str, interest: Interest) -> Self {
        Self::with_behavior(name, interest, Behavior::Panic)
    }

    /// Also records this handler's name into `calls` on each invocation.
    #[must_use]
    pub fn with_call_log(mut self, calls: CallLog) -> Self {
        self.calls = Some(calls);
        self
    }

    /// Snapshot of every handled event.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn handled(&self) -> Vec<DomainEvent> {
        self.handled.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventHandler for RecordingHandler {
    fn name(&self) -> &'static str {
        self.name
    }

    fn subscribed_events(&self) -> Interest {
        self.interest.clone()
    }

    async fn handle_event(&self, event: &DomainEvent) -> HandlerResult {
        if let Some(calls) = &self.calls {
            calls.push(self.name);
        }
        self.handled.lock().unwrap().push(event.clone());
        self.behavior.outcome(self.name)
    }
}

/// A `Subscriber` that records every message it receives and answers with
/// a fixed outcome.
#[derive(Debug)]
pub struct RecordingSubscriber {
    name: &'static str,
    behavior: Behavior,
    received: Mutex<Vec<Message>>,
}

impl RecordingSubscriber {
    /// A subscriber that applies every message.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            behavior: Behavior::Apply,
            received: Mutex::new(Vec::new()),
        }
    }

    /// A subscriber that fails every message with `reason`.
    #[must_use]
    pub fn failing(name: &'static str, reason: &str) -> Self {
        Self {
            behavior: Behavior::Fail(reason.to_owned()),
            ..Self::new(name)
        }
    }

    /// A subscriber that panics on every message.
    #[must_use]
    pub fn panicking(name: &'static str) -> Self {
        Self {
            behavior: Behavior::Panic,
            ..Self::new(name)
        }
    }

    /// Snapshot of every received message.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn received(&self) -> Vec<Message> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl Subscriber for RecordingSubscriber {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn handle_message(&self, message: &Message) -> HandlerResult {
        self.received.lock().unwrap().push(message.clone());
        self.behavior.outcome(self.name)
    }
}

//! Test publishers — mock `Publisher` implementations for tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use afterschool_core::error::EventError;
use afterschool_core::event::Message;
use afterschool_core::publisher::Publisher;
use async_trait::async_trait;

/// A publisher that records every `(topic, message)` pair and always
/// succeeds.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<(String, Message)>>,
}

impl RecordingPublisher {
    /// Creates an empty recording publisher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every published `(topic, message)` pair.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn published(&self) -> Vec<(String, Message)> {
        self.published.lock().unwrap().clone()
    }

    /// Topics published to, in order.
    #[must_use]
    pub fn topics(&self) -> Vec<String> {
        self.published().into_iter().map(|(topic, _)| topic).collect()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish_to(&self, message: Message, topic: &str) -> Result<(), EventError> {
        self.published
            .lock()
            .unwrap()
            .push((topic.to_owned(), message));
        Ok(())
    }
}

/// A publisher that rejects every publish. Useful for testing failure
/// propagation and log routing.
#[derive(Debug, Default)]
pub struct FailingPublisher {
    attempts: AtomicUsize,
}

impl FailingPublisher {
    /// Creates a publisher that always fails.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of publish attempts seen.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Publisher for FailingPublisher {
    async fn publish_to(&self, _message: Message, topic: &str) -> Result<(), EventError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(EventError::Publish {
            topic: topic.to_owned(),
            reason: "broker unavailable".into(),
        })
    }
}

/// A publisher that records successful publishes and fails exactly the
/// `n`th call (1-based).
#[derive(Debug)]
pub struct FailOnNthPublisher {
    fail_on: usize,
    calls: AtomicUsize,
    inner: RecordingPublisher,
}

impl FailOnNthPublisher {
    /// Creates a publisher that fails call number `fail_on`.
    #[must_use]
    pub fn new(fail_on: usize) -> Self {
        Self {
            fail_on,
            calls: AtomicUsize::new(0),
            inner: RecordingPublisher::new(),
        }
    }

    /// Number of publish attempts seen, including the failed one.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Snapshot of every successfully published `(topic, message)` pair.
    #[must_use]
    pub fn published(&self) -> Vec<(String, Message)> {
        self.inner.published()
    }
}

#[async_trait]
impl Publisher for FailOnNthPublisher {
    async fn publish_to(&self, message: Message, topic: &str) -> Result<(), EventError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on {
            return Err(EventError::Publish {
                topic: topic.to_owned(),
                reason: format!("injected failure on publish #{call}"),
            });
        }
        self.inner.publish_to(message, topic).await
    }
}

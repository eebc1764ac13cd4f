//! Wiring of every context onto one bus and one transport.

use std::sync::Arc;

use afterschool_accounts::application::command_handlers::{
    AccountsCommandResult, handle_anonymize_user, handle_register_user,
};
use afterschool_accounts::application::promotion::AccountsPromotion;
use afterschool_accounts::domain::commands::{AnonymizeUser, RegisterUser};
use afterschool_accounts::domain::users::{InMemoryUserStore, UserStore};
use afterschool_catalog::application::command_handlers::handle_update_program_policy;
use afterschool_catalog::application::search_index::SearchIndexHook;
use afterschool_catalog::domain::commands::UpdateProgramPolicy;
use afterschool_catalog::domain::policies::{InMemoryPolicyStore, PolicyStore, ProgramPolicy};
use afterschool_core::clock::Clock;
use afterschool_core::context::Context;
use afterschool_core::handler::EventHandler;
use afterschool_core::publisher::Publisher;
use afterschool_core::retry::RetryPolicy;
use afterschool_event_bus::{Dispatcher, EventBus, HandlerRegistry, PubSub};
use afterschool_family::application::FamilyServices;
use afterschool_family::application::command_handlers::handle_add_child;
use afterschool_family::application::promotion::ChildDataAnonymizedPromotion;
use afterschool_family::application::subscribers as family_subscribers;
use afterschool_family::domain::commands::AddChild;
use afterschool_family::domain::records::{FamilyStore, InMemoryFamilyStore};
use afterschool_messaging::application::command_handlers::{
    handle_mark_conversation_read, handle_send_message,
};
use afterschool_messaging::application::projection::UnreadCountProjection;
use afterschool_messaging::application::realtime::RealtimeNotifier;
use afterschool_messaging::domain::commands::{MarkConversationRead, SendMessage};
use afterschool_messaging::domain::messages::{InMemoryMessageStore, MessageStore};
use afterschool_participation::application::ParticipationServices;
use afterschool_participation::application::command_handlers::{
    handle_record_attendance, handle_record_behavioral_note,
};
use afterschool_participation::application::subscribers as participation_subscribers;
use afterschool_participation::domain::commands::{RecordAttendance, RecordBehavioralNote};
use afterschool_participation::domain::records::{InMemoryParticipationStore, ParticipationStore};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::AppError;

/// The storage of every context.
#[derive(Clone)]
pub struct Stores {
    /// Accounts.
    pub users: Arc<dyn UserStore>,
    /// Family.
    pub family: Arc<dyn FamilyStore>,
    /// Participation.
    pub participation: Arc<dyn ParticipationStore>,
    /// Messaging.
    pub messages: Arc<dyn MessageStore>,
    /// Catalog.
    pub policies: Arc<dyn PolicyStore>,
}

impl Default for Stores {
    fn default() -> Self {
        Self {
            users: Arc::new(InMemoryUserStore::new()),
            family: Arc::new(InMemoryFamilyStore::new()),
            participation: Arc::new(InMemoryParticipationStore::new()),
            messages: Arc::new(InMemoryMessageStore::new()),
            policies: Arc::new(InMemoryPolicyStore::new()),
        }
    }
}

/// The static `(context, handler)` registrations of the event bus.
#[must_use]
pub fn registrations(
    publisher: &Arc<dyn Publisher>,
    clock: &Arc<dyn Clock>,
) -> Vec<(Context, Arc<dyn EventHandler>)> {
    let accounts = AccountsPromotion::new(Arc::clone(publisher), Arc::clone(clock));
    let family = ChildDataAnonymizedPromotion::new(Arc::clone(publisher), Arc::clone(clock));
    let realtime = RealtimeNotifier::new(Arc::clone(publisher));

    vec![
        (Context::Accounts, Arc::new(accounts) as Arc<dyn EventHandler>),
        (Context::Family, Arc::new(family) as Arc<dyn EventHandler>),
        (Context::Messaging, Arc::new(realtime) as Arc<dyn EventHandler>),
        (Context::Catalog, Arc::new(SearchIndexHook) as Arc<dyn EventHandler>),
    ]
}

/// Every context wired onto one bus and one in-process transport.
pub struct Platform {
    config: AppConfig,
    clock: Arc<dyn Clock>,
    stores: Stores,
    pubsub: PubSub,
    dispatcher: Dispatcher,
    family: FamilyServices,
    participation: ParticipationServices,
    unread: Arc<UnreadCountProjection>,
}

impl Platform {
    /// Builds the bus, starts the cross-context subscribers and bootstraps
    /// the unread counters.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Event` if a subscription fails, or
    /// `AppError::Domain` if the unread counters cannot be bootstrapped.
    pub async fn start(
        config: AppConfig,
        stores: Stores,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AppError> {
        let pubsub = PubSub::new();
        let publisher: Arc<dyn Publisher> = Arc::new(pubsub.clone());
        let bus = EventBus::new(HandlerRegistry::new(registrations(&publisher, &clock)));
        let retry = RetryPolicy::new(config.retry_delay);

        let family = FamilyServices {
            store: Arc::clone(&stores.family),
            bus: bus.clone(),
            clock: Arc::clone(&clock),
            retry,
        };
        family_subscribers::start(&pubsub, &family)?;

        let participation = ParticipationServices {
            store: Arc::clone(&stores.participation),
            clock: Arc::clone(&clock),
            retry,
        };
        participation_subscribers::start(&pubsub, &participation)?;

        let unread = Arc::new(UnreadCountProjection::new());
        unread.bootstrap(stores.messages.as_ref()).await?;

        info!(
            handlers = bus.registry().len(),
            retry_delay_ms = u64::try_from(config.retry_delay.as_millis()).unwrap_or(u64::MAX),
            "platform started"
        );

        Ok(Self {
            config,
            clock,
            stores,
            pubsub,
            dispatcher: Dispatcher::new(bus),
            family,
            participation,
            unread,
        })
    }

    /// The storage of every context.
    #[must_use]
    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    /// The shared transport.
    #[must_use]
    pub fn pubsub(&self) -> &PubSub {
        &self.pubsub
    }

    /// The unread-count projection.
    #[must_use]
    pub fn unread_counts(&self) -> &Arc<UnreadCountProjection> {
        &self.unread
    }

    /// Waits until every cascade started so far has run to completion.
    pub async fn settle(&self) {
        self.pubsub.drained().await;
    }

    /// Registers a user; Family provisions the parent profile downstream.
    ///
    /// # Errors
    ///
    /// Returns the Accounts validation or storage error.
    pub async fn register_user(
        &self,
        command: &RegisterUser,
    ) -> Result<AccountsCommandResult, AppError> {
        Ok(handle_register_user(
            command,
            self.clock.as_ref(),
            self.stores.users.as_ref(),
            &self.dispatcher,
        )
        .await?)
    }

    /// Deletes an account's personal data and starts the GDPR cascade.
    ///
    /// Returns once Accounts has redacted its own data; downstream contexts
    /// finish asynchronously.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the user does not exist.
    #[instrument(skip_all, fields(user_id = %command.user_id))]
    pub async fn delete_account(
        &self,
        command: &AnonymizeUser,
    ) -> Result<AccountsCommandResult, AppError> {
        let result = handle_anonymize_user(
            command,
            self.clock.as_ref(),
            self.stores.users.as_ref(),
            &self.dispatcher,
        )
        .await?;
        info!("account deletion started");
        Ok(result)
    }

    /// Adds a child under a parent profile.
    ///
    /// # Errors
    ///
    /// Returns the Family validation or storage error.
    pub async fn add_child(&self, command: &AddChild) -> Result<Uuid, AppError> {
        Ok(handle_add_child(command, &self.family).await?)
    }

    /// Records a behavioral note.
    ///
    /// # Errors
    ///
    /// Returns the Participation validation or storage error.
    pub async fn record_behavioral_note(
        &self,
        command: &RecordBehavioralNote,
    ) -> Result<Uuid, AppError> {
        Ok(handle_record_behavioral_note(command, &self.participation).await?)
    }

    /// Records attendance.
    ///
    /// # Errors
    ///
    /// Returns the Participation storage error.
    pub async fn record_attendance(&self, command: &RecordAttendance) -> Result<Uuid, AppError> {
        Ok(handle_record_attendance(command, &self.participation).await?)
    }

    /// Sends a message.
    ///
    /// # Errors
    ///
    /// Returns the Messaging validation or storage error.
    pub async fn send_message(&self, command: &SendMessage) -> Result<Uuid, AppError> {
        Ok(handle_send_message(
            command,
            self.clock.as_ref(),
            self.stores.messages.as_ref(),
            &self.dispatcher,
        )
        .await?)
    }

    /// Marks a conversation read.
    ///
    /// # Errors
    ///
    /// Returns the Messaging storage error.
    pub async fn mark_conversation_read(
        &self,
        command: &MarkConversationRead,
    ) -> Result<Vec<Uuid>, AppError> {
        Ok(handle_mark_conversation_read(
            command,
            self.clock.as_ref(),
            self.stores.messages.as_ref(),
            &self.dispatcher,
        )
        .await?)
    }

    /// Starts live unread counting for a user, e.g. when they connect.
    ///
    /// # Errors
    ///
    /// Returns `EventError::TransportClosed` after shutdown.
    pub fn watch_unread(&self, user_id: Uuid) -> Result<bool, AppError> {
        Ok(self.unread.watch_user(user_id, &self.pubsub)?)
    }

    /// Updates a program's booking policy.
    ///
    /// # Errors
    ///
    /// Returns the Catalog validation or storage error.
    pub async fn update_program_policy(
        &self,
        command: &UpdateProgramPolicy,
    ) -> Result<ProgramPolicy, AppError> {
        Ok(handle_update_program_policy(
            command,
            self.clock.as_ref(),
            self.stores.policies.as_ref(),
            &self.dispatcher,
        )
        .await?)
    }

    /// Waits up to the configured drain timeout for in-flight deliveries,
    /// then closes the transport.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ShutdownTimeout` if deliveries were still running;
    /// the transport is closed either way.
    pub async fn shutdown(self) -> Result<(), AppError> {
        let drained =
            tokio::time::timeout(self.config.drain_timeout, self.pubsub.drained()).await;
        self.pubsub.close();
        match drained {
            Ok(()) => {
                info!("platform stopped");
                Ok(())
            }
            Err(_) => {
                warn!(in_flight = self.pubsub.in_flight(), "shutdown drain timed out");
                Err(AppError::ShutdownTimeout(self.config.drain_timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use afterschool_core::event::EventType;
    use afterschool_test_support::{FixedClock, RecordingPublisher, RecordingSubscriber};

    use super::*;

    #[test]
    fn test_each_context_has_its_registered_handler() {
        // Arrange
        let publisher: Arc<dyn Publisher> = Arc::new(RecordingPublisher::new());
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::default());

        // Act
        let registry = HandlerRegistry::new(registrations(&publisher, &clock));

        // Assert
        assert_eq!(registry.len(), 4);
        let names = |context, event_type| -> Vec<&'static str> {
            registry
                .handlers_for(context, event_type)
                .iter()
                .map(|handler| handler.name())
                .collect()
        };
        assert_eq!(
            names(Context::Accounts, EventType::UserAnonymized),
            vec!["accounts.promotion"]
        );
        assert_eq!(
            names(Context::Family, EventType::ChildDataAnonymized),
            vec!["family.child_data_anonymized_promotion"]
        );
        assert_eq!(
            names(Context::Messaging, EventType::ConversationRead),
            vec!["messaging.realtime_notifier"]
        );
        assert_eq!(
            names(Context::Catalog, EventType::ProgramPolicyUpdated),
            vec!["catalog.search_index"]
        );
        assert!(names(Context::Participation, EventType::ChildDataAnonymized).is_empty());
    }

    #[tokio::test]
    async fn test_start_attaches_cross_context_subscribers() {
        let platform = Platform::start(
            AppConfig::default(),
            Stores::default(),
            Arc::new(FixedClock::default()),
        )
        .await
        .unwrap();

        let pubsub = platform.pubsub();

        assert_eq!(pubsub.subscriber_count("integration:accounts:user_registered"), 1);
        assert_eq!(pubsub.subscriber_count("integration:accounts:user_anonymized"), 1);
        assert_eq!(pubsub.subscriber_count("integration:family:child_data_anonymized"), 1);
    }

    #[tokio::test]
    async fn test_shutdown_closes_transport() {
        let platform = Platform::start(
            AppConfig::default(),
            Stores::default(),
            Arc::new(FixedClock::default()),
        )
        .await
        .unwrap();
        let pubsub = platform.pubsub().clone();

        platform.shutdown().await.unwrap();

        assert_eq!(pubsub.subscriber_count("integration:accounts:user_registered"), 0);
        let late = Arc::new(RecordingSubscriber::new("late"));
        assert!(pubsub.subscribe("late", late).is_err());
    }
}

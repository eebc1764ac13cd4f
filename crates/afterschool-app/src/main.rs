//! Afterschool demo runner.
//!
//! Registers a parent with two children, records participation data, then
//! deletes the account and reports what the GDPR cascade redacted.

use std::error::Error;
use std::sync::Arc;

use afterschool_accounts::domain::commands::{AnonymizeUser, RegisterUser};
use afterschool_app::config::AppConfig;
use afterschool_app::platform::{Platform, Stores};
use afterschool_app::telemetry;
use afterschool_core::clock::SystemClock;
use afterschool_family::domain::commands::AddChild;
use afterschool_family::domain::records::FamilyStore;
use afterschool_participation::domain::commands::RecordBehavioralNote;
use afterschool_participation::domain::records::ParticipationStore;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    telemetry::init()?;
    let config = AppConfig::from_env()?;
    tracing::info!(?config, "Starting Afterschool event choreography demo");

    let platform = Platform::start(config, Stores::default(), Arc::new(SystemClock)).await?;

    let registered = platform
        .register_user(&RegisterUser {
            correlation_id: Uuid::new_v4(),
            display_name: "Jordan Alvarez".to_owned(),
            email: "jordan@example.com".to_owned(),
        })
        .await?;
    let parent_id = registered.user_id;
    platform.settle().await;

    let staff_id = Uuid::new_v4();
    for first_name in ["Ava", "Leo"] {
        let child_id = platform
            .add_child(&AddChild {
                correlation_id: Uuid::new_v4(),
                parent_id,
                first_name: first_name.to_owned(),
                medical_notes: Some("carries an epipen".to_owned()),
            })
            .await?;
        platform
            .record_behavioral_note(&RecordBehavioralNote {
                correlation_id: Uuid::new_v4(),
                child_id,
                author_id: staff_id,
                note: format!("{first_name} settled in quickly"),
            })
            .await?;
    }

    platform
        .delete_account(&AnonymizeUser {
            correlation_id: Uuid::new_v4(),
            user_id: parent_id,
            requested_by: Some(parent_id),
        })
        .await?;
    platform.settle().await;

    let stores = platform.stores();
    let profile = stores.family.parent_profile(parent_id).await?;
    for child in stores.family.children_of(parent_id).await? {
        let notes = stores.participation.notes_for(child.id).await?;
        tracing::info!(
            child_id = %child.id,
            child_redacted = child.anonymized,
            notes_redacted = notes.iter().filter(|note| note.redacted).count(),
            "child cascade result"
        );
    }
    tracing::info!(
        %parent_id,
        parent_redacted = profile.anonymized,
        "GDPR cascade finished"
    );

    platform.shutdown().await?;
    Ok(())
}

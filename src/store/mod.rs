#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

mod memory;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::CrmDb;
use crate::error::Result;
use crate::types::{
    DashboardStats, Feature, FeatureInput, FeatureQuery, KnowledgeNote, NewPartner, NewPerson,
    NewReminder, NewUser, NoteInput, NoteQuery, Page, Partner, PartnerPatch, PartnerQuery,
    PeopleQuery, Person, PersonPatch, Reminder, UserAccount,
};

pub use memory::MemoryStore;

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Partner records and their lifecycle rules.
///
/// Both write paths run the `lifecycle` planner inside the store's own unit
/// of work, so a rejected transition never writes anything.
pub trait PartnerRepository {
    fn list_partners(&self, query: PartnerQuery) -> StoreFuture<'_, Page<Partner>>;

    /// Partners on the board (`ONBOARDING` or `MAINTENANCE`), newest first.
    fn list_kanban_partners(&self) -> StoreFuture<'_, Vec<Partner>>;

    fn get_partner(&self, id: Uuid) -> StoreFuture<'_, Option<Partner>>;

    /// # Errors
    /// `CrmError::Guardrail` when created straight into `READY_FOR_DEPLOY`
    /// without every approval.
    fn create_partner(&self, new_partner: NewPartner) -> StoreFuture<'_, Partner>;

    /// Load, plan, merge. Fails with `CrmError::NotFound` for an unknown id
    /// and `CrmError::Guardrail` for a refused stage entry.
    fn update_partner(&self, id: Uuid, patch: PartnerPatch) -> StoreFuture<'_, Partner>;

    fn delete_partner(&self, id: Uuid) -> StoreFuture<'_, bool>;
}

pub trait PeopleRepository {
    fn list_people(&self, query: PeopleQuery) -> StoreFuture<'_, Page<Person>>;
    fn get_person(&self, id: Uuid) -> StoreFuture<'_, Option<Person>>;
    fn create_person(&self, person: NewPerson) -> StoreFuture<'_, Person>;
    fn update_person(&self, id: Uuid, patch: PersonPatch) -> StoreFuture<'_, Person>;
    fn delete_person(&self, id: Uuid) -> StoreFuture<'_, bool>;
}

pub trait KnowledgeRepository {
    fn list_notes(&self, query: NoteQuery) -> StoreFuture<'_, Page<KnowledgeNote>>;
    fn get_note(&self, id: Uuid) -> StoreFuture<'_, Option<KnowledgeNote>>;
    fn create_note(&self, note: NoteInput) -> StoreFuture<'_, KnowledgeNote>;
    fn replace_note(&self, id: Uuid, note: NoteInput) -> StoreFuture<'_, KnowledgeNote>;
    fn delete_note(&self, id: Uuid) -> StoreFuture<'_, bool>;
}

pub trait ReminderRepository {
    /// `Some(now)` keeps only reminders due at `now` and not completed.
    fn list_reminders(&self, active_at: Option<DateTime<Utc>>) -> StoreFuture<'_, Vec<Reminder>>;
    fn create_reminder(&self, reminder: NewReminder) -> StoreFuture<'_, Reminder>;
    fn set_reminder_completed(&self, id: Uuid, completed: bool) -> StoreFuture<'_, Reminder>;
    fn delete_reminder(&self, id: Uuid) -> StoreFuture<'_, bool>;
}

pub trait FeatureRepository {
    fn list_features(&self, query: FeatureQuery) -> StoreFuture<'_, Page<Feature>>;
    fn get_feature(&self, id: Uuid) -> StoreFuture<'_, Option<Feature>>;
    fn create_feature(&self, feature: FeatureInput) -> StoreFuture<'_, Feature>;
    fn replace_feature(&self, id: Uuid, feature: FeatureInput) -> StoreFuture<'_, Feature>;
    fn delete_feature(&self, id: Uuid) -> StoreFuture<'_, bool>;
}

pub trait DashboardQueries {
    fn dashboard_stats(&self) -> StoreFuture<'_, DashboardStats>;
}

pub trait UserRepository {
    fn find_user_by_email<'a>(&'a self, email: &'a str)
        -> StoreFuture<'a, Option<UserAccount>>;

    /// The first account ever created is an approved `ADMIN`; later ones are
    /// unapproved `USER`s. Fails with `CrmError::Exists` on a taken email.
    fn create_user(&self, user: NewUser) -> StoreFuture<'_, UserAccount>;
}

pub trait CrmStore:
    PartnerRepository
    + PeopleRepository
    + KnowledgeRepository
    + ReminderRepository
    + FeatureRepository
    + DashboardQueries
    + UserRepository
    + Send
    + Sync
{
    fn backend_label(&self) -> &'static str;
}

pub type SharedStore = Arc<dyn CrmStore>;

/// Storage backend configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    /// Keep every record in process memory only.
    Memory,
    /// Persist in PostgreSQL.
    Postgres {
        database_url: String,
        max_connections: u32,
        init_schema: bool,
    },
}

impl StorageConfig {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Postgres { .. } => "postgres",
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Memory
    }
}

/// # Errors
/// Returns an error when the Postgres pool cannot connect or the schema
/// cannot be applied.
pub async fn open_store(config: StorageConfig) -> Result<SharedStore> {
    match config {
        StorageConfig::Memory => Ok(Arc::new(MemoryStore::new())),
        StorageConfig::Postgres {
            database_url,
            max_connections,
            init_schema,
        } => {
            let db = CrmDb::connect(&database_url, max_connections).await?;
            if init_schema {
                db.initialize_schema().await?;
            }
            Ok(Arc::new(db))
        }
    }
}

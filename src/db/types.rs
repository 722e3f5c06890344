use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(FromRow)]
pub(crate) struct PartnerRow {
    pub(crate) id: Uuid,
    pub(crate) name: String,
    pub(crate) code: String,
    pub(crate) status: String,
    pub(crate) kanban_stage: Option<String>,
    pub(crate) doc_sit: Option<String>,
    pub(crate) doc_reconcile: Option<String>,
    pub(crate) doc_devsite: Option<String>,
    pub(crate) integrator: Option<String>,
    pub(crate) notes: Option<String>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
pub(crate) struct PersonRow {
    pub(crate) id: Uuid,
    pub(crate) name: String,
    pub(crate) email: Option<String>,
    pub(crate) phone: Option<String>,
    pub(crate) role: String,
    pub(crate) notes: Option<String>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

/// One `(person, linked record)` pair from a link table joined to its target.
#[derive(FromRow)]
pub(crate) struct PersonLinkRow {
    pub(crate) person_id: Uuid,
    pub(crate) id: Uuid,
    pub(crate) name: String,
}

#[derive(FromRow)]
pub(crate) struct KnowledgeNoteRow {
    pub(crate) id: Uuid,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) tags: Vec<String>,
    pub(crate) is_pinned: bool,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
pub(crate) struct ReminderRow {
    pub(crate) id: Uuid,
    pub(crate) title: String,
    pub(crate) scheduled_at: DateTime<Utc>,
    pub(crate) level: String,
    pub(crate) is_completed: bool,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
pub(crate) struct FeatureRow {
    pub(crate) id: Uuid,
    pub(crate) name: String,
    pub(crate) category: String,
    pub(crate) apigee_products: Vec<String>,
    pub(crate) apigee_trace_proxies: Vec<String>,
    pub(crate) notes: Option<String>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
pub(crate) struct UserRow {
    pub(crate) id: Uuid,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) password_hash: String,
    pub(crate) role: String,
    pub(crate) is_approved: bool,
    pub(crate) created_at: DateTime<Utc>,
}

#[derive(FromRow)]
pub(crate) struct CountByKeyRow {
    pub(crate) key: String,
    pub(crate) count: i64,
}

pub(crate) const PARTNER_COLUMNS: &str = "id, name, code, status, kanban_stage, doc_sit, \
     doc_reconcile, doc_devsite, integrator, notes, created_at, updated_at";

pub(crate) const FEATURE_COLUMNS: &str =
    "id, name, category, apigee_products, apigee_trace_proxies, notes, created_at, updated_at";

pub(crate) const NOTE_COLUMNS: &str = "id, title, content, tags, is_pinned, created_at, updated_at";

pub(crate) const REMINDER_COLUMNS: &str =
    "id, title, scheduled_at, level, is_completed, created_at, updated_at";

pub(crate) const PERSON_COLUMNS: &str =
    "id, name, email, phone, role, notes, created_at, updated_at";

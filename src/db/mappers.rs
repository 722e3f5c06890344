use std::collections::HashMap;

use uuid::Uuid;

use super::types::{
    FeatureRow, KnowledgeNoteRow, PartnerRow, PersonLinkRow, PersonRow, ReminderRow, UserRow,
};
use crate::error::{CrmError, Result};
use crate::types::{
    ApprovalStatus, Feature, FeatureCategory, KanbanStage, KnowledgeNote, LinkedRef, Partner,
    PartnerDocStatus, PartnerStatus, Person, Reminder, ReminderLevel, UserAccount, UserRole,
};

fn parse_column<'a, T>(
    value: &'a str,
    parse: impl FnOnce(&'a str) -> std::result::Result<T, String>,
) -> Result<T> {
    parse(value).map_err(CrmError::DatabaseError)
}

fn parse_doc_status(
    sit: Option<&str>,
    reconcile: Option<&str>,
    devsite: Option<&str>,
) -> Result<Option<PartnerDocStatus>> {
    match (sit, reconcile, devsite) {
        (Some(sit), Some(reconcile), Some(devsite)) => Ok(Some(PartnerDocStatus {
            sit: parse_column(sit, ApprovalStatus::try_from)?,
            reconcile: parse_column(reconcile, ApprovalStatus::try_from)?,
            devsite: parse_column(devsite, ApprovalStatus::try_from)?,
        })),
        (None, None, None) => Ok(None),
        _ => Err(CrmError::DatabaseError(
            "Partner document status is partially populated".to_string(),
        )),
    }
}

/// Splits a document status into its three nullable columns.
pub(crate) fn doc_status_columns(
    doc_status: Option<&PartnerDocStatus>,
) -> (Option<&'static str>, Option<&'static str>, Option<&'static str>) {
    doc_status.map_or((None, None, None), |docs| {
        (
            Some(docs.sit.as_str()),
            Some(docs.reconcile.as_str()),
            Some(docs.devsite.as_str()),
        )
    })
}

pub(crate) fn parse_partner(row: PartnerRow) -> Result<Partner> {
    Ok(Partner {
        id: row.id,
        status: parse_column(&row.status, PartnerStatus::try_from)?,
        kanban_stage: row
            .kanban_stage
            .as_deref()
            .map(|stage| parse_column(stage, KanbanStage::try_from))
            .transpose()?,
        doc_status: parse_doc_status(
            row.doc_sit.as_deref(),
            row.doc_reconcile.as_deref(),
            row.doc_devsite.as_deref(),
        )?,
        name: row.name,
        code: row.code,
        integrator: row.integrator,
        notes: row.notes,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// Groups link rows by person so a page of people can be hydrated with two
/// queries instead of two per person.
pub(crate) fn group_links(rows: Vec<PersonLinkRow>) -> HashMap<Uuid, Vec<LinkedRef>> {
    rows.into_iter().fold(HashMap::new(), |mut grouped, row| {
        grouped.entry(row.person_id).or_default().push(LinkedRef {
            id: row.id,
            name: row.name,
        });
        grouped
    })
}

pub(crate) fn parse_person(
    row: PersonRow,
    partners: &mut HashMap<Uuid, Vec<LinkedRef>>,
    features: &mut HashMap<Uuid, Vec<LinkedRef>>,
) -> Person {
    Person {
        partners: partners.remove(&row.id).unwrap_or_default(),
        features: features.remove(&row.id).unwrap_or_default(),
        id: row.id,
        name: row.name,
        email: row.email,
        phone: row.phone,
        role: row.role,
        notes: row.notes,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

pub(crate) fn parse_note(row: KnowledgeNoteRow) -> KnowledgeNote {
    KnowledgeNote {
        id: row.id,
        title: row.title,
        content: row.content,
        tags: row.tags,
        is_pinned: row.is_pinned,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

pub(crate) fn parse_reminder(row: ReminderRow) -> Result<Reminder> {
    Ok(Reminder {
        id: row.id,
        title: row.title,
        scheduled_at: row.scheduled_at,
        level: parse_column(&row.level, ReminderLevel::try_from)?,
        is_completed: row.is_completed,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

pub(crate) fn parse_feature(row: FeatureRow) -> Result<Feature> {
    Ok(Feature {
        id: row.id,
        name: row.name,
        category: parse_column(&row.category, FeatureCategory::try_from)?,
        apigee_products: row.apigee_products,
        apigee_trace_proxies: row.apigee_trace_proxies,
        notes: row.notes,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

pub(crate) fn parse_user(row: UserRow) -> Result<UserAccount> {
    Ok(UserAccount {
        id: row.id,
        role: parse_column(&row.role, UserRole::try_from)?,
        name: row.name,
        email: row.email,
        password_hash: row.password_hash,
        is_approved: row.is_approved,
        created_at: row.created_at,
    })
}

pub(crate) fn count_to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

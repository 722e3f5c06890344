#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use chrono::Utc;
use sqlx::{Acquire, PgConnection};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::mappers::{count_to_u64, doc_status_columns, parse_partner};
use super::types::{PartnerRow, PARTNER_COLUMNS};
use crate::db::CrmDb;
use crate::error::{CrmError, Result};
use crate::lifecycle::{plan_partner_create, plan_partner_update};
use crate::types::{NewPartner, Page, Partner, PartnerPatch, PartnerQuery, PartnerStatus};

/// `%term%` with LIKE wildcards in the term escaped.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

pub(crate) fn search_term(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(like_pattern)
}

const PARTNER_FILTER: &str = "WHERE ($1::text IS NULL OR status = $1)
       AND ($2::text IS NULL
            OR name ILIKE $2
            OR code ILIKE $2
            OR COALESCE(integrator, '') ILIKE $2)";

async fn write_partner(conn: &mut PgConnection, partner: &Partner) -> Result<()> {
    let (doc_sit, doc_reconcile, doc_devsite) = doc_status_columns(partner.doc_status.as_ref());
    sqlx::query(
        "UPDATE partners
         SET name = $2, code = $3, status = $4, kanban_stage = $5,
             doc_sit = $6, doc_reconcile = $7, doc_devsite = $8,
             integrator = $9, notes = $10, updated_at = $11
         WHERE id = $1",
    )
    .bind(partner.id)
    .bind(&partner.name)
    .bind(&partner.code)
    .bind(partner.status.as_str())
    .bind(partner.kanban_stage.map(|stage| stage.as_str()))
    .bind(doc_sit)
    .bind(doc_reconcile)
    .bind(doc_devsite)
    .bind(&partner.integrator)
    .bind(&partner.notes)
    .bind(partner.updated_at)
    .execute(conn)
    .await
    .map(|_| ())
    .map_err(|e| CrmError::DatabaseError(format!("Failed to update partner: {e}")))
}

impl CrmDb {
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn fetch_partner_page(&self, query: &PartnerQuery) -> Result<Page<Partner>> {
        let status = query.status.map(|status| status.as_str());
        let search = search_term(query.search.as_deref());

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM partners {PARTNER_FILTER}"
        ))
        .bind(status)
        .bind(search.as_deref())
        .fetch_one(self.pool())
        .await
        .map_err(|e| CrmError::DatabaseError(format!("Failed to count partners: {e}")))?;

        let rows = sqlx::query_as::<_, PartnerRow>(&format!(
            "SELECT {PARTNER_COLUMNS} FROM partners {PARTNER_FILTER}
             ORDER BY {} {}, id
             LIMIT $3 OFFSET $4",
            query.sort_by.column(),
            query.order.as_sql(),
        ))
        .bind(status)
        .bind(search.as_deref())
        .bind(i64::from(query.page.limit()))
        .bind(i64::try_from(query.page.offset()).unwrap_or(i64::MAX))
        .fetch_all(self.pool())
        .await
        .map_err(|e| CrmError::DatabaseError(format!("Failed to list partners: {e}")))?;

        let partners = rows.into_iter().map(parse_partner).collect::<Result<Vec<_>>>()?;
        Ok(Page::new(partners, count_to_u64(total), query.page))
    }

    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn fetch_kanban_partners(&self) -> Result<Vec<Partner>> {
        sqlx::query_as::<_, PartnerRow>(&format!(
            "SELECT {PARTNER_COLUMNS} FROM partners
             WHERE status IN ($1, $2)
             ORDER BY updated_at DESC, id"
        ))
        .bind(PartnerStatus::Onboarding.as_str())
        .bind(PartnerStatus::Maintenance.as_str())
        .fetch_all(self.pool())
        .await
        .map_err(|e| CrmError::DatabaseError(format!("Failed to load kanban partners: {e}")))?
        .into_iter()
        .map(parse_partner)
        .collect()
    }

    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn fetch_partner(&self, id: Uuid) -> Result<Option<Partner>> {
        sqlx::query_as::<_, PartnerRow>(&format!(
            "SELECT {PARTNER_COLUMNS} FROM partners WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| CrmError::DatabaseError(format!("Failed to load partner {id}: {e}")))?
        .map(parse_partner)
        .transpose()
    }

    /// # Errors
    /// Returns `CrmError::Guardrail` when the new record would sit in
    /// `READY_FOR_DEPLOY` without every approval.
    pub async fn insert_partner(&self, new_partner: NewPartner) -> Result<Partner> {
        let partner = plan_partner_create(new_partner)?.into_partner(Uuid::new_v4(), Utc::now());
        let (doc_sit, doc_reconcile, doc_devsite) = doc_status_columns(partner.doc_status.as_ref());

        sqlx::query(
            "INSERT INTO partners (id, name, code, status, kanban_stage, doc_sit, doc_reconcile,
                                   doc_devsite, integrator, notes, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)",
        )
        .bind(partner.id)
        .bind(&partner.name)
        .bind(&partner.code)
        .bind(partner.status.as_str())
        .bind(partner.kanban_stage.map(|stage| stage.as_str()))
        .bind(doc_sit)
        .bind(doc_reconcile)
        .bind(doc_devsite)
        .bind(&partner.integrator)
        .bind(&partner.notes)
        .bind(partner.created_at)
        .execute(self.pool())
        .await
        .map_err(|e| CrmError::DatabaseError(format!("Failed to create partner: {e}")))?;

        info!("Created partner {} ({})", partner.id, partner.code);
        Ok(partner)
    }

    /// Locks the row, plans the change against the locked state and writes
    /// the merged record in the same transaction.
    ///
    /// # Errors
    /// `CrmError::NotFound` for an unknown id, `CrmError::Guardrail` when the
    /// stage change is refused. Nothing is written in either case.
    pub async fn update_partner_guarded(&self, id: Uuid, patch: PartnerPatch) -> Result<Partner> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| CrmError::DatabaseError(format!("Failed to begin tx: {e}")))?;

        let conn = tx
            .acquire()
            .await
            .map_err(|e| CrmError::DatabaseError(format!("Failed to acquire tx conn: {e}")))?;

        let row = sqlx::query_as::<_, PartnerRow>(&format!(
            "SELECT {PARTNER_COLUMNS} FROM partners WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| CrmError::DatabaseError(format!("Failed to lock partner {id}: {e}")))?
        .ok_or_else(|| CrmError::not_found("Partner", id))?;

        let mut partner = parse_partner(row)?;
        let planned = plan_partner_update(&partner, patch).inspect_err(|violation| {
            warn!("Rejected stage change for partner {id}: {violation}");
        })?;
        partner.apply(planned, Utc::now());

        write_partner(&mut *conn, &partner).await?;

        tx.commit()
            .await
            .map_err(|e| CrmError::DatabaseError(format!("Failed to commit tx: {e}")))?;

        debug!(
            "Updated partner {id}: status={} stage={:?}",
            partner.status, partner.kanban_stage
        );
        Ok(partner)
    }

    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn delete_partner_row(&self, id: Uuid) -> Result<bool> {
        sqlx::query("DELETE FROM partners WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map(|result| result.rows_affected() > 0)
            .map_err(|e| CrmError::DatabaseError(format!("Failed to delete partner {id}: {e}")))
    }
}

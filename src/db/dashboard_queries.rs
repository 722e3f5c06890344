#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use futures_util::try_join;

use super::mappers::{count_to_u64, parse_note, parse_partner};
use super::types::{CountByKeyRow, KnowledgeNoteRow, PartnerRow, NOTE_COLUMNS, PARTNER_COLUMNS};
use crate::db::CrmDb;
use crate::error::{CrmError, Result};
use crate::types::{
    DashboardStats, FeatureCounts, KnowledgeCounts, PartnerCounts, PinnedNoteSummary,
    RecentPartner, DASHBOARD_LIST_LIMIT,
};

impl CrmDb {
    async fn count_by(&self, sql: &str, what: &str) -> Result<Vec<(String, u64)>> {
        sqlx::query_as::<_, CountByKeyRow>(sql)
            .fetch_all(self.pool())
            .await
            .map(|rows| {
                rows.into_iter()
                    .map(|row| (row.key, count_to_u64(row.count)))
                    .collect()
            })
            .map_err(|e| CrmError::DatabaseError(format!("Failed to count {what}: {e}")))
    }

    async fn knowledge_counts(&self) -> Result<KnowledgeCounts> {
        sqlx::query_as::<_, (i64, i64)>(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE is_pinned) FROM knowledge_notes",
        )
        .fetch_one(self.pool())
        .await
        .map(|(total, pinned)| KnowledgeCounts {
            total: count_to_u64(total),
            pinned: count_to_u64(pinned),
        })
        .map_err(|e| CrmError::DatabaseError(format!("Failed to count notes: {e}")))
    }

    async fn pinned_note_summaries(&self) -> Result<Vec<PinnedNoteSummary>> {
        sqlx::query_as::<_, KnowledgeNoteRow>(&format!(
            "SELECT {NOTE_COLUMNS} FROM knowledge_notes
             WHERE is_pinned
             ORDER BY updated_at DESC, id
             LIMIT {DASHBOARD_LIST_LIMIT}"
        ))
        .fetch_all(self.pool())
        .await
        .map(|rows| {
            rows.into_iter()
                .map(|row| PinnedNoteSummary::from(&parse_note(row)))
                .collect()
        })
        .map_err(|e| CrmError::DatabaseError(format!("Failed to load pinned notes: {e}")))
    }

    async fn recent_partners(&self) -> Result<Vec<RecentPartner>> {
        sqlx::query_as::<_, PartnerRow>(&format!(
            "SELECT {PARTNER_COLUMNS} FROM partners
             ORDER BY updated_at DESC, id
             LIMIT {DASHBOARD_LIST_LIMIT}"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(|e| CrmError::DatabaseError(format!("Failed to load recent partners: {e}")))?
        .into_iter()
        .map(|row| parse_partner(row).map(|partner| RecentPartner::from(&partner)))
        .collect()
    }

    /// Aggregates run concurrently on separate pool connections.
    ///
    /// # Errors
    /// Returns an error if any aggregate query fails.
    pub async fn fetch_dashboard_stats(&self) -> Result<DashboardStats> {
        let (by_status, by_category, knowledge, pinned_notes, recent_partners) = try_join!(
            self.count_by(
                "SELECT status AS key, COUNT(*) AS count FROM partners GROUP BY status",
                "partners",
            ),
            self.count_by(
                "SELECT category AS key, COUNT(*) AS count FROM features GROUP BY category",
                "features",
            ),
            self.knowledge_counts(),
            self.pinned_note_summaries(),
            self.recent_partners(),
        )?;

        let (partner_total, by_status) = DashboardStats::tally(by_status);
        let (feature_total, by_category) = DashboardStats::tally(by_category);

        Ok(DashboardStats {
            partners: PartnerCounts {
                total: partner_total,
                by_status,
            },
            features: FeatureCounts {
                total: feature_total,
                by_category,
            },
            knowledge,
            pinned_notes,
            recent_partners,
        })
    }
}

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use chrono::Utc;
use uuid::Uuid;

use super::mappers::{count_to_u64, parse_feature};
use super::partner_ops::search_term;
use super::types::{FeatureRow, FEATURE_COLUMNS};
use crate::db::CrmDb;
use crate::error::{CrmError, Result};
use crate::types::{Feature, FeatureInput, FeatureQuery, Page};

const FEATURE_FILTER: &str = "WHERE ($1::text IS NULL OR category = $1)
       AND ($2::text IS NULL OR name ILIKE $2)";

impl CrmDb {
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn fetch_feature_page(&self, query: &FeatureQuery) -> Result<Page<Feature>> {
        let category = query.category.map(|category| category.as_str());
        let search = search_term(query.search.as_deref());

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM features {FEATURE_FILTER}"
        ))
        .bind(category)
        .bind(search.as_deref())
        .fetch_one(self.pool())
        .await
        .map_err(|e| CrmError::DatabaseError(format!("Failed to count features: {e}")))?;

        let features = sqlx::query_as::<_, FeatureRow>(&format!(
            "SELECT {FEATURE_COLUMNS} FROM features {FEATURE_FILTER}
             ORDER BY updated_at DESC, id
             LIMIT $3 OFFSET $4"
        ))
        .bind(category)
        .bind(search.as_deref())
        .bind(i64::from(query.page.limit()))
        .bind(i64::try_from(query.page.offset()).unwrap_or(i64::MAX))
        .fetch_all(self.pool())
        .await
        .map_err(|e| CrmError::DatabaseError(format!("Failed to list features: {e}")))?
        .into_iter()
        .map(parse_feature)
        .collect::<Result<Vec<_>>>()?;

        Ok(Page::new(features, count_to_u64(total), query.page))
    }

    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn fetch_feature(&self, id: Uuid) -> Result<Option<Feature>> {
        sqlx::query_as::<_, FeatureRow>(&format!(
            "SELECT {FEATURE_COLUMNS} FROM features WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| CrmError::DatabaseError(format!("Failed to load feature {id}: {e}")))?
        .map(parse_feature)
        .transpose()
    }

    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn insert_feature(&self, feature: FeatureInput) -> Result<Feature> {
        let row = sqlx::query_as::<_, FeatureRow>(&format!(
            "INSERT INTO features (id, name, category, apigee_products, apigee_trace_proxies,
                                   notes, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
             RETURNING {FEATURE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&feature.name)
        .bind(feature.category.as_str())
        .bind(&feature.apigee_products)
        .bind(&feature.apigee_trace_proxies)
        .bind(&feature.notes)
        .bind(Utc::now())
        .fetch_one(self.pool())
        .await
        .map_err(|e| CrmError::DatabaseError(format!("Failed to create feature: {e}")))?;
        parse_feature(row)
    }

    /// # Errors
    /// `CrmError::NotFound` for an unknown id.
    pub async fn replace_feature_row(&self, id: Uuid, feature: FeatureInput) -> Result<Feature> {
        sqlx::query_as::<_, FeatureRow>(&format!(
            "UPDATE features
             SET name = $2, category = $3, apigee_products = $4,
                 apigee_trace_proxies = $5, notes = $6, updated_at = $7
             WHERE id = $1
             RETURNING {FEATURE_COLUMNS}"
        ))
        .bind(id)
        .bind(&feature.name)
        .bind(feature.category.as_str())
        .bind(&feature.apigee_products)
        .bind(&feature.apigee_trace_proxies)
        .bind(&feature.notes)
        .bind(Utc::now())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| CrmError::DatabaseError(format!("Failed to update feature {id}: {e}")))?
        .map_or_else(|| Err(CrmError::not_found("Feature", id)), parse_feature)
    }

    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn delete_feature_row(&self, id: Uuid) -> Result<bool> {
        sqlx::query("DELETE FROM features WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map(|result| result.rows_affected() > 0)
            .map_err(|e| CrmError::DatabaseError(format!("Failed to delete feature {id}: {e}")))
    }
}

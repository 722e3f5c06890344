use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{Partner, PartnerStatus, PinnedNoteSummary};

pub const DASHBOARD_LIST_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerCounts {
    pub total: u64,
    pub by_status: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureCounts {
    pub total: u64,
    pub by_category: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeCounts {
    pub total: u64,
    pub pinned: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentPartner {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub status: PartnerStatus,
    pub updated_at: DateTime<Utc>,
}

impl From<&Partner> for RecentPartner {
    fn from(partner: &Partner) -> Self {
        Self {
            id: partner.id,
            name: partner.name.clone(),
            code: partner.code.clone(),
            status: partner.status,
            updated_at: partner.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub partners: PartnerCounts,
    pub features: FeatureCounts,
    pub knowledge: KnowledgeCounts,
    pub pinned_notes: Vec<PinnedNoteSummary>,
    pub recent_partners: Vec<RecentPartner>,
}

impl DashboardStats {
    /// Builds the status/category tallies from `(key, count)` pairs.
    #[must_use]
    pub fn tally<I>(pairs: I) -> (u64, BTreeMap<String, u64>)
    where
        I: IntoIterator<Item = (String, u64)>,
    {
        let by_key: BTreeMap<String, u64> = pairs.into_iter().collect();
        (by_key.values().sum(), by_key)
    }
}

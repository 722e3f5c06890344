use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeatureCategory {
    Snap,
    NonSnap,
}

impl FeatureCategory {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Snap => "SNAP",
            Self::NonSnap => "NON_SNAP",
        }
    }
}

impl fmt::Display for FeatureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for FeatureCategory {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "SNAP" => Ok(Self::Snap),
            "NON_SNAP" => Ok(Self::NonSnap),
            _ => Err(format!("Unknown feature category: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub id: Uuid,
    pub name: String,
    pub category: FeatureCategory,
    pub apigee_products: Vec<String>,
    pub apigee_trace_proxies: Vec<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full feature body, used for both create and replace.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureInput {
    pub name: String,
    pub category: FeatureCategory,
    #[serde(default)]
    pub apigee_products: Vec<String>,
    #[serde(default)]
    pub apigee_trace_proxies: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureQuery {
    pub category: Option<FeatureCategory>,
    pub search: Option<String>,
    pub page: super::PageRequest,
}

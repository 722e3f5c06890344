use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartnerStatus {
    Draft,
    Onboarding,
    Live,
    Maintenance,
    Suspended,
}

impl PartnerStatus {
    pub const ALL: [Self; 5] = [
        Self::Draft,
        Self::Onboarding,
        Self::Live,
        Self::Maintenance,
        Self::Suspended,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Onboarding => "ONBOARDING",
            Self::Live => "LIVE",
            Self::Maintenance => "MAINTENANCE",
            Self::Suspended => "SUSPENDED",
        }
    }

    /// Kanban stages only mean something while a partner is on the board.
    #[must_use]
    pub const fn is_on_kanban(&self) -> bool {
        matches!(self, Self::Onboarding | Self::Maintenance)
    }
}

impl fmt::Display for PartnerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for PartnerStatus {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Unknown partner status: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KanbanStage {
    AwaitingKickoff,
    SandboxActive,
    SitVerification,
    RevisionPending,
    ReadyForDeploy,
}

impl KanbanStage {
    /// Board column order.
    pub const ALL: [Self; 5] = [
        Self::AwaitingKickoff,
        Self::SandboxActive,
        Self::SitVerification,
        Self::RevisionPending,
        Self::ReadyForDeploy,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingKickoff => "AWAITING_KICKOFF",
            Self::SandboxActive => "SANDBOX_ACTIVE",
            Self::SitVerification => "SIT_VERIFICATION",
            Self::RevisionPending => "REVISION_PENDING",
            Self::ReadyForDeploy => "READY_FOR_DEPLOY",
        }
    }

    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::AwaitingKickoff => "Awaiting Kickoff",
            Self::SandboxActive => "Sandbox Active",
            Self::SitVerification => "SIT Verification",
            Self::RevisionPending => "Revision Pending",
            Self::ReadyForDeploy => "Ready for Deploy",
        }
    }
}

impl fmt::Display for KanbanStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for KanbanStage {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| format!("Unknown kanban stage: {s}"))
    }
}

/// Review state of a single partner document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    #[default]
    Pending,
    InReview,
    NeedsRevision,
    Approved,
}

impl ApprovalStatus {
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::InReview,
        Self::NeedsRevision,
        Self::Approved,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InReview => "IN_REVIEW",
            Self::NeedsRevision => "NEEDS_REVISION",
            Self::Approved => "APPROVED",
        }
    }

    #[must_use]
    pub const fn is_approved(&self) -> bool {
        matches!(self, Self::Approved)
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ApprovalStatus {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Unknown approval status: {s}"))
    }
}

/// The three document sign-offs that gate `READY_FOR_DEPLOY`.
///
/// `Default` is the not-yet-started state: everything `PENDING`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PartnerDocStatus {
    pub sit: ApprovalStatus,
    pub reconcile: ApprovalStatus,
    pub devsite: ApprovalStatus,
}

impl PartnerDocStatus {
    #[must_use]
    pub const fn all_approved() -> Self {
        Self {
            sit: ApprovalStatus::Approved,
            reconcile: ApprovalStatus::Approved,
            devsite: ApprovalStatus::Approved,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partner {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub status: PartnerStatus,
    pub kanban_stage: Option<KanbanStage>,
    pub doc_status: Option<PartnerDocStatus>,
    pub integrator: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Partner {
    /// Merges every supplied patch field over the record. Absent fields are
    /// left untouched.
    pub fn apply(&mut self, patch: PartnerPatch, now: DateTime<Utc>) {
        let PartnerPatch {
            name,
            code,
            status,
            kanban_stage,
            doc_status,
            integrator,
            notes,
        } = patch;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(code) = code {
            self.code = code;
        }
        if let Some(status) = status {
            self.status = status;
        }
        if let Some(stage) = kanban_stage {
            self.kanban_stage = Some(stage);
        }
        if let Some(doc_status) = doc_status {
            self.doc_status = Some(doc_status);
        }
        if let Some(integrator) = integrator {
            self.integrator = Some(integrator);
        }
        if let Some(notes) = notes {
            self.notes = Some(notes);
        }
        self.updated_at = now;
    }
}

/// Optional body fields may be omitted but not sent as `null`.
fn reject_null<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer)?
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom("null is not allowed; omit the field instead"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewPartner {
    pub name: String,
    pub code: String,
    pub status: PartnerStatus,
    #[serde(default, deserialize_with = "reject_null")]
    pub kanban_stage: Option<KanbanStage>,
    #[serde(default, deserialize_with = "reject_null")]
    pub doc_status: Option<PartnerDocStatus>,
    #[serde(default, deserialize_with = "reject_null")]
    pub integrator: Option<String>,
    #[serde(default, deserialize_with = "reject_null")]
    pub notes: Option<String>,
}

impl NewPartner {
    #[must_use]
    pub fn into_partner(self, id: Uuid, now: DateTime<Utc>) -> Partner {
        Partner {
            id,
            name: self.name,
            code: self.code,
            status: self.status,
            kanban_stage: self.kanban_stage,
            doc_status: self.doc_status,
            integrator: self.integrator,
            notes: self.notes,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial partner update: only the supplied fields change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PartnerPatch {
    #[serde(
        default,
        deserialize_with = "reject_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "reject_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub code: Option<String>,
    #[serde(
        default,
        deserialize_with = "reject_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<PartnerStatus>,
    #[serde(
        default,
        deserialize_with = "reject_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub kanban_stage: Option<KanbanStage>,
    #[serde(
        default,
        deserialize_with = "reject_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub doc_status: Option<PartnerDocStatus>,
    #[serde(
        default,
        deserialize_with = "reject_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub integrator: Option<String>,
    #[serde(
        default,
        deserialize_with = "reject_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartnerSortField {
    Name,
    Code,
    Status,
    CreatedAt,
    #[default]
    UpdatedAt,
}

impl PartnerSortField {
    #[must_use]
    pub const fn column(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Code => "code",
            Self::Status => "status",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }
}

impl TryFrom<&str> for PartnerSortField {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "name" => Ok(Self::Name),
            "code" => Ok(Self::Code),
            "status" => Ok(Self::Status),
            "createdAt" => Ok(Self::CreatedAt),
            "updatedAt" => Ok(Self::UpdatedAt),
            other => Err(format!(
                "invalid sortBy '{other}'; expected one of: name, code, status, createdAt, updatedAt"
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartnerQuery {
    pub status: Option<PartnerStatus>,
    pub search: Option<String>,
    pub sort_by: PartnerSortField,
    pub order: super::SortOrder,
    pub page: super::PageRequest,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_wire_names_when_parsing_enums_then_every_variant_round_trips() {
        for status in PartnerStatus::ALL {
            assert_eq!(PartnerStatus::try_from(status.as_str()), Ok(status));
        }
        for stage in KanbanStage::ALL {
            assert_eq!(KanbanStage::try_from(stage.as_str()), Ok(stage));
        }
        for approval in ApprovalStatus::ALL {
            assert_eq!(ApprovalStatus::try_from(approval.as_str()), Ok(approval));
        }
        assert!(KanbanStage::try_from("ready_for_deploy").is_err());
    }

    #[test]
    fn given_partner_json_when_serialized_then_wire_format_is_camel_case() {
        let now = Utc::now();
        let partner = NewPartner {
            name: "Acme".to_string(),
            code: "ACM".to_string(),
            status: PartnerStatus::Onboarding,
            kanban_stage: Some(KanbanStage::SitVerification),
            doc_status: Some(PartnerDocStatus::default()),
            integrator: None,
            notes: None,
        }
        .into_partner(Uuid::nil(), now);

        let value = serde_json::to_value(&partner).unwrap_or_default();
        assert_eq!(value["kanbanStage"], "SIT_VERIFICATION");
        assert_eq!(value["docStatus"]["reconcile"], "PENDING");
        assert_eq!(value["status"], "ONBOARDING");
        assert!(value.get("updatedAt").is_some());
    }

    #[test]
    fn given_patch_with_unknown_field_when_deserializing_then_it_is_rejected() {
        let parsed = serde_json::from_value::<PartnerPatch>(serde_json::json!({
            "kanbanStage": "READY_FOR_DEPLOY",
            "stage": "oops"
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn given_explicit_null_when_deserializing_bodies_then_it_is_rejected() {
        let patch = serde_json::from_value::<PartnerPatch>(serde_json::json!({
            "kanbanStage": null
        }));
        assert!(patch.is_err());
        let patch = serde_json::from_value::<PartnerPatch>(serde_json::json!({
            "docStatus": null
        }));
        assert!(patch.is_err());
        let created = serde_json::from_value::<NewPartner>(serde_json::json!({
            "name": "Acme", "code": "ACM", "status": "DRAFT", "integrator": null
        }));
        assert!(created.is_err());

        let omitted = serde_json::from_value::<PartnerPatch>(serde_json::json!({
            "notes": "kickoff booked"
        }));
        assert!(matches!(omitted, Ok(p) if p.kanban_stage.is_none() && p.doc_status.is_none()));
    }

    #[test]
    fn given_partial_patch_when_applied_then_absent_fields_are_untouched() {
        let created = Utc::now();
        let mut partner = NewPartner {
            name: "Acme".to_string(),
            code: "ACM".to_string(),
            status: PartnerStatus::Draft,
            kanban_stage: None,
            doc_status: None,
            integrator: Some("Globex".to_string()),
            notes: Some("first call booked".to_string()),
        }
        .into_partner(Uuid::new_v4(), created);

        let later = created + chrono::Duration::seconds(5);
        partner.apply(
            PartnerPatch {
                notes: Some("kickoff done".to_string()),
                ..PartnerPatch::default()
            },
            later,
        );

        assert_eq!(partner.name, "Acme");
        assert_eq!(partner.integrator.as_deref(), Some("Globex"));
        assert_eq!(partner.notes.as_deref(), Some("kickoff done"));
        assert_eq!(partner.status, PartnerStatus::Draft);
        assert_eq!(partner.created_at, created);
        assert_eq!(partner.updated_at, later);
    }

    #[test]
    fn given_sort_field_names_when_parsing_then_only_whitelisted_columns_are_accepted() {
        assert_eq!(
            PartnerSortField::try_from("createdAt"),
            Ok(PartnerSortField::CreatedAt)
        );
        assert!(PartnerSortField::try_from("password_hash").is_err());
        assert_eq!(PartnerSortField::default().column(), "updated_at");
    }
}

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::types::{ApprovalStatus, PartnerDocStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocApprovalKind {
    Sit,
    Reconcile,
    Devsite,
}

impl DocApprovalKind {
    pub const ALL: [Self; 3] = [Self::Sit, Self::Reconcile, Self::Devsite];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sit => "sit",
            Self::Reconcile => "reconcile",
            Self::Devsite => "devsite",
        }
    }

    #[must_use]
    pub const fn read(&self, doc_status: &PartnerDocStatus) -> ApprovalStatus {
        match self {
            Self::Sit => doc_status.sit,
            Self::Reconcile => doc_status.reconcile,
            Self::Devsite => doc_status.devsite,
        }
    }
}

impl fmt::Display for DocApprovalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry into `READY_FOR_DEPLOY` refused; lists every approval still missing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot move to Ready for Deploy: missing required document approvals ({})", join_kinds(.missing))]
pub struct GuardrailViolation {
    missing: Vec<DocApprovalKind>,
}

impl GuardrailViolation {
    #[must_use]
    pub const fn new(missing: Vec<DocApprovalKind>) -> Self {
        Self { missing }
    }

    #[must_use]
    pub fn missing(&self) -> &[DocApprovalKind] {
        &self.missing
    }
}

fn join_kinds(kinds: &[DocApprovalKind]) -> String {
    kinds
        .iter()
        .map(DocApprovalKind::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Approvals that are not `APPROVED`. An absent doc status counts as the
/// all-`PENDING` default.
#[must_use]
pub fn missing_approvals(doc_status: Option<&PartnerDocStatus>) -> Vec<DocApprovalKind> {
    let effective = doc_status.copied().unwrap_or_default();
    DocApprovalKind::ALL
        .into_iter()
        .filter(|kind| !kind.read(&effective).is_approved())
        .collect()
}

/// True only when the doc status exists and `sit`, `reconcile` and `devsite`
/// are all `APPROVED`.
#[must_use]
pub fn can_move_to_ready(doc_status: Option<&PartnerDocStatus>) -> bool {
    doc_status.is_some_and(|status| {
        status.sit.is_approved() && status.reconcile.is_approved() && status.devsite.is_approved()
    })
}

/// # Errors
/// Returns [`GuardrailViolation`] naming the missing approvals when
/// [`can_move_to_ready`] is false.
pub fn ensure_ready_for_deploy(
    doc_status: Option<&PartnerDocStatus>,
) -> std::result::Result<(), GuardrailViolation> {
    if can_move_to_ready(doc_status) {
        Ok(())
    } else {
        Err(GuardrailViolation::new(missing_approvals(doc_status)))
    }
}

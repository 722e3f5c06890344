#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use super::guardrail::{ensure_ready_for_deploy, GuardrailViolation};
use crate::types::{KanbanStage, NewPartner, Partner, PartnerPatch, PartnerStatus};

/// Turns a requested patch into the patch that will actually be persisted.
///
/// - `DRAFT -> ONBOARDING` without an explicit stage starts the partner at
///   `AWAITING_KICKOFF`.
/// - Entering `READY_FOR_DEPLOY` (from any other stage) requires all three
///   document approvals, read from the patch when it carries a doc status and
///   from the stored record otherwise. Re-saving a partner already in the
///   stage is not an entry and is never re-checked.
///
/// # Errors
/// Returns [`GuardrailViolation`] when the entry check fails; nothing may be
/// written in that case.
pub fn plan_partner_update(
    current: &Partner,
    mut patch: PartnerPatch,
) -> std::result::Result<PartnerPatch, GuardrailViolation> {
    if starts_onboarding(current.status, patch.status) && patch.kanban_stage.is_none() {
        patch.kanban_stage = Some(KanbanStage::AwaitingKickoff);
    }

    if enters_ready_for_deploy(current.kanban_stage, patch.kanban_stage) {
        let effective = patch.doc_status.as_ref().or(current.doc_status.as_ref());
        ensure_ready_for_deploy(effective)?;
    }

    Ok(patch)
}

/// Creating a partner straight into `READY_FOR_DEPLOY` is an entry too.
///
/// # Errors
/// Returns [`GuardrailViolation`] when the supplied doc status is incomplete.
pub fn plan_partner_create(
    new_partner: NewPartner,
) -> std::result::Result<NewPartner, GuardrailViolation> {
    if enters_ready_for_deploy(None, new_partner.kanban_stage) {
        ensure_ready_for_deploy(new_partner.doc_status.as_ref())?;
    }
    Ok(new_partner)
}

#[must_use]
pub const fn starts_onboarding(current: PartnerStatus, requested: Option<PartnerStatus>) -> bool {
    matches!(
        (current, requested),
        (PartnerStatus::Draft, Some(PartnerStatus::Onboarding))
    )
}

#[must_use]
pub const fn enters_ready_for_deploy(
    current: Option<KanbanStage>,
    requested: Option<KanbanStage>,
) -> bool {
    matches!(requested, Some(KanbanStage::ReadyForDeploy))
        && !matches!(current, Some(KanbanStage::ReadyForDeploy))
}

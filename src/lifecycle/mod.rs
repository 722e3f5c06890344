#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

//! Partner status and kanban-stage rules.
//!
//! Pure functions only; the stores call [`plan_partner_update`] inside their
//! own unit of work so the read, the check and the write see the same row.

mod guardrail;
mod transition;

#[cfg(test)]
mod tests;

pub use guardrail::{
    can_move_to_ready, ensure_ready_for_deploy, missing_approvals, DocApprovalKind,
    GuardrailViolation,
};
pub use transition::{
    enters_ready_for_deploy, plan_partner_create, plan_partner_update, starts_onboarding,
};

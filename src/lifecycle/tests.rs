#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod bdd_tests {
    use crate::lifecycle::{
        can_move_to_ready, missing_approvals, plan_partner_create, plan_partner_update,
        DocApprovalKind,
    };
    use crate::types::{
        ApprovalStatus, KanbanStage, NewPartner, Partner, PartnerDocStatus, PartnerPatch,
        PartnerStatus,
    };
    use chrono::Utc;
    use uuid::Uuid;

    fn given_a_partner(
        status: PartnerStatus,
        stage: Option<KanbanStage>,
        doc_status: Option<PartnerDocStatus>,
    ) -> Partner {
        NewPartner {
            name: "Acme Payments".to_string(),
            code: "ACME".to_string(),
            status,
            kanban_stage: stage,
            doc_status,
            integrator: None,
            notes: None,
        }
        .into_partner(Uuid::new_v4(), Utc::now())
    }

    const fn docs(
        sit: ApprovalStatus,
        reconcile: ApprovalStatus,
        devsite: ApprovalStatus,
    ) -> PartnerDocStatus {
        PartnerDocStatus {
            sit,
            reconcile,
            devsite,
        }
    }

    fn move_to_ready() -> PartnerPatch {
        PartnerPatch {
            kanban_stage: Some(KanbanStage::ReadyForDeploy),
            ..PartnerPatch::default()
        }
    }

    #[test]
    fn given_every_doc_status_combination_when_evaluating_then_only_all_approved_passes() {
        for sit in ApprovalStatus::ALL {
            for reconcile in ApprovalStatus::ALL {
                for devsite in ApprovalStatus::ALL {
                    let status = docs(sit, reconcile, devsite);
                    let expected = sit == ApprovalStatus::Approved
                        && reconcile == ApprovalStatus::Approved
                        && devsite == ApprovalStatus::Approved;
                    assert_eq!(can_move_to_ready(Some(&status)), expected, "{status:?}");
                }
            }
        }
    }

    #[test]
    fn given_absent_doc_status_when_evaluating_then_guardrail_blocks() {
        assert!(!can_move_to_ready(None));
        assert!(!can_move_to_ready(Some(&PartnerDocStatus::default())));
        assert_eq!(missing_approvals(None), DocApprovalKind::ALL.to_vec());
    }

    #[test]
    fn given_draft_partner_when_starting_onboarding_then_stage_defaults_to_awaiting_kickoff() {
        let partner = given_a_partner(PartnerStatus::Draft, None, None);
        let patch = PartnerPatch {
            status: Some(PartnerStatus::Onboarding),
            ..PartnerPatch::default()
        };

        let planned = plan_partner_update(&partner, patch).unwrap();

        assert_eq!(planned.status, Some(PartnerStatus::Onboarding));
        assert_eq!(planned.kanban_stage, Some(KanbanStage::AwaitingKickoff));
    }

    #[test]
    fn given_draft_partner_when_starting_onboarding_with_stage_then_explicit_stage_wins() {
        let partner = given_a_partner(PartnerStatus::Draft, None, None);
        let patch = PartnerPatch {
            status: Some(PartnerStatus::Onboarding),
            kanban_stage: Some(KanbanStage::SandboxActive),
            ..PartnerPatch::default()
        };

        let planned = plan_partner_update(&partner, patch).unwrap();

        assert_eq!(planned.kanban_stage, Some(KanbanStage::SandboxActive));
    }

    #[test]
    fn given_non_draft_partner_when_set_to_onboarding_then_no_stage_is_injected() {
        let partner = given_a_partner(PartnerStatus::Maintenance, None, None);
        let patch = PartnerPatch {
            status: Some(PartnerStatus::Onboarding),
            ..PartnerPatch::default()
        };

        let planned = plan_partner_update(&partner, patch).unwrap();

        assert_eq!(planned.kanban_stage, None);
    }

    #[test]
    fn given_partial_approvals_when_entering_ready_then_missing_ones_are_reported() {
        let partner = given_a_partner(
            PartnerStatus::Onboarding,
            Some(KanbanStage::SitVerification),
            Some(docs(
                ApprovalStatus::Approved,
                ApprovalStatus::Pending,
                ApprovalStatus::Approved,
            )),
        );

        let err = plan_partner_update(&partner, move_to_ready()).unwrap_err();

        assert_eq!(err.missing(), &[DocApprovalKind::Reconcile]);
        assert!(err.to_string().contains("missing required document approvals"));
    }

    #[test]
    fn given_incoming_full_approvals_when_entering_ready_then_patch_doc_status_is_used() {
        let partner = given_a_partner(
            PartnerStatus::Onboarding,
            Some(KanbanStage::SitVerification),
            Some(docs(
                ApprovalStatus::Approved,
                ApprovalStatus::Pending,
                ApprovalStatus::Approved,
            )),
        );
        let patch = PartnerPatch {
            doc_status: Some(PartnerDocStatus::all_approved()),
            ..move_to_ready()
        };

        let planned = plan_partner_update(&partner, patch).unwrap();

        assert_eq!(planned.kanban_stage, Some(KanbanStage::ReadyForDeploy));
    }

    #[test]
    fn given_stored_full_approvals_when_incoming_doc_status_regresses_then_entry_is_blocked() {
        let partner = given_a_partner(
            PartnerStatus::Onboarding,
            Some(KanbanStage::RevisionPending),
            Some(PartnerDocStatus::all_approved()),
        );
        let patch = PartnerPatch {
            doc_status: Some(docs(
                ApprovalStatus::Approved,
                ApprovalStatus::Approved,
                ApprovalStatus::NeedsRevision,
            )),
            ..move_to_ready()
        };

        let err = plan_partner_update(&partner, patch).unwrap_err();

        assert_eq!(err.missing(), &[DocApprovalKind::Devsite]);
    }

    #[test]
    fn given_partner_already_ready_when_resaved_with_regressed_docs_then_no_check_runs() {
        let partner = given_a_partner(
            PartnerStatus::Onboarding,
            Some(KanbanStage::ReadyForDeploy),
            Some(docs(
                ApprovalStatus::InReview,
                ApprovalStatus::Approved,
                ApprovalStatus::Approved,
            )),
        );

        let planned = plan_partner_update(&partner, move_to_ready()).unwrap();
        assert_eq!(planned.kanban_stage, Some(KanbanStage::ReadyForDeploy));

        let notes_only = PartnerPatch {
            notes: Some("go-live booked".to_string()),
            ..PartnerPatch::default()
        };
        assert!(plan_partner_update(&partner, notes_only).is_ok());
    }

    #[test]
    fn given_draft_partner_without_docs_when_onboarding_straight_to_ready_then_blocked() {
        let partner = given_a_partner(PartnerStatus::Draft, None, None);
        let patch = PartnerPatch {
            status: Some(PartnerStatus::Onboarding),
            ..move_to_ready()
        };

        let err = plan_partner_update(&partner, patch).unwrap_err();

        assert_eq!(err.missing().len(), 3);
    }

    #[test]
    fn given_suspend_or_maintenance_when_requested_then_no_guardrail_applies() {
        let partner = given_a_partner(
            PartnerStatus::Onboarding,
            Some(KanbanStage::SandboxActive),
            None,
        );
        for status in [PartnerStatus::Suspended, PartnerStatus::Maintenance] {
            let patch = PartnerPatch {
                status: Some(status),
                ..PartnerPatch::default()
            };
            let planned = plan_partner_update(&partner, patch).unwrap();
            assert_eq!(planned.status, Some(status));
            assert_eq!(planned.kanban_stage, None);
        }
    }

    #[test]
    fn given_new_partner_in_ready_stage_when_creating_then_guardrail_applies() {
        let blocked = NewPartner {
            name: "Initech".to_string(),
            code: "INI".to_string(),
            status: PartnerStatus::Onboarding,
            kanban_stage: Some(KanbanStage::ReadyForDeploy),
            doc_status: None,
            integrator: None,
            notes: None,
        };
        assert!(plan_partner_create(blocked.clone()).is_err());

        let allowed = NewPartner {
            doc_status: Some(PartnerDocStatus::all_approved()),
            ..blocked
        };
        assert!(plan_partner_create(allowed).is_ok());
    }
}

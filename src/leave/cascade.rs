use crate::leave::error::LeaveError;
use crate::leave::status::derive_status;
use crate::model::approval::{ApprovalRecord, NewApprovalRecord};
use crate::model::approval_level::ApprovalLevel;
use crate::model::leave_request::LeaveRequest;
use crate::model::status::StatusCode;

/// An approver's decision at one level.
#[derive(Debug, Clone)]
pub struct ApprovalDecision {
    pub level: ApprovalLevel,
    pub approver_id: u64,
    pub approved: bool,
    pub note: Option<String>,
}

/// Records to append for `decision`, explicit record first.
///
/// An approval fills every lower level that has no record yet with an
/// automatic approval by the same approver; a denial is recorded alone.
pub fn plan_approval(
    request: &LeaveRequest,
    existing: &[ApprovalRecord],
    decision: &ApprovalDecision,
) -> Result<Vec<NewApprovalRecord>, LeaveError> {
    let current = derive_status(existing, request.cancellation_requested, request.seen_at);
    match current {
        StatusCode::Denied => {
            return Err(LeaveError::Conflict(format!(
                "leave request {} has already been denied",
                request.id
            )));
        }
        StatusCode::Approved => {
            return Err(LeaveError::Conflict(format!(
                "leave request {} has already been approved",
                request.id
            )));
        }
        StatusCode::CancellationRequested if decision.approved => {
            return Err(LeaveError::Conflict(format!(
                "leave request {} has a pending cancellation and can only be denied",
                request.id
            )));
        }
        _ => {}
    }

    let recorded = |level: ApprovalLevel| existing.iter().any(|a| a.level == level);

    if recorded(decision.level) {
        return Err(LeaveError::Conflict(format!(
            "approval level {} has already been recorded for leave request {}",
            decision.level, request.id
        )));
    }

    let mut plan = vec![NewApprovalRecord {
        leave_request_id: request.id,
        level: decision.level,
        approver_id: decision.approver_id,
        approved: decision.approved,
        automatic: false,
        note: decision.note.clone(),
    }];

    if decision.approved {
        plan.extend(
            decision
                .level
                .below()
                .filter(|level| !recorded(*level))
                .map(|level| NewApprovalRecord {
                    leave_request_id: request.id,
                    level,
                    approver_id: decision.approver_id,
                    approved: true,
                    automatic: true,
                    note: None,
                }),
        );
    }

    Ok(plan)
}

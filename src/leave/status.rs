use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::IntoEnumIterator;
use utoipa::ToSchema;

use crate::model::approval::ApprovalRecord;
use crate::model::approval_level::ApprovalLevel;
use crate::model::status::StatusCode;

/// Result of recomputing a request's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct StatusChange {
    pub status: StatusCode,
    pub changed: bool,
}

/// Maps the approval state of a request to its status, first match wins:
/// any denial, every level approved, cancellation asked, some approval,
/// seen by an approver, untouched.
pub fn derive_status(
    approvals: &[ApprovalRecord],
    cancellation_requested: bool,
    seen_at: Option<DateTime<Utc>>,
) -> StatusCode {
    if approvals.iter().any(|a| !a.approved) {
        return StatusCode::Denied;
    }

    let fully_approved = ApprovalLevel::iter()
        .all(|level| approvals.iter().any(|a| a.level == level && a.approved));
    if fully_approved {
        return StatusCode::Approved;
    }

    if cancellation_requested {
        return StatusCode::CancellationRequested;
    }

    if approvals.iter().any(|a| a.approved) {
        return StatusCode::InProcess;
    }

    if seen_at.is_some() {
        return StatusCode::InReview;
    }

    StatusCode::Requested
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::approval_level::ApprovalLevel;

/// Append-only record of one decision at one approval level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApprovalRecord {
    pub id: u64,
    pub leave_request_id: u64,
    pub level: ApprovalLevel,
    pub approver_id: u64,
    pub approved: bool,
    /// Filled in by a higher level's approval rather than granted explicitly
    pub automatic: bool,
    pub note: Option<String>,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewApprovalRecord {
    pub leave_request_id: u64,
    pub level: ApprovalLevel,
    pub approver_id: u64,
    pub approved: bool,
    pub automatic: bool,
    pub note: Option<String>,
}

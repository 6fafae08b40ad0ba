use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::leave::range::DateRange;
use crate::model::status::StatusCode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = 2)]
    pub leave_type_id: u64,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    pub status: StatusCode,
    /// First time an approver opened the request
    #[schema(example = "2026-01-01T09:30:00Z", format = "date-time", value_type = Option<String>)]
    pub seen_at: Option<DateTime<Utc>>,
    pub cancellation_requested: bool,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

impl LeaveRequest {
    /// Stored rows always have `start_date <= end_date`.
    pub fn range(&self) -> DateRange {
        DateRange::spanning(self.start_date, self.end_date)
    }
}

#[derive(Debug, Clone)]
pub struct NewLeaveRequest {
    pub employee_id: u64,
    pub leave_type_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::leave::range::DateRange;
use crate::model::approval::{ApprovalRecord, NewApprovalRecord};
use crate::model::leave_request::{LeaveRequest, NewLeaveRequest};
use crate::model::leave_type::LeaveType;
use crate::model::status::StatusCode;

#[cfg(test)]
pub mod memory;
pub mod mysql;

#[cfg(test)]
pub use memory::MemoryLeaveStore;
pub use mysql::MySqlLeaveStore;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Listing criteria, `page` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFilter {
    pub employee_id: Option<u64>,
    pub status: Option<StatusCode>,
    pub page: u64,
    pub per_page: u64,
}

impl RequestFilter {
    pub fn offset(&self) -> u64 {
        (self.page.max(1) - 1).saturating_mul(self.per_page)
    }
}

/// Reads and single-statement writes on leave data. Soft-deleted requests
/// are invisible to every method.
#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn find_leave_type(&self, id: u64) -> Result<Option<LeaveType>, RepositoryError>;

    async fn list_leave_types(&self) -> Result<Vec<LeaveType>, RepositoryError>;

    async fn find_request(&self, id: u64) -> Result<Option<LeaveRequest>, RepositoryError>;

    /// Approved requests of an employee, optionally of one leave type only.
    async fn approved_requests(
        &self,
        employee_id: u64,
        leave_type_id: Option<u64>,
    ) -> Result<Vec<LeaveRequest>, RepositoryError>;

    /// One page of matching requests, newest first, plus the total count.
    async fn list_requests(
        &self,
        filter: &RequestFilter,
    ) -> Result<(Vec<LeaveRequest>, i64), RepositoryError>;

    async fn approvals_for(&self, request_id: u64) -> Result<Vec<ApprovalRecord>, RepositoryError>;

    async fn insert_request(&self, request: &NewLeaveRequest) -> Result<u64, RepositoryError>;

    async fn update_request_dates(&self, id: u64, range: &DateRange) -> Result<bool, RepositoryError>;

    /// Sets `seen_at` unless already set; returns whether it was set now.
    async fn mark_seen(&self, id: u64, at: DateTime<Utc>) -> Result<bool, RepositoryError>;

    async fn soft_delete(&self, id: u64) -> Result<bool, RepositoryError>;

    async fn begin(&self) -> Result<Box<dyn LeaveUnitOfWork>, RepositoryError>;
}

/// Writes that must land together. Dropping without [`commit`] rolls back.
///
/// [`commit`]: LeaveUnitOfWork::commit
#[async_trait]
pub trait LeaveUnitOfWork: Send {
    /// Loads the request and holds it against concurrent writers until the
    /// unit of work ends.
    async fn lock_request(&mut self, id: u64) -> Result<Option<LeaveRequest>, RepositoryError>;

    async fn approvals_for(&mut self, request_id: u64)
    -> Result<Vec<ApprovalRecord>, RepositoryError>;

    /// Approved requests of an employee, locked like [`lock_request`].
    ///
    /// [`lock_request`]: LeaveUnitOfWork::lock_request
    async fn approved_requests(
        &mut self,
        employee_id: u64,
    ) -> Result<Vec<LeaveRequest>, RepositoryError>;

    async fn insert_approval(&mut self, record: &NewApprovalRecord) -> Result<u64, RepositoryError>;

    async fn set_cancellation_requested(&mut self, id: u64) -> Result<(), RepositoryError>;

    async fn update_status(&mut self, id: u64, status: StatusCode) -> Result<(), RepositoryError>;

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;
}

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::leave::range::DateRange;
use crate::model::approval::{ApprovalRecord, NewApprovalRecord};
use crate::model::leave_request::{LeaveRequest, NewLeaveRequest};
use crate::model::leave_type::LeaveType;
use crate::model::status::StatusCode;
use crate::repository::{LeaveStore, LeaveUnitOfWork, RepositoryError, RequestFilter};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    leave_types: BTreeMap<u64, LeaveType>,
    requests: BTreeMap<u64, LeaveRequest>,
    deleted: Vec<u64>,
    approvals: Vec<ApprovalRecord>,
    next_request_id: u64,
    next_approval_id: u64,
    /// Approval inserts allowed before the next one fails, `None` for no limit
    approval_inserts_left: Option<usize>,
}

impl MemoryState {
    fn live(&self, id: u64) -> Option<&LeaveRequest> {
        self.requests.get(&id).filter(|_| !self.deleted.contains(&id))
    }

    fn live_mut(&mut self, id: u64) -> Option<&mut LeaveRequest> {
        if self.deleted.contains(&id) {
            return None;
        }
        self.requests.get_mut(&id)
    }

    fn approved_requests(&self, employee_id: u64) -> impl Iterator<Item = &LeaveRequest> {
        self.requests
            .values()
            .filter(move |r| !self.deleted.contains(&r.id))
            .filter(move |r| r.employee_id == employee_id && r.status == StatusCode::Approved)
    }

    fn approvals_for(&self, request_id: u64) -> Vec<ApprovalRecord> {
        self.approvals
            .iter()
            .filter(|a| a.leave_request_id == request_id)
            .cloned()
            .collect()
    }
}

/// Store backed by process memory. A unit of work edits a private copy that
/// replaces the shared state on commit.
#[derive(Debug, Clone, Default)]
pub struct MemoryLeaveStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryLeaveStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A test that panicked mid-write leaves the data usable for the rest.
    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_leave_type(&self, leave_type: LeaveType) {
        self.state().leave_types.insert(leave_type.id, leave_type);
    }

    /// Stores `request` as is, keeping its id.
    pub fn add_request(&self, request: LeaveRequest) {
        let mut state = self.state();
        state.next_request_id = state.next_request_id.max(request.id);
        state.requests.insert(request.id, request);
    }

    pub fn approvals(&self, request_id: u64) -> Vec<ApprovalRecord> {
        self.state().approvals_for(request_id)
    }

    pub fn is_deleted(&self, id: u64) -> bool {
        self.state().deleted.contains(&id)
    }

    /// Lets `count` more approval inserts succeed, then fails every one after.
    pub fn fail_approval_inserts_after(&self, count: usize) {
        self.state().approval_inserts_left = Some(count);
    }
}

#[async_trait]
impl LeaveStore for MemoryLeaveStore {
    async fn find_leave_type(&self, id: u64) -> Result<Option<LeaveType>, RepositoryError> {
        Ok(self.state().leave_types.get(&id).cloned())
    }

    async fn list_leave_types(&self) -> Result<Vec<LeaveType>, RepositoryError> {
        let mut types: Vec<_> = self.state().leave_types.values().cloned().collect();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(types)
    }

    async fn find_request(&self, id: u64) -> Result<Option<LeaveRequest>, RepositoryError> {
        Ok(self.state().live(id).cloned())
    }

    async fn approved_requests(
        &self,
        employee_id: u64,
        leave_type_id: Option<u64>,
    ) -> Result<Vec<LeaveRequest>, RepositoryError> {
        Ok(self
            .state()
            .approved_requests(employee_id)
            .filter(|r| leave_type_id.is_none_or(|t| r.leave_type_id == t))
            .cloned()
            .collect())
    }

    async fn list_requests(
        &self,
        filter: &RequestFilter,
    ) -> Result<(Vec<LeaveRequest>, i64), RepositoryError> {
        let state = self.state();
        let mut matching: Vec<_> = state
            .requests
            .values()
            .filter(|r| !state.deleted.contains(&r.id))
            .filter(|r| filter.employee_id.is_none_or(|e| r.employee_id == e))
            .filter(|r| filter.status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.per_page as usize)
            .collect();

        Ok((page, total))
    }

    async fn approvals_for(&self, request_id: u64) -> Result<Vec<ApprovalRecord>, RepositoryError> {
        Ok(self.state().approvals_for(request_id))
    }

    async fn insert_request(&self, request: &NewLeaveRequest) -> Result<u64, RepositoryError> {
        let mut state = self.state();
        state.next_request_id += 1;
        let id = state.next_request_id;
        state.requests.insert(
            id,
            LeaveRequest {
                id,
                employee_id: request.employee_id,
                leave_type_id: request.leave_type_id,
                start_date: request.start_date,
                end_date: request.end_date,
                status: StatusCode::Requested,
                seen_at: None,
                cancellation_requested: false,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn update_request_dates(&self, id: u64, range: &DateRange) -> Result<bool, RepositoryError> {
        let mut state = self.state();
        Ok(match state.live_mut(id) {
            Some(request) => {
                request.start_date = range.start();
                request.end_date = range.end();
                true
            }
            None => false,
        })
    }

    async fn mark_seen(&self, id: u64, at: DateTime<Utc>) -> Result<bool, RepositoryError> {
        let mut state = self.state();
        Ok(match state.live_mut(id) {
            Some(request) if request.seen_at.is_none() => {
                request.seen_at = Some(at);
                true
            }
            _ => false,
        })
    }

    async fn soft_delete(&self, id: u64) -> Result<bool, RepositoryError> {
        let mut state = self.state();
        if state.live(id).is_none() {
            return Ok(false);
        }
        state.deleted.push(id);
        Ok(true)
    }

    async fn begin(&self) -> Result<Box<dyn LeaveUnitOfWork>, RepositoryError> {
        let working = self.state().clone();
        Ok(Box::new(MemoryUnitOfWork {
            shared: Arc::clone(&self.state),
            working,
        }))
    }
}

struct MemoryUnitOfWork {
    shared: Arc<Mutex<MemoryState>>,
    working: MemoryState,
}

#[async_trait]
impl LeaveUnitOfWork for MemoryUnitOfWork {
    async fn lock_request(&mut self, id: u64) -> Result<Option<LeaveRequest>, RepositoryError> {
        Ok(self.working.live(id).cloned())
    }

    async fn approvals_for(
        &mut self,
        request_id: u64,
    ) -> Result<Vec<ApprovalRecord>, RepositoryError> {
        Ok(self.working.approvals_for(request_id))
    }

    async fn approved_requests(
        &mut self,
        employee_id: u64,
    ) -> Result<Vec<LeaveRequest>, RepositoryError> {
        Ok(self.working.approved_requests(employee_id).cloned().collect())
    }

    async fn insert_approval(&mut self, record: &NewApprovalRecord) -> Result<u64, RepositoryError> {
        if let Some(left) = self.working.approval_inserts_left.as_mut() {
            if *left == 0 {
                return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
            }
            *left -= 1;
        }

        self.working.next_approval_id += 1;
        let id = self.working.next_approval_id;
        self.working.approvals.push(ApprovalRecord {
            id,
            leave_request_id: record.leave_request_id,
            level: record.level,
            approver_id: record.approver_id,
            approved: record.approved,
            automatic: record.automatic,
            note: record.note.clone(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn set_cancellation_requested(&mut self, id: u64) -> Result<(), RepositoryError> {
        if let Some(request) = self.working.live_mut(id) {
            request.cancellation_requested = true;
        }
        Ok(())
    }

    async fn update_status(&mut self, id: u64, status: StatusCode) -> Result<(), RepositoryError> {
        if let Some(request) = self.working.requests.get_mut(&id) {
            request.status = status;
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let MemoryUnitOfWork { shared, working } = *self;
        *shared.lock().unwrap_or_else(PoisonError::into_inner) = working;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn survives_a_panicking_writer() {
        let store = MemoryLeaveStore::new();
        let shared = Arc::clone(&store.state);
        let _ = std::thread::spawn(move || {
            let _guard = shared.lock().unwrap();
            panic!("writer failed");
        })
        .join();
        assert!(store.state.is_poisoned());

        store.add_leave_type(LeaveType {
            id: 1,
            name: "Sick".to_string(),
            max_duration_ms: None,
            resets_yearly: false,
        });
        assert_eq!(store.state().leave_types.len(), 1);
    }
}

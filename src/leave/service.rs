use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::leave::cascade::{ApprovalDecision, plan_approval};
use crate::leave::error::LeaveError;
use crate::leave::overlap::{overlap_errors, overlaps_any};
use crate::leave::policy::ApprovalPolicy;
use crate::leave::quota;
use crate::leave::range::DateRange;
use crate::leave::status::{StatusChange, derive_status};
use crate::leave::validation::ValidationErrors;
use crate::model::approval::ApprovalRecord;
use crate::model::leave_request::{LeaveRequest, NewLeaveRequest};
use crate::model::leave_type::LeaveType;
use crate::model::status::StatusCode;
use crate::repository::{LeaveStore, RequestFilter};

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaveDetail {
    pub request: LeaveRequest,
    pub approvals: Vec<ApprovalRecord>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApprovalOutcome {
    pub request_id: u64,
    /// Records appended by this decision, explicit one first
    pub recorded: Vec<ApprovalRecord>,
    pub status: StatusCode,
    pub changed: bool,
}

pub struct LeaveService {
    store: Arc<dyn LeaveStore>,
    policy: ApprovalPolicy,
}

impl LeaveService {
    pub fn new(store: Arc<dyn LeaveStore>, policy: ApprovalPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &ApprovalPolicy {
        &self.policy
    }

    /* =========================
    Validation
    ========================= */

    /// Whether `start..=end` shares a day with one of the employee's
    /// approved requests other than `exclude`.
    pub async fn has_overlap(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
        exclude: Option<u64>,
    ) -> Result<bool, LeaveError> {
        let candidate = date_range(start, end)?;
        let approved = self.store.approved_requests(employee_id, None).await?;
        Ok(overlaps_any(&candidate, &approved, exclude))
    }

    pub async fn validate_duration(
        &self,
        leave_type_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ValidationErrors, LeaveError> {
        let leave_type = match self.leave_type(leave_type_id).await? {
            Ok(leave_type) => leave_type,
            Err(errors) => return Ok(errors),
        };
        let range = match date_range(start, end) {
            Ok(range) => range,
            Err(errors) => return Ok(errors),
        };

        Ok(quota::validate_duration(&leave_type, &range))
    }

    pub async fn validate_annual_duration(
        &self,
        employee_id: u64,
        leave_type_id: u64,
        start: NaiveDate,
        end: NaiveDate,
        exclude: Option<u64>,
    ) -> Result<ValidationErrors, LeaveError> {
        let leave_type = match self.leave_type(leave_type_id).await? {
            Ok(leave_type) => leave_type,
            Err(errors) => return Ok(errors),
        };
        let range = match date_range(start, end) {
            Ok(range) => range,
            Err(errors) => return Ok(errors),
        };
        let approved = self
            .store
            .approved_requests(employee_id, Some(leave_type_id))
            .await?;

        Ok(quota::validate_annual_duration(
            &leave_type,
            &range,
            &approved,
            exclude,
        ))
    }

    /// Every check a new or edited request must pass, merged.
    pub async fn validate_request(
        &self,
        employee_id: u64,
        leave_type_id: u64,
        start: NaiveDate,
        end: NaiveDate,
        exclude: Option<u64>,
    ) -> Result<ValidationErrors, LeaveError> {
        let range = match date_range(start, end) {
            Ok(range) => range,
            Err(errors) => return Ok(errors),
        };
        let leave_type = match self.leave_type(leave_type_id).await? {
            Ok(leave_type) => leave_type,
            Err(errors) => return Ok(errors),
        };
        let approved = self.store.approved_requests(employee_id, None).await?;

        let errors = rule_errors(&leave_type, &range, &approved, exclude);

        debug!(
            employee_id,
            leave_type_id,
            %start,
            %end,
            valid = errors.is_empty(),
            "Validated leave request"
        );

        Ok(errors)
    }

    /* =========================
    Employee actions
    ========================= */

    pub async fn create_request(&self, request: NewLeaveRequest) -> Result<u64, LeaveError> {
        let errors = self
            .validate_request(
                request.employee_id,
                request.leave_type_id,
                request.start_date,
                request.end_date,
                None,
            )
            .await?;
        if !errors.is_empty() {
            return Err(LeaveError::Validation(errors));
        }

        let id = self.store.insert_request(&request).await?;
        info!(
            leave_id = id,
            employee_id = request.employee_id,
            "Leave request submitted"
        );

        Ok(id)
    }

    pub async fn update_request(
        &self,
        id: u64,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<LeaveRequest, LeaveError> {
        let range = date_range(start, end)?;
        let request = self.owned_request(id, employee_id).await?;
        if !request.status.is_open() {
            return Err(LeaveError::Conflict(format!(
                "leave request {id} can no longer be edited"
            )));
        }

        let errors = self
            .validate_request(employee_id, request.leave_type_id, start, end, Some(id))
            .await?;
        if !errors.is_empty() {
            return Err(LeaveError::Validation(errors));
        }

        if !self.store.update_request_dates(id, &range).await? {
            return Err(LeaveError::NotFound(id));
        }
        info!(leave_id = id, employee_id, "Leave request dates updated");

        self.find(id).await
    }

    /// Soft-deletes a request nobody has looked at yet.
    pub async fn delete_request(&self, id: u64, employee_id: u64) -> Result<(), LeaveError> {
        let request = self.owned_request(id, employee_id).await?;
        if request.status != StatusCode::Requested {
            return Err(LeaveError::Conflict(format!(
                "leave request {id} is already under review and cannot be deleted"
            )));
        }

        if !self.store.soft_delete(id).await? {
            return Err(LeaveError::NotFound(id));
        }
        info!(leave_id = id, employee_id, "Leave request deleted");

        Ok(())
    }

    /// Flags the request and recomputes its status under one lock.
    pub async fn request_cancellation(
        &self,
        id: u64,
        employee_id: u64,
    ) -> Result<StatusChange, LeaveError> {
        let mut uow = self.store.begin().await?;

        let request = uow.lock_request(id).await?.ok_or(LeaveError::NotFound(id))?;
        ensure_owner(&request, employee_id)?;
        if !request.status.is_open() {
            return Err(LeaveError::Conflict(format!(
                "leave request {id} can no longer be cancelled"
            )));
        }

        uow.set_cancellation_requested(id).await?;
        let approvals = uow.approvals_for(id).await?;
        let status = derive_status(&approvals, true, request.seen_at);
        let changed = status != request.status;
        if changed {
            uow.update_status(id, status).await?;
        }
        uow.commit().await?;

        info!(leave_id = id, employee_id, %status, "Leave cancellation requested");

        Ok(StatusChange { status, changed })
    }

    /* =========================
    Approver actions
    ========================= */

    /// Records the first time an approver opens the request.
    pub async fn mark_seen(&self, id: u64) -> Result<StatusChange, LeaveError> {
        self.find(id).await?;
        if self.store.mark_seen(id, Utc::now()).await? {
            debug!(leave_id = id, "Leave request seen by approver");
        }

        self.refresh_status(id).await
    }

    /// Appends the decision and any cascaded approvals, then recomputes the
    /// status, all in one unit of work.
    pub async fn record_approval(
        &self,
        id: u64,
        decision: ApprovalDecision,
    ) -> Result<ApprovalOutcome, LeaveError> {
        let mut uow = self.store.begin().await?;

        let request = uow.lock_request(id).await?.ok_or(LeaveError::NotFound(id))?;
        let existing = uow.approvals_for(id).await?;
        let plan = plan_approval(&request, &existing, &decision)?;

        let mut inserted = Vec::with_capacity(plan.len());
        for record in &plan {
            inserted.push(uow.insert_approval(record).await?);
        }

        let approvals = uow.approvals_for(id).await?;
        let status = derive_status(&approvals, request.cancellation_requested, request.seen_at);
        if status == StatusCode::Approved {
            // Other requests may have been approved since this one was filed
            let approved = uow.approved_requests(request.employee_id).await?;
            let errors = self.approval_errors(&request, &approved).await?;
            if !errors.is_empty() {
                warn!(leave_id = id, %errors, "Final approval rejected, rolling back");
                return Err(LeaveError::Validation(errors));
            }
        }

        let changed = status != request.status;
        if changed {
            uow.update_status(id, status).await?;
        }
        uow.commit().await?;

        info!(
            leave_id = id,
            approver_id = decision.approver_id,
            approval_level = %decision.level,
            approved = decision.approved,
            cascaded = plan.len() - 1,
            %status,
            "Leave approval recorded"
        );

        let recorded = inserted
            .iter()
            .filter_map(|new_id| approvals.iter().find(|a| a.id == *new_id).cloned())
            .collect();

        Ok(ApprovalOutcome {
            request_id: id,
            recorded,
            status,
            changed,
        })
    }

    /// Re-derives the status and stores it only when it differs.
    pub async fn refresh_status(&self, id: u64) -> Result<StatusChange, LeaveError> {
        let mut uow = self.store.begin().await?;

        let request = uow.lock_request(id).await?.ok_or(LeaveError::NotFound(id))?;
        let approvals = uow.approvals_for(id).await?;
        let status = derive_status(&approvals, request.cancellation_requested, request.seen_at);
        let changed = status != request.status;
        if changed {
            uow.update_status(id, status).await?;
            uow.commit().await?;
            info!(leave_id = id, from = %request.status, to = %status, "Leave status changed");
        }

        Ok(StatusChange { status, changed })
    }

    /* =========================
    Queries
    ========================= */

    pub async fn get_request(&self, id: u64) -> Result<LeaveDetail, LeaveError> {
        let request = self.find(id).await?;
        let approvals = self.store.approvals_for(id).await?;
        Ok(LeaveDetail { request, approvals })
    }

    pub async fn list_requests(
        &self,
        filter: &RequestFilter,
    ) -> Result<(Vec<LeaveRequest>, i64), LeaveError> {
        Ok(self.store.list_requests(filter).await?)
    }

    pub async fn list_leave_types(&self) -> Result<Vec<LeaveType>, LeaveError> {
        Ok(self.store.list_leave_types().await?)
    }

    async fn find(&self, id: u64) -> Result<LeaveRequest, LeaveError> {
        self.store
            .find_request(id)
            .await?
            .ok_or(LeaveError::NotFound(id))
    }

    async fn owned_request(&self, id: u64, employee_id: u64) -> Result<LeaveRequest, LeaveError> {
        let request = self.find(id).await?;
        ensure_owner(&request, employee_id)?;
        Ok(request)
    }

    /// Caps and overlap for `request` becoming approved next to `approved`.
    async fn approval_errors(
        &self,
        request: &LeaveRequest,
        approved: &[LeaveRequest],
    ) -> Result<ValidationErrors, LeaveError> {
        let leave_type = match self.leave_type(request.leave_type_id).await? {
            Ok(leave_type) => leave_type,
            Err(errors) => return Ok(errors),
        };

        Ok(rule_errors(&leave_type, &request.range(), approved, Some(request.id)))
    }

    /// Outer error is infrastructure, inner is a validation failure.
    async fn leave_type(
        &self,
        id: u64,
    ) -> Result<Result<LeaveType, ValidationErrors>, LeaveError> {
        Ok(self
            .store
            .find_leave_type(id)
            .await?
            .ok_or_else(|| ValidationErrors::single("leave_type_id", format!("unknown leave type {id}"))))
    }
}

fn ensure_owner(request: &LeaveRequest, employee_id: u64) -> Result<(), LeaveError> {
    if request.employee_id != employee_id {
        return Err(LeaveError::Forbidden(format!(
            "leave request {} belongs to another employee",
            request.id
        )));
    }
    Ok(())
}

/// Duration cap, yearly budget and overlap of `range` against the approved
/// requests, skipping `exclude`.
fn rule_errors(
    leave_type: &LeaveType,
    range: &DateRange,
    approved: &[LeaveRequest],
    exclude: Option<u64>,
) -> ValidationErrors {
    let mut errors = quota::validate_duration(leave_type, range);
    errors.merge(quota::validate_annual_duration(leave_type, range, approved, exclude));
    errors.merge(overlap_errors(range, approved, exclude));
    errors
}

fn date_range(start: NaiveDate, end: NaiveDate) -> Result<DateRange, ValidationErrors> {
    DateRange::new(start, end)
        .map_err(|_| ValidationErrors::single("end_date", "end_date cannot be before start_date"))
}

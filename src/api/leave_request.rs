use crate::auth::auth::AuthUser;
use crate::leave::cascade::ApprovalDecision;
use crate::leave::error::LeaveError;
use crate::leave::service::{ApprovalOutcome, LeaveDetail, LeaveService};
use crate::leave::status::StatusChange;
use crate::model::approval_level::ApprovalLevel;
use crate::model::leave_request::{LeaveRequest, NewLeaveRequest};
use crate::model::status::StatusCode;
use crate::repository::RequestFilter;
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = 1)]
    pub leave_type_id: u64,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateLeave {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-07", format = "date", value_type = String)]
    pub end_date: NaiveDate,
}

#[derive(Deserialize, ToSchema)]
pub struct ApprovalPayload {
    pub level: ApprovalLevel,
    #[schema(example = true)]
    pub approved: bool,
    #[schema(example = "Covered by the team")]
    pub note: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    #[schema(example = 123)]
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    /// Filter by leave status
    pub status: Option<StatusCode>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>, // 1-based
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>, // items per page
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = Object, example = json!({
            "message": "Leave request submitted",
            "id": 1,
            "status": "requested"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 422, description = "Validation failed", body = Object, example = json!({
            "message": "Validation failed",
            "errors": { "start_date": ["The requested dates overlap an already approved leave request"] }
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;
    let payload = payload.into_inner();

    let id = service
        .create_request(NewLeaveRequest {
            employee_id,
            leave_type_id: payload.leave_type_id,
            start_date: payload.start_date,
            end_date: payload.end_date,
        })
        .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Leave request submitted",
        "id": id,
        "status": StatusCode::Requested
    })))
}

/// Leave request with its approval trail. Opening it as an approver marks
/// it as seen.
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveDetail),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "leave request 1 not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let detail = service.get_request(leave_id).await?;
    let owner = auth.employee_id == Some(detail.request.employee_id);
    let approver = auth.is_approver(service.policy());

    if !(owner || approver || auth.role.oversees_leave()) {
        return Err(LeaveError::Forbidden("Not allowed to view this leave request".into()).into());
    }

    if approver && !owner && detail.request.seen_at.is_none() {
        service.mark_seen(leave_id).await?;
        return Ok(HttpResponse::Ok().json(service.get_request(leave_id).await?));
    }

    Ok(HttpResponse::Ok().json(detail))
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);

    // Plain employees only ever see their own requests
    let employee_id = if auth.role.oversees_leave() || auth.is_approver(service.policy()) {
        query.employee_id
    } else {
        Some(auth.require_employee()?)
    };

    let filter = RequestFilter {
        employee_id,
        status: query.status,
        page,
        per_page,
    };
    let (data, total) = service.list_requests(&filter).await?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to edit")
    ),
    request_body = UpdateLeave,
    responses(
        (status = 200, description = "Leave request updated", body = LeaveRequest),
        (status = 403, description = "Not the owner of the request"),
        (status = 409, description = "Request already decided on"),
        (status = 422, description = "Validation failed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn update_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
    payload: web::Json<UpdateLeave>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;
    let leave_id = path.into_inner();

    let updated = service
        .update_request(leave_id, employee_id, payload.start_date, payload.end_date)
        .await?;

    Ok(HttpResponse::Ok().json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to delete")
    ),
    responses(
        (status = 200, description = "Leave request deleted", body = Object, example = json!({
            "message": "Leave request deleted"
        })),
        (status = 403, description = "Not the owner of the request"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Request already under review")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn delete_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;
    let leave_id = path.into_inner();

    service.delete_request(leave_id, employee_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave request deleted"
    })))
}

/* =========================
Approve / deny at one level
========================= */
#[utoipa::path(
    post,
    path = "/api/leave/{leave_id}/approvals",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to decide on")
    ),
    request_body = ApprovalPayload,
    responses(
        (status = 200, description = "Decision recorded", body = ApprovalOutcome),
        (status = 403, description = "Missing the level's approval permission"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Level already recorded or request already decided", body = Object, example = json!({
            "message": "leave request 1 has already been denied"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn record_approval(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
    payload: web::Json<ApprovalPayload>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();
    let payload = payload.into_inner();

    if !auth.can_approve(service.policy(), payload.level) {
        return Err(LeaveError::Forbidden(format!(
            "Missing permission {}",
            service.policy().permission_for(payload.level)
        ))
        .into());
    }

    let detail = service.get_request(leave_id).await?;
    if auth.employee_id == Some(detail.request.employee_id) {
        return Err(LeaveError::Forbidden("Cannot decide on your own leave request".into()).into());
    }

    let outcome = service
        .record_approval(
            leave_id,
            ApprovalDecision {
                level: payload.level,
                approver_id: auth.user_id,
                approved: payload.approved,
                note: payload.note,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(outcome))
}

#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/cancel",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to cancel")
    ),
    responses(
        (status = 200, description = "Cancellation requested", body = StatusChange),
        (status = 403, description = "Not the owner of the request"),
        (status = 409, description = "Request can no longer be cancelled")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;
    let leave_id = path.into_inner();

    let change = service.request_cancellation(leave_id, employee_id).await?;

    Ok(HttpResponse::Ok().json(change))
}

#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/status",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to recompute")
    ),
    responses(
        (status = 200, description = "Status recomputed", body = StatusChange),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn refresh_status(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let change = service.refresh_status(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(change))
}

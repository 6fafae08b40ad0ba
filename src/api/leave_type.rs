use crate::auth::auth::AuthUser;
use crate::leave::service::LeaveService;
use crate::model::leave_type::LeaveType;
use actix_web::{HttpResponse, Responder, web};

/// Leave types with their duration caps
#[utoipa::path(
    get,
    path = "/api/leave-types",
    responses(
        (status = 200, description = "Configured leave types", body = [LeaveType]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn list_leave_types(
    _auth: AuthUser,
    service: web::Data<LeaveService>,
) -> actix_web::Result<impl Responder> {
    let types = service.list_leave_types().await?;
    Ok(HttpResponse::Ok().json(types))
}

use crate::api::leave_request::{
    ApprovalPayload, CreateLeave, LeaveFilter, LeaveListResponse, UpdateLeave,
};
use crate::leave::service::{ApprovalOutcome, LeaveDetail};
use crate::leave::status::StatusChange;
use crate::model::approval::ApprovalRecord;
use crate::model::approval_level::ApprovalLevel;
use crate::model::leave_request::LeaveRequest;
use crate::model::leave_type::LeaveType;
use crate::model::status::StatusCode;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Leave API",
        version = "1.0.0",
        description = r#"
## Leave management

Employees file leave requests; approvers sign them off level by level.

### 🔹 Rules
- A request may not overlap an already **approved** request of the same employee
- Leave types may cap a single request and, when the cap resets yearly,
  the total approved per calendar year (requests crossing New Year are split)
- Approving at a level also approves every lower level still missing
- Any denial is final

### 🔐 Security
All endpoints require a **JWT Bearer** access token. Deciding at a level
requires that level's approval permission.
"#,
    ),
    paths(
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::update_leave,
        crate::api::leave_request::delete_leave,
        crate::api::leave_request::record_approval,
        crate::api::leave_request::cancel_leave,
        crate::api::leave_request::refresh_status,

        crate::api::leave_type::list_leave_types
    ),
    components(
        schemas(
            LeaveFilter,
            LeaveListResponse,
            CreateLeave,
            UpdateLeave,
            ApprovalPayload,
            LeaveRequest,
            LeaveType,
            LeaveDetail,
            ApprovalRecord,
            ApprovalLevel,
            ApprovalOutcome,
            StatusChange,
            StatusCode
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Leave", description = "Leave management APIs"),
    )
)]
pub struct ApiDoc;

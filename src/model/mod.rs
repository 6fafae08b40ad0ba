pub mod approval;
pub mod approval_level;
pub mod leave_request;
pub mod leave_type;
pub mod role;
pub mod status;

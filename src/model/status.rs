use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Lifecycle status of a leave request.
///
/// Never set directly by callers: it is always derived from the approval
/// records, the cancellation flag and the seen timestamp
/// (see [`crate::leave::status::derive_status`]).
#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    AsRefStr,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StatusCode {
    Requested = 1,
    InReview = 2,
    InProcess = 3,
    Approved = 4,
    Denied = 5,
    CancellationRequested = 6,
}

impl StatusCode {
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(StatusCode::Requested),
            2 => Some(StatusCode::InReview),
            3 => Some(StatusCode::InProcess),
            4 => Some(StatusCode::Approved),
            5 => Some(StatusCode::Denied),
            6 => Some(StatusCode::CancellationRequested),
            _ => None,
        }
    }

    /// No approver has decided anything yet: the employee may still edit
    /// the dates or ask for cancellation.
    pub fn is_open(self) -> bool {
        matches!(self, StatusCode::Requested | StatusCode::InReview)
    }
}

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// One rung of the sign-off hierarchy a leave request has to climb.
///
/// Levels are totally ordered by [`ApprovalLevel::order`]; a higher level
/// granting an approval also covers every lower level still missing one.
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
pub enum ApprovalLevel {
    DirectManager,
    DepartmentHead,
    HumanResources,
}

impl ApprovalLevel {
    pub fn order(self) -> u8 {
        match self {
            ApprovalLevel::DirectManager => 1,
            ApprovalLevel::DepartmentHead => 2,
            ApprovalLevel::HumanResources => 3,
        }
    }

    pub fn from_order(order: u8) -> Option<Self> {
        Self::iter().find(|level| level.order() == order)
    }

    /// Permission name used when no override is configured.
    pub fn default_permission(self) -> &'static str {
        match self {
            ApprovalLevel::DirectManager => "leave.approve.direct_manager",
            ApprovalLevel::DepartmentHead => "leave.approve.department_head",
            ApprovalLevel::HumanResources => "leave.approve.human_resources",
        }
    }

    /// Every level strictly below this one, lowest first.
    pub fn below(self) -> impl Iterator<Item = ApprovalLevel> {
        Self::iter().filter(move |level| level.order() < self.order())
    }
}

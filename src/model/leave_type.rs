use chrono::Duration;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "name": "Vacation",
    "max_duration_ms": 1900800000,
    "resets_yearly": true
}))]
pub struct LeaveType {
    pub id: u64,
    pub name: String,
    /// Duration cap in milliseconds, `None` means unlimited
    pub max_duration_ms: Option<i64>,
    /// Whether the cap is a per-calendar-year budget
    pub resets_yearly: bool,
}

impl LeaveType {
    pub fn cap(&self) -> Option<Duration> {
        self.max_duration_ms.map(Duration::milliseconds)
    }
}

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "snake_case")]
pub enum LeaveType {
    Sick,
    Personal,
    OffCampus,
    Late,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema, Default,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "snake_case")]
pub enum LeaveStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    /// Pending is the sole non-terminal state; Approved and Rejected are final.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LeaveStatus::Approved | LeaveStatus::Rejected)
    }
}

/// A leave request as it flows through the whole system. API JSON is camelCase;
/// the SQL tier maps these fields onto snake_case columns at its own boundary.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRecord {
    #[schema(example = "a3f1c9e2-5b77-4d10-9f43-0c2d8e6b1a55")]
    pub id: String,

    #[schema(example = "t-1001")]
    pub teacher_id: String,

    #[schema(example = "Maria Santos")]
    pub teacher_name: String,

    #[serde(rename = "type")]
    #[schema(example = "sick")]
    pub leave_type: LeaveType,

    #[schema(example = "2024-06-03", value_type = String, format = "date")]
    pub start_date: NaiveDate,

    #[schema(example = "2024-06-04", value_type = String, format = "date")]
    pub end_date: NaiveDate,

    /// Present for off-campus and late records only.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "08:30:00", value_type = String, nullable = true)]
    pub start_time: Option<NaiveTime>,

    /// Present for off-campus records only.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "11:00:00", value_type = String, nullable = true)]
    pub end_time: Option<NaiveTime>,

    #[schema(example = "Flu, doctor's note attached")]
    pub reason: String,

    #[schema(example = "pending")]
    pub status: LeaveStatus,

    #[serde(rename = "signatureBase64", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = String, nullable = true)]
    pub teacher_signature: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Director R. Villanueva", nullable = true)]
    pub director_signature: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "2024-06-05", value_type = String, format = "date", nullable = true)]
    pub approved_date: Option<NaiveDate>,

    #[schema(example = "2024-06-01T08:00:00Z", value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

impl LeaveRecord {
    /// Day-consuming types count toward leave-day totals; the hour-based
    /// types (off-campus, late) contribute zero days.
    pub fn consumes_days(&self) -> bool {
        matches!(self.leave_type, LeaveType::Sick | LeaveType::Personal)
    }
}

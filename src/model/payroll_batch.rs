use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Lifecycle of a payroll batch. Transitions only move forward:
/// draft -> calculated -> approved -> paid. `paid` is set by billing,
/// never by this service.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BatchStatus {
    Draft,
    Calculated,
    Approved,
    Paid,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PayrollBatch {
    /// Deterministic key derived from the period, e.g. "2026-07"
    #[schema(example = "2026-07")]
    pub id: String,

    #[schema(example = 2026)]
    pub year: i32,

    #[schema(example = 7)]
    pub month: u32,

    #[schema(example = "calculated")]
    pub status: BatchStatus,

    #[schema(example = 12)]
    pub total_employees: u32,

    #[schema(example = 4800000)]
    pub total_gross_pay: i64,

    #[schema(example = 1231392)]
    pub total_deductions: i64,

    #[schema(example = 3568608)]
    pub total_net_pay: i64,

    #[schema(example = "2026-07-25T00:00:00Z", value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,

    #[schema(example = "2026-07-25T00:00:00Z", value_type = String, format = "date-time", nullable = true)]
    pub calculated_at: Option<DateTime<Utc>>,

    #[schema(example = "2026-07-28T00:00:00Z", value_type = String, format = "date-time", nullable = true)]
    pub approved_at: Option<DateTime<Utc>>,
}

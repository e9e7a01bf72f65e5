use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One employee's payslip line inside a batch. Records are owned by the
/// batch that created them and are dropped and regenerated whenever the
/// batch is recalculated.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PayrollRecord {
    pub id: String,
    pub employee_id: String,
    pub batch_id: String,
    pub year: i32,
    pub month: u32,
    pub base_salary: i64,
    pub overtime: i64,
    pub bonus: i64,
    pub gross_pay: i64,
    pub income_tax: i64,
    pub resident_tax: i64,
    pub employee_insurance: i64,
    pub health_insurance: i64,
    pub long_term_care_insurance: i64,
    pub pension_insurance: i64,
    pub total_social_insurance: i64,
    pub total_deductions: i64,
    pub net_pay: i64,
    #[schema(example = "2026-07-25T00:00:00Z", value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": "EMP-001",
        "name": "Tanaka Taro",
        "date_of_birth": "1980-04-12",
        "email": "tanaka.taro@company.co.jp",
        "department": "Engineering",
        "position": "Manager",
        "base_salary": 400000,
        "dependents": 1,
        "municipality": "Setagaya-ku",
        "join_date": "2015-04-01",
        "is_active": true
    })
)]
pub struct Employee {
    /// Stable external key, supplied by HR or generated on create
    #[schema(example = "EMP-001")]
    pub id: String,

    #[schema(example = "Tanaka Taro")]
    pub name: String,

    #[schema(example = "1980-04-12", value_type = String, format = "date")]
    pub date_of_birth: NaiveDate,

    #[schema(example = "tanaka.taro@company.co.jp")]
    pub email: String,

    #[schema(example = "Engineering")]
    pub department: String,

    #[schema(example = "Manager")]
    pub position: String,

    /// Monthly base salary in yen (minor units, no decimals)
    #[schema(example = 400000)]
    pub base_salary: i64,

    #[schema(example = 1)]
    pub dependents: u32,

    #[schema(example = "Setagaya-ku")]
    pub municipality: String,

    #[schema(example = "2015-04-01", value_type = String, format = "date")]
    pub join_date: NaiveDate,

    #[schema(example = true)]
    pub is_active: bool,
}

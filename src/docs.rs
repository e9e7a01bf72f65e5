use crate::api::employee::{CreateEmployee, EmployeeListResponse, EmployeeQuery};
use crate::api::payroll::CalculateBatch;
use crate::model::employee::Employee;
use crate::model::payroll_batch::{BatchStatus, PayrollBatch};
use crate::model::payroll_record::PayrollRecord;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Kyuyo Payroll API",
        version = "1.0.0",
        description = r#"
## Payroll Administration System

This API manages employee master data and the monthly payroll run.

### 🔹 Key Features
- **Employee Management**
  - Create, update, list, and view employee profiles
  - Bulk CSV import with new / updated / unchanged reconciliation
- **Payroll Management**
  - Calculate a monthly batch with statutory deductions per employee
  - Review batch records and approve a batch for payment

### 🔐 Security
Most endpoints are protected using **JWT Bearer authentication**.
Calculation, import and approval require the **Admin** role.

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,

        crate::api::import::bulk_import,

        crate::api::payroll::calculate_batch,
        crate::api::payroll::list_batches,
        crate::api::payroll::get_batch_records,
        crate::api::payroll::approve_batch
    ),
    components(
        schemas(
            Employee,
            CreateEmployee,
            EmployeeQuery,
            EmployeeListResponse,
            PayrollBatch,
            PayrollRecord,
            BatchStatus,
            CalculateBatch
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Employee", description = "Employee management APIs"),
        (name = "Payroll", description = "Payroll batch APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
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
}

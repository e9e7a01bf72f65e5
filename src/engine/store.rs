//! Persistence boundary for the payroll engine.
//!
//! The engine never talks to a connection pool directly; it goes through
//! [`PayrollStore`] so tests can swap in an in-memory fake. Each writing
//! method is one all-or-nothing transaction: readers never observe a
//! half-replaced batch or a half-applied import.

use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

use crate::engine::error::EngineResult;
use crate::model::employee::Employee;
use crate::model::payroll_batch::PayrollBatch;
use crate::model::payroll_record::PayrollRecord;

pub trait PayrollStore {
    async fn active_employees(&self) -> EngineResult<Vec<Employee>>;

    async fn all_employees(&self) -> EngineResult<Vec<Employee>>;

    async fn find_batch(&self, id: &str) -> EngineResult<Option<PayrollBatch>>;

    /// Newest batches first.
    async fn list_batches(&self) -> EngineResult<Vec<PayrollBatch>>;

    async fn batch_records(&self, batch_id: &str) -> EngineResult<Vec<PayrollRecord>>;

    /// Upsert the batch row and replace every record belonging to it, in
    /// one transaction.
    async fn replace_batch(
        &self,
        batch: &PayrollBatch,
        records: &[PayrollRecord],
    ) -> EngineResult<()>;

    /// Flip a `calculated` batch to `approved`, stamping `approved_at`.
    /// Returns false when the row was not in `calculated` state, so a
    /// racing approval cannot double-apply.
    async fn mark_approved(&self, id: &str, approved_at: DateTime<Utc>) -> EngineResult<bool>;

    /// Upsert employees keyed by id, in one transaction. Inserts default
    /// `is_active` to true; updates never touch the existing flag.
    async fn upsert_employees(&self, employees: &[Employee]) -> EngineResult<()>;
}

const EMPLOYEE_COLUMNS: &str =
    "id, name, date_of_birth, email, department, position, base_salary, dependents, municipality, join_date, is_active";

const BATCH_COLUMNS: &str =
    "id, year, month, status, total_employees, total_gross_pay, total_deductions, total_net_pay, created_at, calculated_at, approved_at";

const RECORD_COLUMNS: &str =
    "id, employee_id, batch_id, year, month, base_salary, overtime, bonus, gross_pay, income_tax, resident_tax, employee_insurance, health_insurance, long_term_care_insurance, pension_insurance, total_social_insurance, total_deductions, net_pay, created_at";

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

impl PayrollStore for MySqlStore {
    async fn active_employees(&self) -> EngineResult<Vec<Employee>> {
        let sql = format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE is_active = TRUE ORDER BY id"
        );
        Ok(sqlx::query_as::<_, Employee>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn all_employees(&self) -> EngineResult<Vec<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY id");
        Ok(sqlx::query_as::<_, Employee>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_batch(&self, id: &str) -> EngineResult<Option<PayrollBatch>> {
        let sql = format!("SELECT {BATCH_COLUMNS} FROM payroll_batches WHERE id = ?");
        Ok(sqlx::query_as::<_, PayrollBatch>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_batches(&self) -> EngineResult<Vec<PayrollBatch>> {
        let sql = format!("SELECT {BATCH_COLUMNS} FROM payroll_batches ORDER BY created_at DESC");
        Ok(sqlx::query_as::<_, PayrollBatch>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn batch_records(&self, batch_id: &str) -> EngineResult<Vec<PayrollRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM payroll_records WHERE batch_id = ? ORDER BY employee_id"
        );
        Ok(sqlx::query_as::<_, PayrollRecord>(&sql)
            .bind(batch_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn replace_batch(
        &self,
        batch: &PayrollBatch,
        records: &[PayrollRecord],
    ) -> EngineResult<()> {
        let mut tx = self.pool.begin().await?;

        // Records never outlive their batch: drop the old generation first.
        sqlx::query("DELETE FROM payroll_records WHERE batch_id = ?")
            .bind(&batch.id)
            .execute(&mut *tx)
            .await?;

        let batch_sql = format!(
            r#"
            INSERT INTO payroll_batches ({BATCH_COLUMNS})
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                status = VALUES(status),
                total_employees = VALUES(total_employees),
                total_gross_pay = VALUES(total_gross_pay),
                total_deductions = VALUES(total_deductions),
                total_net_pay = VALUES(total_net_pay),
                calculated_at = VALUES(calculated_at)
            "#
        );
        sqlx::query(&batch_sql)
            .bind(&batch.id)
            .bind(batch.year)
            .bind(batch.month)
            .bind(batch.status)
            .bind(batch.total_employees)
            .bind(batch.total_gross_pay)
            .bind(batch.total_deductions)
            .bind(batch.total_net_pay)
            .bind(batch.created_at)
            .bind(batch.calculated_at)
            .bind(batch.approved_at)
            .execute(&mut *tx)
            .await?;

        let record_sql = format!(
            r#"
            INSERT INTO payroll_records ({RECORD_COLUMNS})
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        );
        for record in records {
            sqlx::query(&record_sql)
                .bind(&record.id)
                .bind(&record.employee_id)
                .bind(&record.batch_id)
                .bind(record.year)
                .bind(record.month)
                .bind(record.base_salary)
                .bind(record.overtime)
                .bind(record.bonus)
                .bind(record.gross_pay)
                .bind(record.income_tax)
                .bind(record.resident_tax)
                .bind(record.employee_insurance)
                .bind(record.health_insurance)
                .bind(record.long_term_care_insurance)
                .bind(record.pension_insurance)
                .bind(record.total_social_insurance)
                .bind(record.total_deductions)
                .bind(record.net_pay)
                .bind(record.created_at)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn mark_approved(&self, id: &str, approved_at: DateTime<Utc>) -> EngineResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE payroll_batches
            SET status = 'approved', approved_at = ?
            WHERE id = ?
            AND status = 'calculated'
            "#,
        )
        .bind(approved_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn upsert_employees(&self, employees: &[Employee]) -> EngineResult<()> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            INSERT INTO employees ({EMPLOYEE_COLUMNS})
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                name = VALUES(name),
                date_of_birth = VALUES(date_of_birth),
                email = VALUES(email),
                department = VALUES(department),
                position = VALUES(position),
                base_salary = VALUES(base_salary),
                dependents = VALUES(dependents),
                municipality = VALUES(municipality),
                join_date = VALUES(join_date)
            "#
        );
        for employee in employees {
            sqlx::query(&sql)
                .bind(&employee.id)
                .bind(&employee.name)
                .bind(employee.date_of_birth)
                .bind(&employee.email)
                .bind(&employee.department)
                .bind(&employee.position)
                .bind(employee.base_salary)
                .bind(employee.dependents)
                .bind(&employee.municipality)
                .bind(employee.join_date)
                .bind(employee.is_active)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

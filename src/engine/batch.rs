//! Monthly batch calculation and approval.
//!
//! A batch is one calculation run for a (year, month) period. Recalculating
//! replaces the batch and all of its records atomically; the state machine
//! only moves forward (draft -> calculated -> approved -> paid), so an
//! approved or paid period can never be destructively recomputed.

use chrono::{NaiveDate, Utc};
use tracing::info;
use uuid::Uuid;

use crate::engine::calculator;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::rates::RateTables;
use crate::engine::store::PayrollStore;
use crate::model::payroll_batch::{BatchStatus, PayrollBatch};
use crate::model::payroll_record::PayrollRecord;

/// Deterministic batch key for a period, e.g. "2026-07".
pub fn period_id(year: i32, month: u32) -> String {
    format!("{year:04}-{month:02}")
}

pub struct BatchOrchestrator<S> {
    store: S,
}

impl<S: PayrollStore> BatchOrchestrator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Calculate (or recalculate) the batch for a period. Two invocations
    /// against an unchanged employee set produce identical totals; callers
    /// are responsible for serializing concurrent runs of the same period.
    pub async fn calculate(
        &self,
        year: i32,
        month: u32,
        evaluation_date: NaiveDate,
    ) -> EngineResult<PayrollBatch> {
        if !(1..=12).contains(&month) {
            return Err(EngineError::Validation {
                message: format!("month out of range: {month}"),
            });
        }

        let employees = self.store.active_employees().await?;
        if employees.is_empty() {
            return Err(EngineError::NoActiveEmployees);
        }

        let id = period_id(year, month);
        let existing = self.store.find_batch(&id).await?;
        if let Some(batch) = &existing {
            if matches!(batch.status, BatchStatus::Approved | BatchStatus::Paid) {
                return Err(EngineError::Conflict {
                    message: format!(
                        "batch {id} is already {} and cannot be recalculated",
                        batch.status
                    ),
                });
            }
        }

        let tables = RateTables::latest();
        let now = Utc::now();
        let mut records = Vec::with_capacity(employees.len());
        for employee in &employees {
            // Overtime and bonus are carried on the record but not yet
            // sourced from any input.
            let breakdown =
                calculator::compute(employee, employee.base_salary, 0, 0, evaluation_date, tables);
            records.push(PayrollRecord {
                id: Uuid::new_v4().to_string(),
                employee_id: employee.id.clone(),
                batch_id: id.clone(),
                year,
                month,
                base_salary: employee.base_salary,
                overtime: 0,
                bonus: 0,
                gross_pay: breakdown.gross_pay,
                income_tax: breakdown.income_tax,
                resident_tax: breakdown.resident_tax,
                employee_insurance: breakdown.employee_insurance,
                health_insurance: breakdown.health_insurance,
                long_term_care_insurance: breakdown.long_term_care_insurance,
                pension_insurance: breakdown.pension_insurance,
                total_social_insurance: breakdown.total_social_insurance,
                total_deductions: breakdown.total_deductions,
                net_pay: breakdown.net_pay,
                created_at: now,
            });
        }

        let batch = PayrollBatch {
            id: id.clone(),
            year,
            month,
            status: BatchStatus::Calculated,
            total_employees: records.len() as u32,
            total_gross_pay: records.iter().map(|r| r.gross_pay).sum(),
            total_deductions: records.iter().map(|r| r.total_deductions).sum(),
            total_net_pay: records.iter().map(|r| r.net_pay).sum(),
            created_at: existing.as_ref().map(|b| b.created_at).unwrap_or(now),
            calculated_at: Some(now),
            approved_at: None,
        };

        self.store.replace_batch(&batch, &records).await?;

        info!(
            batch_id = %batch.id,
            employees = batch.total_employees,
            total_net_pay = batch.total_net_pay,
            "Payroll batch calculated"
        );

        Ok(batch)
    }

    /// Approve a calculated batch. Anything else is a conflict; approval is
    /// the only transition this service performs (`paid` belongs to billing).
    pub async fn approve(&self, batch_id: &str) -> EngineResult<PayrollBatch> {
        let Some(batch) = self.store.find_batch(batch_id).await? else {
            return Err(EngineError::NotFound {
                entity: "payroll batch",
                id: batch_id.to_string(),
            });
        };

        if batch.status != BatchStatus::Calculated {
            return Err(EngineError::Conflict {
                message: format!("batch {batch_id} is {} and cannot be approved", batch.status),
            });
        }

        if !self.store.mark_approved(batch_id, Utc::now()).await? {
            // Lost a race with another approval between the read and the
            // guarded update.
            return Err(EngineError::Conflict {
                message: format!("batch {batch_id} is no longer awaiting approval"),
            });
        }

        info!(batch_id, "Payroll batch approved");

        self.store
            .find_batch(batch_id)
            .await?
            .ok_or_else(|| EngineError::NotFound {
                entity: "payroll batch",
                id: batch_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::memory::InMemoryStore;
    use crate::model::employee::Employee;

    fn employee(id: &str, base_salary: i64, is_active: bool) -> Employee {
        Employee {
            id: id.to_string(),
            name: format!("Employee {id}"),
            date_of_birth: NaiveDate::from_ymd_opt(1981, 1, 15).unwrap(),
            email: format!("{id}@example.com"),
            department: "Engineering".to_string(),
            position: "Staff".to_string(),
            base_salary,
            dependents: 1,
            municipality: "Setagaya-ku".to_string(),
            join_date: NaiveDate::from_ymd_opt(2015, 4, 1).unwrap(),
            is_active,
        }
    }

    fn eval_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, 25).unwrap()
    }

    #[test]
    fn period_id_is_zero_padded() {
        assert_eq!(period_id(2026, 7), "2026-07");
        assert_eq!(period_id(2026, 12), "2026-12");
    }

    #[actix_web::test]
    async fn calculate_persists_batch_and_records() {
        let store = InMemoryStore::with_employees(vec![
            employee("EMP-001", 400_000, true),
            employee("EMP-002", 300_000, true),
        ]);
        let orchestrator = BatchOrchestrator::new(store.clone());

        let batch = orchestrator.calculate(2026, 7, eval_date()).await.unwrap();

        assert_eq!(batch.id, "2026-07");
        assert_eq!(batch.status, BatchStatus::Calculated);
        assert_eq!(batch.total_employees, 2);
        assert!(batch.calculated_at.is_some());

        let records = store.records();
        assert_eq!(records.len(), 2);
        assert_eq!(
            batch.total_gross_pay,
            records.iter().map(|r| r.gross_pay).sum::<i64>()
        );
        assert_eq!(
            batch.total_deductions,
            records.iter().map(|r| r.total_deductions).sum::<i64>()
        );
        assert_eq!(
            batch.total_net_pay,
            records.iter().map(|r| r.net_pay).sum::<i64>()
        );
    }

    #[actix_web::test]
    async fn calculate_skips_inactive_employees() {
        let store = InMemoryStore::with_employees(vec![
            employee("EMP-001", 400_000, true),
            employee("EMP-002", 300_000, false),
        ]);
        let orchestrator = BatchOrchestrator::new(store.clone());

        let batch = orchestrator.calculate(2026, 7, eval_date()).await.unwrap();

        assert_eq!(batch.total_employees, 1);
        assert_eq!(store.records().len(), 1);
    }

    #[actix_web::test]
    async fn empty_active_set_fails_without_writes() {
        let store = InMemoryStore::with_employees(vec![employee("EMP-001", 400_000, false)]);
        let orchestrator = BatchOrchestrator::new(store.clone());

        let err = orchestrator
            .calculate(2026, 7, eval_date())
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::NoActiveEmployees));
        assert_eq!(store.batch_count(), 0);
        assert!(store.records().is_empty());
    }

    #[actix_web::test]
    async fn recompute_is_idempotent_and_replaces_records() {
        let store = InMemoryStore::with_employees(vec![employee("EMP-001", 400_000, true)]);
        let orchestrator = BatchOrchestrator::new(store.clone());

        let first = orchestrator.calculate(2026, 7, eval_date()).await.unwrap();
        let first_record_ids: Vec<String> =
            store.records().iter().map(|r| r.id.clone()).collect();

        let second = orchestrator.calculate(2026, 7, eval_date()).await.unwrap();

        assert_eq!(first.total_gross_pay, second.total_gross_pay);
        assert_eq!(first.total_deductions, second.total_deductions);
        assert_eq!(first.total_net_pay, second.total_net_pay);
        assert_eq!(store.batch_count(), 1);

        let records = store.records();
        assert_eq!(records.len(), 1);
        // old generation is gone, not appended to
        assert!(records.iter().all(|r| !first_record_ids.contains(&r.id)));
    }

    #[actix_web::test]
    async fn month_out_of_range_is_rejected() {
        let store = InMemoryStore::with_employees(vec![employee("EMP-001", 400_000, true)]);
        let orchestrator = BatchOrchestrator::new(store);

        let err = orchestrator
            .calculate(2026, 13, eval_date())
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Validation { .. }));
    }

    #[actix_web::test]
    async fn approve_requires_calculated_status() {
        let store = InMemoryStore::with_employees(vec![employee("EMP-001", 400_000, true)]);
        let orchestrator = BatchOrchestrator::new(store.clone());

        orchestrator.calculate(2026, 7, eval_date()).await.unwrap();
        let approved = orchestrator.approve("2026-07").await.unwrap();

        assert_eq!(approved.status, BatchStatus::Approved);
        assert!(approved.approved_at.is_some());

        // second approval conflicts
        let err = orchestrator.approve("2026-07").await.unwrap_err();
        assert!(matches!(err, EngineError::Conflict { .. }));
    }

    #[actix_web::test]
    async fn approve_unknown_batch_is_not_found() {
        let store = InMemoryStore::default();
        let orchestrator = BatchOrchestrator::new(store);

        let err = orchestrator.approve("2026-01").await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }

    #[actix_web::test]
    async fn approved_batch_cannot_be_recalculated() {
        let store = InMemoryStore::with_employees(vec![employee("EMP-001", 400_000, true)]);
        let orchestrator = BatchOrchestrator::new(store.clone());

        orchestrator.calculate(2026, 7, eval_date()).await.unwrap();
        orchestrator.approve("2026-07").await.unwrap();

        let err = orchestrator
            .calculate(2026, 7, eval_date())
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Conflict { .. }));
        // records of the approved batch are untouched
        assert_eq!(store.records().len(), 1);
    }
}

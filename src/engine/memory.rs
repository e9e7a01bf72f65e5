//! In-memory `PayrollStore` used by engine tests. Clones share state, the
//! same way cloned `MySqlStore`s share a pool.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::engine::error::EngineResult;
use crate::engine::store::PayrollStore;
use crate::model::employee::Employee;
use crate::model::payroll_batch::{BatchStatus, PayrollBatch};
use crate::model::payroll_record::PayrollRecord;

#[derive(Default)]
struct Inner {
    employees: Vec<Employee>,
    batches: HashMap<String, PayrollBatch>,
    records: Vec<PayrollRecord>,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryStore {
    pub fn with_employees(employees: Vec<Employee>) -> Self {
        let store = Self::default();
        store.inner.lock().unwrap().employees = employees;
        store
    }

    pub fn employees(&self) -> Vec<Employee> {
        self.inner.lock().unwrap().employees.clone()
    }

    pub fn records(&self) -> Vec<PayrollRecord> {
        self.inner.lock().unwrap().records.clone()
    }

    pub fn batch_count(&self) -> usize {
        self.inner.lock().unwrap().batches.len()
    }
}

impl PayrollStore for InMemoryStore {
    async fn active_employees(&self) -> EngineResult<Vec<Employee>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .employees
            .iter()
            .filter(|e| e.is_active)
            .cloned()
            .collect())
    }

    async fn all_employees(&self) -> EngineResult<Vec<Employee>> {
        Ok(self.inner.lock().unwrap().employees.clone())
    }

    async fn find_batch(&self, id: &str) -> EngineResult<Option<PayrollBatch>> {
        Ok(self.inner.lock().unwrap().batches.get(id).cloned())
    }

    async fn list_batches(&self) -> EngineResult<Vec<PayrollBatch>> {
        let mut batches: Vec<PayrollBatch> =
            self.inner.lock().unwrap().batches.values().cloned().collect();
        batches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(batches)
    }

    async fn batch_records(&self, batch_id: &str) -> EngineResult<Vec<PayrollRecord>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .records
            .iter()
            .filter(|r| r.batch_id == batch_id)
            .cloned()
            .collect())
    }

    async fn replace_batch(
        &self,
        batch: &PayrollBatch,
        records: &[PayrollRecord],
    ) -> EngineResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.records.retain(|r| r.batch_id != batch.id);
        inner.batches.insert(batch.id.clone(), batch.clone());
        inner.records.extend_from_slice(records);
        Ok(())
    }

    async fn mark_approved(&self, id: &str, approved_at: DateTime<Utc>) -> EngineResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        match inner.batches.get_mut(id) {
            Some(batch) if batch.status == BatchStatus::Calculated => {
                batch.status = BatchStatus::Approved;
                batch.approved_at = Some(approved_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn upsert_employees(&self, employees: &[Employee]) -> EngineResult<()> {
        let mut inner = self.inner.lock().unwrap();
        for candidate in employees {
            match inner.employees.iter_mut().find(|e| e.id == candidate.id) {
                Some(current) => {
                    // Updates never touch is_active.
                    let is_active = current.is_active;
                    *current = candidate.clone();
                    current.is_active = is_active;
                }
                None => inner.employees.push(candidate.clone()),
            }
        }
        Ok(())
    }
}

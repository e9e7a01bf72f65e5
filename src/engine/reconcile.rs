//! Bulk employee import: parse, classify, commit.
//!
//! The upload is a headered CSV with a fixed set of named columns in any
//! order. Parsing is tolerant (bad numbers fall back to 0, bad dates become
//! an explicit missing marker); committing is strict (one bad row aborts
//! the whole import before anything is written).

use std::io::Read;

use chrono::NaiveDate;
use csv::StringRecord;
use serde::Serialize;
use tracing::info;

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::store::PayrollStore;
use crate::model::employee::Employee;

/// One parsed candidate row. Dates that failed to parse are `None` so the
/// commit step can reject them explicitly instead of inventing a default.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    pub id: String,
    pub name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub email: String,
    pub department: String,
    pub position: String,
    pub base_salary: i64,
    pub dependents: u32,
    pub municipality: String,
    pub join_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportClass {
    New,
    Updated,
    Unchanged,
}

#[derive(Debug, Default, Serialize)]
pub struct ImportOutcome {
    pub new: usize,
    pub updated: usize,
    pub unchanged: usize,
}

// The statically declared column set; header lookup happens once, not per
// cell.
struct ColumnIndex {
    id: usize,
    name: usize,
    date_of_birth: usize,
    email: usize,
    department: usize,
    position: usize,
    base_salary: usize,
    dependents: usize,
    municipality: usize,
    join_date: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> EngineResult<Self> {
        let find = |column: &str| {
            headers
                .iter()
                .position(|h| h.trim() == column)
                .ok_or_else(|| EngineError::Validation {
                    message: format!("missing column: {column}"),
                })
        };

        Ok(Self {
            id: find("id")?,
            name: find("name")?,
            date_of_birth: find("date_of_birth")?,
            email: find("email")?,
            department: find("department")?,
            position: find("position")?,
            base_salary: find("base_salary")?,
            dependents: find("dependents")?,
            municipality: find("municipality")?,
            join_date: find("join_date")?,
        })
    }

    fn row(&self, record: &StringRecord) -> ImportRow {
        let cell = |index: usize| record.get(index).unwrap_or("").trim();

        ImportRow {
            id: cell(self.id).to_string(),
            name: cell(self.name).to_string(),
            date_of_birth: parse_date(cell(self.date_of_birth)),
            email: cell(self.email).to_string(),
            department: cell(self.department).to_string(),
            position: cell(self.position).to_string(),
            base_salary: parse_amount(cell(self.base_salary)),
            dependents: parse_count(cell(self.dependents)),
            municipality: cell(self.municipality).to_string(),
            join_date: parse_date(cell(self.join_date)),
        }
    }
}

// Typed per-column parsers. Numeric columns default to 0 when unparseable;
// dates stay optional and are validated at commit time.

fn parse_amount(raw: &str) -> i64 {
    raw.parse::<i64>().unwrap_or(0)
}

fn parse_count(raw: &str) -> u32 {
    raw.parse::<u32>().unwrap_or(0)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Parse a CSV upload into candidate rows.
pub fn parse<R: Read>(reader: R) -> EngineResult<Vec<ImportRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| EngineError::Validation {
            message: format!("unreadable CSV header: {e}"),
        })?
        .clone();
    let columns = ColumnIndex::from_headers(&headers)?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| EngineError::Validation {
            message: format!("unreadable CSV row: {e}"),
        })?;
        rows.push(columns.row(&record));
    }

    Ok(rows)
}

/// Classify each candidate against the current employee set: unseen id =>
/// new, any mutable field differing => updated, otherwise unchanged.
pub fn classify(candidates: &[ImportRow], existing: &[Employee]) -> Vec<ImportClass> {
    candidates
        .iter()
        .map(|row| match existing.iter().find(|e| e.id == row.id) {
            None => ImportClass::New,
            Some(current) if differs(row, current) => ImportClass::Updated,
            Some(_) => ImportClass::Unchanged,
        })
        .collect()
}

fn differs(row: &ImportRow, current: &Employee) -> bool {
    row.name != current.name
        || row.date_of_birth != Some(current.date_of_birth)
        || row.email != current.email
        || row.department != current.department
        || row.position != current.position
        || row.base_salary != current.base_salary
        || row.dependents != current.dependents
        || row.municipality != current.municipality
        || row.join_date != Some(current.join_date)
}

fn validate(row: &ImportRow) -> EngineResult<Employee> {
    if row.id.is_empty() {
        return Err(EngineError::Validation {
            message: "missing employee id in import row".to_string(),
        });
    }

    let Some(join_date) = row.join_date else {
        return Err(EngineError::Validation {
            message: format!("invalid join_date for employee {}", row.id),
        });
    };

    let Some(date_of_birth) = row.date_of_birth else {
        return Err(EngineError::Validation {
            message: format!("invalid date_of_birth for employee {}", row.id),
        });
    };

    Ok(Employee {
        id: row.id.clone(),
        name: row.name.clone(),
        date_of_birth,
        email: row.email.clone(),
        department: row.department.clone(),
        position: row.position.clone(),
        base_salary: row.base_salary,
        dependents: row.dependents,
        municipality: row.municipality.clone(),
        join_date,
        // not carried by the import format; inserts default to active,
        // updates keep the stored flag (store contract)
        is_active: true,
    })
}

pub struct ImportReconciler<S> {
    store: S,
}

impl<S: PayrollStore> ImportReconciler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Validate every candidate, then upsert the whole set in one
    /// transaction. A single invalid row aborts the import before any
    /// write happens.
    pub async fn commit(&self, candidates: &[ImportRow]) -> EngineResult<ImportOutcome> {
        let existing = self.store.all_employees().await?;
        let classes = classify(candidates, &existing);

        let mut upserts = Vec::with_capacity(candidates.len());
        for row in candidates {
            upserts.push(validate(row)?);
        }

        self.store.upsert_employees(&upserts).await?;

        let outcome = ImportOutcome {
            new: classes.iter().filter(|c| **c == ImportClass::New).count(),
            updated: classes.iter().filter(|c| **c == ImportClass::Updated).count(),
            unchanged: classes
                .iter()
                .filter(|c| **c == ImportClass::Unchanged)
                .count(),
        };

        info!(
            new = outcome.new,
            updated = outcome.updated,
            unchanged = outcome.unchanged,
            "Bulk import committed"
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::memory::InMemoryStore;

    const CSV_HEADER: &str =
        "id,name,date_of_birth,email,department,position,base_salary,dependents,municipality,join_date";

    fn existing_employee() -> Employee {
        Employee {
            id: "EMP-001".to_string(),
            name: "Tanaka Taro".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1980, 4, 12).unwrap(),
            email: "tanaka@example.com".to_string(),
            department: "Engineering".to_string(),
            position: "Manager".to_string(),
            base_salary: 400_000,
            dependents: 1,
            municipality: "Setagaya-ku".to_string(),
            join_date: NaiveDate::from_ymd_opt(2015, 4, 1).unwrap(),
            is_active: true,
        }
    }

    fn row_for(employee: &Employee) -> ImportRow {
        ImportRow {
            id: employee.id.clone(),
            name: employee.name.clone(),
            date_of_birth: Some(employee.date_of_birth),
            email: employee.email.clone(),
            department: employee.department.clone(),
            position: employee.position.clone(),
            base_salary: employee.base_salary,
            dependents: employee.dependents,
            municipality: employee.municipality.clone(),
            join_date: Some(employee.join_date),
        }
    }

    #[test]
    fn parses_rows_with_columns_in_any_order() {
        let csv = "join_date,id,name,date_of_birth,email,department,position,base_salary,dependents,municipality\n\
                   2015-04-01,EMP-001,Tanaka Taro,1980-04-12,tanaka@example.com,Engineering,Manager,400000,1,Setagaya-ku\n";
        let rows = parse(csv.as_bytes()).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "EMP-001");
        assert_eq!(rows[0].base_salary, 400_000);
        assert_eq!(rows[0].join_date, NaiveDate::from_ymd_opt(2015, 4, 1));
    }

    #[test]
    fn missing_column_fails_parse() {
        let csv = "id,name\nEMP-001,Tanaka Taro\n";
        let err = parse(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, EngineError::Validation { .. }));
    }

    #[test]
    fn bad_numbers_default_to_zero_and_bad_dates_stay_missing() {
        let csv = format!(
            "{CSV_HEADER}\nEMP-002,Sato Hanako,not-a-date,sato@example.com,Sales,Staff,abc,x,Meguro-ku,2020-10-01\n"
        );
        let rows = parse(csv.as_bytes()).unwrap();

        assert_eq!(rows[0].base_salary, 0);
        assert_eq!(rows[0].dependents, 0);
        assert_eq!(rows[0].date_of_birth, None);
        assert!(rows[0].join_date.is_some());
    }

    #[test]
    fn classify_new_updated_unchanged() {
        let current = existing_employee();

        let unchanged = row_for(&current);

        let mut updated = row_for(&current);
        updated.base_salary = 420_000;

        let mut new = row_for(&current);
        new.id = "EMP-099".to_string();

        let classes = classify(&[unchanged, updated, new], &[current]);
        assert_eq!(
            classes,
            vec![ImportClass::Unchanged, ImportClass::Updated, ImportClass::New]
        );
    }

    #[test]
    fn changing_any_single_field_reclassifies_as_updated() {
        let current = existing_employee();

        let mut row = row_for(&current);
        row.municipality = "Meguro-ku".to_string();
        assert_eq!(classify(&[row], &[current.clone()]), vec![ImportClass::Updated]);

        let mut row = row_for(&current);
        row.join_date = NaiveDate::from_ymd_opt(2016, 4, 1);
        assert_eq!(classify(&[row], &[current]), vec![ImportClass::Updated]);
    }

    #[actix_web::test]
    async fn commit_upserts_and_reports_counts() {
        let current = existing_employee();
        let store = InMemoryStore::with_employees(vec![current.clone()]);
        let reconciler = ImportReconciler::new(store.clone());

        let mut updated = row_for(&current);
        updated.base_salary = 420_000;

        let mut new = row_for(&current);
        new.id = "EMP-099".to_string();
        new.email = "new@example.com".to_string();

        let outcome = reconciler.commit(&[updated, new]).await.unwrap();

        assert_eq!(outcome.new, 1);
        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.unchanged, 0);

        let employees = store.employees();
        assert_eq!(employees.len(), 2);
        assert_eq!(
            employees.iter().find(|e| e.id == "EMP-001").unwrap().base_salary,
            420_000
        );
        assert!(employees.iter().find(|e| e.id == "EMP-099").unwrap().is_active);
    }

    #[actix_web::test]
    async fn commit_preserves_is_active_on_update() {
        let mut current = existing_employee();
        current.is_active = false;
        let store = InMemoryStore::with_employees(vec![current.clone()]);
        let reconciler = ImportReconciler::new(store.clone());

        let mut updated = row_for(&current);
        updated.base_salary = 410_000;

        reconciler.commit(&[updated]).await.unwrap();

        let stored = store.employees();
        assert_eq!(stored[0].base_salary, 410_000);
        assert!(!stored[0].is_active, "update must not reactivate an employee");
    }

    #[actix_web::test]
    async fn one_invalid_row_aborts_the_whole_commit() {
        let current = existing_employee();
        let store = InMemoryStore::with_employees(vec![current.clone()]);
        let reconciler = ImportReconciler::new(store.clone());

        let mut good = row_for(&current);
        good.base_salary = 999_999;

        let mut bad = row_for(&current);
        bad.id = "EMP-050".to_string();
        bad.join_date = None;

        let err = reconciler.commit(&[good, bad]).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation { .. }));

        // nothing was written, including the valid row
        let stored = store.employees();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].base_salary, 400_000);
    }
}

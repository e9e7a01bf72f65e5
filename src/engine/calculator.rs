//! Per-employee payroll calculation.
//!
//! Pure and deterministic: no clock, no I/O. Age-dependent rules take an
//! explicit evaluation date so a batch can be replayed bit-for-bit. All
//! amounts are integer yen; every division is an explicit floor.
//!
//! Out-of-range business inputs (a negative salary, say) are not rejected
//! here; the result is derived arithmetic either way and validation is the
//! caller's job.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::engine::rates::{LONG_TERM_CARE_AGE, RateTables, WithholdingBracket};
use crate::model::employee::Employee;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PayrollBreakdown {
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
}

/// Completed years of age on `evaluation_date`, counting a year only once
/// the birthday has passed.
pub fn age_on(date_of_birth: NaiveDate, evaluation_date: NaiveDate) -> i32 {
    let mut age = evaluation_date.year() - date_of_birth.year();
    if (evaluation_date.month(), evaluation_date.day())
        < (date_of_birth.month(), date_of_birth.day())
    {
        age -= 1;
    }
    age
}

/// Monthly withholding: pick the bracket with the largest `min` not above
/// the salary base, then index its tax column by dependents (capped at the
/// last column). Below the smallest bracket no tax is withheld.
fn withholding_tax(salary_base: i64, dependents: u32, table: &[WithholdingBracket]) -> i64 {
    for bracket in table.iter().rev() {
        if salary_base >= bracket.min {
            let column = (dependents as usize).min(bracket.taxes.len() - 1);
            return bracket.taxes[column];
        }
    }
    0
}

fn resident_tax(annual_income: i64, dependents: u32, tables: &RateTables) -> i64 {
    let taxable = annual_income - i64::from(dependents) * tables.dependent_deduction;
    let adjusted = (taxable - tables.basic_deduction).max(0);
    let annual_tax = tables.resident_tax.apply(adjusted);
    annual_tax.div_euclid(12)
}

pub fn compute(
    employee: &Employee,
    base_salary: i64,
    overtime: i64,
    bonus: i64,
    evaluation_date: NaiveDate,
    tables: &RateTables,
) -> PayrollBreakdown {
    let gross_pay = base_salary + overtime + bonus;

    let employee_insurance = tables.employment_insurance.apply(gross_pay);
    let health_insurance = tables.health_insurance.apply(gross_pay);
    let pension_insurance = tables.pension_insurance.apply(gross_pay);

    let age = age_on(employee.date_of_birth, evaluation_date);
    let long_term_care_insurance = if LONG_TERM_CARE_AGE.contains(&age) {
        tables.long_term_care_insurance.apply(gross_pay)
    } else {
        0
    };

    let total_social_insurance =
        employee_insurance + health_insurance + pension_insurance + long_term_care_insurance;

    let income_tax = withholding_tax(
        gross_pay - total_social_insurance,
        employee.dependents,
        tables.withholding,
    );
    let resident_tax = resident_tax(gross_pay * 12, employee.dependents, tables);

    let total_deductions = income_tax + resident_tax + total_social_insurance;
    let net_pay = gross_pay - total_deductions;

    PayrollBreakdown {
        gross_pay,
        income_tax,
        resident_tax,
        employee_insurance,
        health_insurance,
        long_term_care_insurance,
        pension_insurance,
        total_social_insurance,
        total_deductions,
        net_pay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(date_of_birth: NaiveDate, dependents: u32, base_salary: i64) -> Employee {
        Employee {
            id: "EMP-001".to_string(),
            name: "Tanaka Taro".to_string(),
            date_of_birth,
            email: "tanaka@example.com".to_string(),
            department: "Engineering".to_string(),
            position: "Manager".to_string(),
            base_salary,
            dependents,
            municipality: "Setagaya-ku".to_string(),
            join_date: NaiveDate::from_ymd_opt(2015, 4, 1).unwrap(),
            is_active: true,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn worked_example_400k_one_dependent_age_45() {
        let emp = employee(date(1981, 1, 15), 1, 400_000);
        let breakdown = compute(&emp, 400_000, 0, 0, date(2026, 7, 25), RateTables::latest());

        assert_eq!(breakdown.gross_pay, 400_000);
        assert_eq!(breakdown.employee_insurance, 2_400);
        assert_eq!(breakdown.health_insurance, 19_800);
        assert_eq!(breakdown.pension_insurance, 36_600);
        assert_eq!(breakdown.long_term_care_insurance, 3_640);
        assert_eq!(breakdown.total_social_insurance, 62_440);
        // salary base 337560 lands in the {min: 300000} bracket, column 1
        assert_eq!(breakdown.income_tax, 6_510);
        // annual 4_800_000 - 330_000 - 430_000 = 4_040_000; 10% / 12
        assert_eq!(breakdown.resident_tax, 33_666);
        assert_eq!(breakdown.net_pay, 400_000 - (6_510 + 33_666 + 62_440));
    }

    #[test]
    fn breakdown_identities_hold() {
        let emp = employee(date(1990, 6, 1), 2, 320_000);
        let b = compute(&emp, 320_000, 15_000, 10_000, date(2026, 7, 25), RateTables::latest());

        assert_eq!(b.gross_pay, 320_000 + 15_000 + 10_000);
        assert_eq!(
            b.total_social_insurance,
            b.employee_insurance
                + b.health_insurance
                + b.pension_insurance
                + b.long_term_care_insurance
        );
        assert_eq!(
            b.total_deductions,
            b.income_tax + b.resident_tax + b.total_social_insurance
        );
        assert_eq!(b.net_pay, b.gross_pay - b.total_deductions);
    }

    #[test]
    fn age_counts_birthday_not_calendar_year() {
        let dob = date(1986, 8, 20);
        // birthday not yet reached in 2026
        assert_eq!(age_on(dob, date(2026, 8, 19)), 39);
        assert_eq!(age_on(dob, date(2026, 8, 20)), 40);
    }

    #[test]
    fn long_term_care_only_within_40_to_65() {
        let tables = RateTables::latest();
        let cases = [
            (date(1986, 8, 20), date(2026, 8, 19), 0),     // 39
            (date(1986, 8, 20), date(2026, 8, 20), 2_730), // turned 40 today
            (date(1962, 1, 1), date(2026, 7, 25), 2_730),  // 64
            (date(1961, 7, 25), date(2026, 7, 25), 0),     // turned 65 today
        ];
        for (dob, eval, expected) in cases {
            let b = compute(&employee(dob, 0, 300_000), 300_000, 0, 0, eval, tables);
            assert_eq!(b.long_term_care_insurance, expected, "dob {dob} eval {eval}");
        }
    }

    #[test]
    fn withholding_below_smallest_bracket_is_zero() {
        let b = compute(
            &employee(date(2000, 1, 1), 0, 80_000),
            80_000,
            0,
            0,
            date(2026, 7, 25),
            RateTables::latest(),
        );
        assert_eq!(b.income_tax, 0);
    }

    #[test]
    fn withholding_is_non_decreasing_across_brackets() {
        let tables = RateTables::latest();
        let mut previous = 0;
        for salary_base in (88_000..=420_000).step_by(1_000) {
            let tax = super::withholding_tax(salary_base, 0, tables.withholding);
            assert!(tax >= previous, "tax dropped at salary base {salary_base}");
            previous = tax;
        }
    }

    #[test]
    fn dependents_beyond_last_column_use_last_column() {
        let tables = RateTables::latest();
        let capped = super::withholding_tax(337_560, 9, tables.withholding);
        let last = super::withholding_tax(337_560, 2, tables.withholding);
        assert_eq!(capped, last);
    }

    #[test]
    fn resident_tax_floors_at_zero_for_low_income() {
        let b = compute(
            &employee(date(2000, 1, 1), 3, 30_000),
            30_000,
            0,
            0,
            date(2026, 7, 25),
            RateTables::latest(),
        );
        assert_eq!(b.resident_tax, 0);
    }

    #[test]
    fn negative_salary_still_produces_a_breakdown() {
        // Shape-valid garbage in, derived garbage out; the orchestrator is
        // the one that validates inputs.
        let b = compute(
            &employee(date(1990, 1, 1), 0, -10_000),
            -10_000,
            0,
            0,
            date(2026, 7, 25),
            RateTables::latest(),
        );
        assert_eq!(b.gross_pay, -10_000);
        assert_eq!(b.net_pay, b.gross_pay - b.total_deductions);
    }
}

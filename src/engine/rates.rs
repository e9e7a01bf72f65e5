//! Statutory rate data: insurance rates and the monthly withholding table.
//!
//! Tables are versioned by year of publication. Everything here is plain
//! data; the calculator decides how it is applied.

use std::ops::Range;

/// A statutory percentage expressed as an integer fraction so that
/// applying it stays in integer arithmetic with an explicit floor.
#[derive(Debug, Clone, Copy)]
pub struct Rate {
    numer: i64,
    denom: i64,
}

impl Rate {
    pub const fn new(numer: i64, denom: i64) -> Self {
        Self { numer, denom }
    }

    /// Floor division, not truncation: negative amounts round toward
    /// negative infinity, matching the tax tables' floor semantics.
    pub fn apply(&self, amount: i64) -> i64 {
        (amount * self.numer).div_euclid(self.denom)
    }
}

/// One tier of the monthly withholding table. `taxes` is indexed by
/// dependents count; counts past the last entry use the last entry.
#[derive(Debug, Clone, Copy)]
pub struct WithholdingBracket {
    pub min: i64,
    pub taxes: [i64; 3],
}

/// Long-term care insurance is withheld from age 40 up to (not including) 65.
pub const LONG_TERM_CARE_AGE: Range<i32> = 40..65;

pub struct RateTables {
    pub version: &'static str,
    pub employment_insurance: Rate,
    pub health_insurance: Rate,
    pub long_term_care_insurance: Rate,
    pub pension_insurance: Rate,
    /// Sorted ascending by `min`.
    pub withholding: &'static [WithholdingBracket],
    /// Annual resident-tax deduction per dependent.
    pub dependent_deduction: i64,
    /// Annual resident-tax basic deduction.
    pub basic_deduction: i64,
    pub resident_tax: Rate,
}

impl RateTables {
    pub fn latest() -> &'static RateTables {
        &TABLES_2025
    }
}

static WITHHOLDING_2025: [WithholdingBracket; 8] = [
    WithholdingBracket { min: 88_000, taxes: [290, 0, 0] },
    WithholdingBracket { min: 93_000, taxes: [810, 0, 0] },
    WithholdingBracket { min: 150_000, taxes: [3_130, 1_200, 0] },
    WithholdingBracket { min: 200_000, taxes: [4_950, 3_000, 1_050] },
    WithholdingBracket { min: 250_000, taxes: [6_690, 4_740, 2_790] },
    WithholdingBracket { min: 300_000, taxes: [8_470, 6_510, 4_560] },
    WithholdingBracket { min: 350_000, taxes: [10_630, 8_680, 6_730] },
    WithholdingBracket { min: 400_000, taxes: [15_440, 13_490, 11_540] },
];

static TABLES_2025: RateTables = RateTables {
    version: "2025",
    employment_insurance: Rate::new(6, 1_000),       // 0.6%
    health_insurance: Rate::new(495, 10_000),        // 4.95%
    long_term_care_insurance: Rate::new(91, 10_000), // 0.91%
    pension_insurance: Rate::new(915, 10_000),       // 9.15%
    withholding: &WITHHOLDING_2025,
    dependent_deduction: 330_000,
    basic_deduction: 430_000,
    resident_tax: Rate::new(10, 100),
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_apply_floors() {
        let rate = Rate::new(6, 1_000);
        assert_eq!(rate.apply(400_000), 2_400);
        assert_eq!(rate.apply(333), 1); // 1.998 floors to 1
    }

    #[test]
    fn rate_apply_floors_toward_negative_infinity() {
        let rate = Rate::new(1, 10);
        assert_eq!(rate.apply(-5), -1);
    }

    #[test]
    fn withholding_table_is_sorted_ascending() {
        let mins: Vec<i64> = TABLES_2025.withholding.iter().map(|b| b.min).collect();
        let mut sorted = mins.clone();
        sorted.sort();
        assert_eq!(mins, sorted);
    }
}

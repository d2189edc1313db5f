//! Salary slip document and its earning/deduction child rows.
//!
//! The [`SalarySlip`] is an in-memory projection of the host document. The
//! hook only mutates its `deductions` list and the derived totals; the host
//! loads and persists it.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::DocStatus;

/// A single earning row on a salary slip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarningLine {
    /// The salary component name (e.g. "Basic").
    pub salary_component: String,
    /// The amount; absent when the stored value was missing or non-numeric.
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: Option<Decimal>,
    /// Component-wise year-to-date total, filled by recomputation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_to_date: Option<Decimal>,
}

impl EarningLine {
    /// Creates an earning row with a known amount.
    pub fn new(salary_component: impl Into<String>, amount: Decimal) -> Self {
        Self {
            salary_component: salary_component.into(),
            amount: Some(amount),
            year_to_date: None,
        }
    }
}

/// A single deduction row on a salary slip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeductionLine {
    /// The salary component name (e.g. "Professional Tax").
    pub salary_component: String,
    /// The deducted amount.
    #[serde(default)]
    pub amount: Decimal,
    /// Copied from the salary component when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on_payment_days: Option<bool>,
    /// Copied from the salary component when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exempted_from_income_tax: Option<bool>,
    /// Component-wise year-to-date total, filled by recomputation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_to_date: Option<Decimal>,
}

impl DeductionLine {
    /// Creates a deduction row without component flags.
    pub fn new(salary_component: impl Into<String>, amount: Decimal) -> Self {
        Self {
            salary_component: salary_component.into(),
            amount,
            depends_on_payment_days: None,
            exempted_from_income_tax: None,
            year_to_date: None,
        }
    }
}

/// A salary slip under evaluation.
///
/// # Example
///
/// ```
/// use professional_tax::models::{EarningLine, SalarySlip};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let mut slip = SalarySlip::new(
///     "Sal Slip/HR-EMP-00001/00001",
///     "HR-EMP-00001",
///     NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
/// );
/// slip.earnings.push(EarningLine::new("Basic", Decimal::new(25000, 0)));
/// assert_eq!(slip.earnings_total(), Some(Decimal::new(25000, 0)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalarySlip {
    /// Document name.
    #[serde(default)]
    pub name: String,
    /// The employee the slip is for; empty when the document is malformed.
    #[serde(default)]
    pub employee: String,
    /// Employee display name.
    #[serde(default)]
    pub employee_name: Option<String>,
    /// Issuing company.
    #[serde(default)]
    pub company: Option<String>,
    /// Lifecycle state.
    #[serde(default)]
    pub docstatus: DocStatus,
    /// First day of the pay period.
    pub start_date: NaiveDate,
    /// Last day of the pay period.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Posting date.
    #[serde(default)]
    pub posting_date: Option<NaiveDate>,
    /// Days paid in this period.
    #[serde(default, deserialize_with = "lenient_amount")]
    pub payment_days: Option<Decimal>,
    /// Working days in this period.
    #[serde(default, deserialize_with = "lenient_amount")]
    pub total_working_days: Option<Decimal>,
    /// Explicitly assigned salary structure.
    #[serde(default)]
    pub salary_structure: Option<String>,
    /// Slip currency.
    #[serde(default)]
    pub currency: Option<String>,
    /// Earning rows in stored order.
    #[serde(default)]
    pub earnings: Vec<EarningLine>,
    /// Deduction rows in stored order.
    #[serde(default)]
    pub deductions: Vec<DeductionLine>,
    /// Gross pay scalar; used as a fallback when earnings sum to zero.
    #[serde(default, deserialize_with = "lenient_amount")]
    pub gross_pay: Option<Decimal>,
    /// Sum of all deductions.
    #[serde(default, deserialize_with = "lenient_amount")]
    pub total_deduction: Option<Decimal>,
    /// Gross pay minus total deduction.
    #[serde(default, deserialize_with = "lenient_amount")]
    pub net_pay: Option<Decimal>,
    /// Net pay accumulated over the fiscal year.
    #[serde(default, deserialize_with = "lenient_amount")]
    pub year_to_date: Option<Decimal>,
    /// Net pay accumulated over the calendar month.
    #[serde(default, deserialize_with = "lenient_amount")]
    pub month_to_date: Option<Decimal>,
}

impl SalarySlip {
    /// Creates an empty draft slip for an employee and period start.
    pub fn new(
        name: impl Into<String>,
        employee: impl Into<String>,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            name: name.into(),
            employee: employee.into(),
            employee_name: None,
            company: None,
            docstatus: DocStatus::Draft,
            start_date,
            end_date: None,
            posting_date: None,
            payment_days: None,
            total_working_days: None,
            salary_structure: None,
            currency: None,
            earnings: Vec::new(),
            deductions: Vec::new(),
            gross_pay: None,
            total_deduction: None,
            net_pay: None,
            year_to_date: None,
            month_to_date: None,
        }
    }

    /// Sums earning amounts; missing amounts contribute zero.
    ///
    /// Returns `None` if the sum overflows.
    pub fn earnings_total(&self) -> Option<Decimal> {
        checked_sum(self.earnings.iter().filter_map(|line| line.amount))
    }

    /// Sums deduction amounts, or `None` on overflow.
    pub fn deductions_total(&self) -> Option<Decimal> {
        checked_sum(self.deductions.iter().map(|line| line.amount))
    }

    /// Finds the deduction row for a component.
    pub fn deduction(&self, component: &str) -> Option<&DeductionLine> {
        self.deductions
            .iter()
            .find(|line| line.salary_component == component)
    }

    /// Finds the deduction row for a component, mutably.
    pub fn deduction_mut(&mut self, component: &str) -> Option<&mut DeductionLine> {
        self.deductions
            .iter_mut()
            .find(|line| line.salary_component == component)
    }
}

fn checked_sum(mut amounts: impl Iterator<Item = Decimal>) -> Option<Decimal> {
    amounts.try_fold(Decimal::ZERO, |total, amount| total.checked_add(amount))
}

/// Accepts a number, a numeric string, or anything else (treated as absent).
fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Number(Decimal),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Lenient::deserialize(deserializer)? {
        Lenient::Number(value) => Some(value),
        Lenient::Text(text) => text.trim().parse::<Decimal>().ok(),
        Lenient::Other(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_non_numeric_earning_amount_deserializes_as_absent() {
        let json = r#"{
            "employee": "HR-EMP-00001",
            "start_date": "2026-04-01",
            "earnings": [
                { "salary_component": "Basic", "amount": 1000 },
                { "salary_component": "HRA", "amount": "n/a" },
                { "salary_component": "Bonus", "amount": null },
                { "salary_component": "Arrears" },
                { "salary_component": "Overtime", "amount": "250.50" }
            ]
        }"#;

        let slip: SalarySlip = serde_json::from_str(json).unwrap();
        assert_eq!(slip.earnings[0].amount, Some(dec("1000")));
        assert_eq!(slip.earnings[1].amount, None);
        assert_eq!(slip.earnings[2].amount, None);
        assert_eq!(slip.earnings[3].amount, None);
        assert_eq!(slip.earnings_total(), Some(dec("1250.50")));
    }

    #[test]
    fn test_deduction_lookup_by_component() {
        let mut slip = SalarySlip::new("slip", "emp", NaiveDate::from_ymd_opt(2026, 4, 1).unwrap());
        slip.deductions.push(DeductionLine::new("Provident Fund", dec("1800")));
        slip.deductions.push(DeductionLine::new("Professional Tax", dec("200")));

        assert_eq!(slip.deduction("Professional Tax").unwrap().amount, dec("200"));
        assert!(slip.deduction("TDS").is_none());

        slip.deduction_mut("Provident Fund").unwrap().amount = dec("0");
        assert_eq!(slip.deductions_total(), Some(dec("200")));
    }

    #[test]
    fn test_deduction_flags_skipped_when_absent() {
        let line = DeductionLine::new("Professional Tax", dec("200"));
        let json = serde_json::to_string(&line).unwrap();
        assert!(!json.contains("depends_on_payment_days"));
        assert!(!json.contains("year_to_date"));
    }

    #[test]
    fn test_missing_employee_field_defaults_to_empty() {
        let json = r#"{ "start_date": "2026-04-01" }"#;
        let slip: SalarySlip = serde_json::from_str(json).unwrap();
        assert!(slip.employee.is_empty());
        assert_eq!(slip.docstatus, DocStatus::Draft);
    }
}

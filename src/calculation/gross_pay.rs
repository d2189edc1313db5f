//! Gross pay resolution.
//!
//! The formula sees a single `gross_pay` figure. It is the sum of the slip's
//! earning rows, or the slip's own `gross_pay` field when the rows sum to
//! zero or less.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, SalarySlip};

/// Where the resolved gross pay came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrossPaySource {
    /// The sum of the earning rows.
    Earnings,
    /// The slip's `gross_pay` field.
    SlipField,
}

/// The result of resolving gross pay, including the audit step.
#[derive(Debug, Clone)]
pub struct GrossPayResult {
    /// The resolved amount; may be zero or negative.
    pub gross_pay: Decimal,
    /// Where the amount came from.
    pub source: GrossPaySource,
    /// The audit step recording this resolution.
    pub audit_step: AuditStep,
}

impl GrossPayResult {
    /// Returns true if a deduction can be computed from this amount.
    pub fn is_positive(&self) -> bool {
        self.gross_pay > Decimal::ZERO
    }
}

/// Resolves gross pay for a slip.
///
/// Missing or non-numeric earning amounts contribute zero. If the earnings
/// sum to zero or less, the slip's `gross_pay` field is used instead (a
/// missing field counts as zero).
///
/// # Examples
///
/// ```
/// use professional_tax::calculation::{GrossPaySource, resolve_gross_pay};
/// use professional_tax::models::SalarySlip;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let mut slip = SalarySlip::new("slip", "emp", NaiveDate::from_ymd_opt(2026, 4, 1).unwrap());
/// slip.gross_pay = Some(Decimal::new(18000, 0));
///
/// let result = resolve_gross_pay(&slip, 1).unwrap();
/// assert_eq!(result.gross_pay, Decimal::new(18000, 0));
/// assert_eq!(result.source, GrossPaySource::SlipField);
/// ```
pub fn resolve_gross_pay(doc: &SalarySlip, step_number: u32) -> EngineResult<GrossPayResult> {
    let earnings_total = doc
        .earnings_total()
        .ok_or_else(|| EngineError::CalculationError {
            message: format!("earnings on salary slip '{}' overflow", doc.name),
        })?;

    let (gross_pay, source) = if earnings_total > Decimal::ZERO {
        (earnings_total, GrossPaySource::Earnings)
    } else {
        (
            doc.gross_pay.unwrap_or(Decimal::ZERO),
            GrossPaySource::SlipField,
        )
    };

    let reasoning = match source {
        GrossPaySource::Earnings => format!(
            "Sum of {} earning row(s) = {}",
            doc.earnings.len(),
            gross_pay.normalize()
        ),
        GrossPaySource::SlipField => format!(
            "Earnings sum to {}; using slip gross_pay = {}",
            earnings_total.normalize(),
            gross_pay.normalize()
        ),
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "gross_pay".to_string(),
        rule_name: "Gross Pay".to_string(),
        input: serde_json::json!({
            "earning_rows": doc.earnings.len(),
            "earnings_total": earnings_total.normalize().to_string(),
            "slip_gross_pay": doc.gross_pay.map(|g| g.normalize().to_string()),
        }),
        output: serde_json::json!({
            "gross_pay": gross_pay.normalize().to_string(),
            "source": source,
        }),
        reasoning,
    };

    Ok(GrossPayResult {
        gross_pay,
        source,
        audit_step,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EarningLine;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn slip() -> SalarySlip {
        SalarySlip::new(
            "Sal Slip/HR-EMP-00001/00001",
            "HR-EMP-00001",
            NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
        )
    }

    #[test]
    fn test_sums_earnings_ignoring_missing_amounts() {
        let mut doc = slip();
        doc.earnings.push(EarningLine::new("Basic", dec("20000")));
        doc.earnings.push(EarningLine {
            salary_component: "Bonus".to_string(),
            amount: None,
            year_to_date: None,
        });
        doc.earnings.push(EarningLine::new("House Rent Allowance", dec("8000.50")));
        doc.gross_pay = Some(dec("1"));

        let result = resolve_gross_pay(&doc, 4).unwrap();
        assert_eq!(result.gross_pay, dec("28000.50"));
        assert_eq!(result.source, GrossPaySource::Earnings);
        assert_eq!(result.audit_step.step_number, 4);
        assert!(result.is_positive());
    }

    #[test]
    fn test_falls_back_when_earnings_are_non_positive() {
        let mut doc = slip();
        doc.earnings.push(EarningLine::new("Basic", dec("100")));
        doc.earnings.push(EarningLine::new("Recovery", dec("-100")));
        doc.gross_pay = Some(dec("15000"));

        let result = resolve_gross_pay(&doc, 1).unwrap();
        assert_eq!(result.gross_pay, dec("15000"));
        assert_eq!(result.source, GrossPaySource::SlipField);
    }

    #[test]
    fn test_zero_everywhere_is_not_positive() {
        let result = resolve_gross_pay(&slip(), 1).unwrap();
        assert_eq!(result.gross_pay, Decimal::ZERO);
        assert!(!result.is_positive());
    }

    #[test]
    fn test_overflowing_earnings_is_a_calculation_error() {
        let mut doc = slip();
        doc.earnings.push(EarningLine::new("A", Decimal::MAX));
        doc.earnings.push(EarningLine::new("B", Decimal::MAX));

        let err = resolve_gross_pay(&doc, 1).unwrap_err();
        assert!(matches!(err, EngineError::CalculationError { .. }));
    }
}

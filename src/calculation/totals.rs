//! Derived slip totals recomputed after a deduction changes.
//!
//! Net pay follows from the earning and deduction rows. Year-to-date and
//! month-to-date figures add this slip to the submitted slips of the same
//! employee in the same fiscal year or calendar month.

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};
use crate::models::SalarySlip;

fn overflow(what: &str, doc: &SalarySlip) -> EngineError {
    EngineError::CalculationError {
        message: format!("{} on salary slip '{}' overflows", what, doc.name),
    }
}

fn add(a: Decimal, b: Decimal, what: &str, doc: &SalarySlip) -> EngineResult<Decimal> {
    a.checked_add(b).ok_or_else(|| overflow(what, doc))
}

/// Returns the first and last day of the fiscal year containing `date`.
///
/// # Examples
///
/// ```
/// use professional_tax::calculation::fiscal_year_bounds;
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2026, 2, 15).unwrap();
/// let (start, end) = fiscal_year_bounds(date, 4).unwrap();
/// assert_eq!(start, NaiveDate::from_ymd_opt(2025, 4, 1).unwrap());
/// assert_eq!(end, NaiveDate::from_ymd_opt(2026, 3, 31).unwrap());
/// ```
pub fn fiscal_year_bounds(date: NaiveDate, start_month: u32) -> EngineResult<(NaiveDate, NaiveDate)> {
    let year = if date.month() >= start_month {
        date.year()
    } else {
        date.year() - 1
    };
    let start = NaiveDate::from_ymd_opt(year, start_month, 1).ok_or_else(|| {
        EngineError::CalculationError {
            message: format!("invalid fiscal year start month {}", start_month),
        }
    })?;
    let end = start
        .checked_add_months(Months::new(12))
        .and_then(|next| next.pred_opt())
        .ok_or_else(|| EngineError::CalculationError {
            message: format!("fiscal year starting {} is out of range", start),
        })?;
    Ok((start, end))
}

/// Returns the first day of the calendar month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Recomputes `gross_pay`, `total_deduction` and `net_pay`.
///
/// `gross_pay` is only replaced when the earning rows sum to a positive
/// amount. Otherwise the slip's own gross figure stands, the same figure
/// [`resolve_gross_pay`](super::resolve_gross_pay) falls back to.
pub fn calculate_net_pay(doc: &mut SalarySlip) -> EngineResult<Decimal> {
    let earnings_total = doc
        .earnings_total()
        .ok_or_else(|| overflow("gross pay", doc))?;
    if earnings_total > Decimal::ZERO {
        doc.gross_pay = Some(earnings_total);
    }
    let total_deduction = doc
        .deductions_total()
        .ok_or_else(|| overflow("total deduction", doc))?;
    let gross_pay = doc.gross_pay.unwrap_or(Decimal::ZERO);
    let net_pay = gross_pay
        .checked_sub(total_deduction)
        .ok_or_else(|| overflow("net pay", doc))?;

    doc.total_deduction = Some(total_deduction);
    doc.net_pay = Some(net_pay);
    Ok(net_pay)
}

/// Sets `year_to_date` to the net pay of `prior` slips plus this slip's.
///
/// `prior` must already be limited to the employee's submitted slips in the
/// current fiscal year.
pub fn compute_year_to_date(doc: &mut SalarySlip, prior: &[SalarySlip]) -> EngineResult<Decimal> {
    let mut total = doc.net_pay.unwrap_or(Decimal::ZERO);
    for slip in prior {
        total = add(total, slip.net_pay.unwrap_or(Decimal::ZERO), "year to date", doc)?;
    }
    doc.year_to_date = Some(total);
    Ok(total)
}

/// Sets `month_to_date` from the `prior` slips that start in this slip's
/// calendar month.
pub fn compute_month_to_date(doc: &mut SalarySlip, prior: &[SalarySlip]) -> EngineResult<Decimal> {
    let from = month_start(doc.start_date);
    let mut total = doc.net_pay.unwrap_or(Decimal::ZERO);
    for slip in prior.iter().filter(|s| s.start_date >= from && s.start_date <= doc.start_date) {
        total = add(total, slip.net_pay.unwrap_or(Decimal::ZERO), "month to date", doc)?;
    }
    doc.month_to_date = Some(total);
    Ok(total)
}

/// Sets `year_to_date` on every earning and deduction row.
///
/// Each row gets the same-component amounts from `prior` (earnings from
/// earnings, deductions from deductions) plus its own amount.
pub fn compute_component_wise_year_to_date(
    doc: &mut SalarySlip,
    prior: &[SalarySlip],
) -> EngineResult<()> {
    let mut earnings = Vec::with_capacity(doc.earnings.len());
    for line in &doc.earnings {
        let mut total = line.amount.unwrap_or(Decimal::ZERO);
        for amount in prior
            .iter()
            .flat_map(|s| s.earnings.iter())
            .filter(|l| l.salary_component == line.salary_component)
            .filter_map(|l| l.amount)
        {
            total = add(total, amount, "component year to date", doc)?;
        }
        earnings.push(total);
    }

    let mut deductions = Vec::with_capacity(doc.deductions.len());
    for line in &doc.deductions {
        let mut total = line.amount;
        for amount in prior
            .iter()
            .flat_map(|s| s.deductions.iter())
            .filter(|l| l.salary_component == line.salary_component)
            .map(|l| l.amount)
        {
            total = add(total, amount, "component year to date", doc)?;
        }
        deductions.push(total);
    }

    for (line, total) in doc.earnings.iter_mut().zip(earnings) {
        line.year_to_date = Some(total);
    }
    for (line, total) in doc.deductions.iter_mut().zip(deductions) {
        line.year_to_date = Some(total);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeductionLine, DocStatus, EarningLine};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn slip(name: &str, start: NaiveDate, basic: &str, pt: &str) -> SalarySlip {
        let mut doc = SalarySlip::new(name, "HR-EMP-00001", start);
        doc.earnings.push(EarningLine::new("Basic", dec(basic)));
        doc.deductions.push(DeductionLine::new("Professional Tax", dec(pt)));
        doc
    }

    fn submitted(name: &str, start: NaiveDate, basic: &str, pt: &str) -> SalarySlip {
        let mut doc = slip(name, start, basic, pt);
        doc.docstatus = DocStatus::Submitted;
        calculate_net_pay(&mut doc).unwrap();
        doc
    }

    #[test]
    fn test_fiscal_year_bounds() {
        assert_eq!(
            fiscal_year_bounds(date(2026, 4, 1), 4).unwrap(),
            (date(2026, 4, 1), date(2027, 3, 31))
        );
        assert_eq!(
            fiscal_year_bounds(date(2026, 3, 31), 4).unwrap(),
            (date(2025, 4, 1), date(2026, 3, 31))
        );
        assert_eq!(
            fiscal_year_bounds(date(2026, 7, 9), 1).unwrap(),
            (date(2026, 1, 1), date(2026, 12, 31))
        );
        assert!(fiscal_year_bounds(date(2026, 7, 9), 13).is_err());
    }

    #[test]
    fn test_net_pay() {
        let mut doc = slip("SLIP-1", date(2026, 5, 1), "28000", "200");
        doc.deductions.push(DeductionLine::new("Provident Fund", dec("1800")));

        assert_eq!(calculate_net_pay(&mut doc).unwrap(), dec("26000"));
        assert_eq!(doc.gross_pay, Some(dec("28000")));
        assert_eq!(doc.total_deduction, Some(dec("2000")));
    }

    #[test]
    fn test_net_pay_keeps_gross_field_without_earnings() {
        let mut doc = SalarySlip::new("SLIP-1", "HR-EMP-00001", date(2026, 5, 1));
        doc.gross_pay = Some(dec("15000"));
        doc.deductions.push(DeductionLine::new("Professional Tax", dec("200")));

        assert_eq!(calculate_net_pay(&mut doc).unwrap(), dec("14800"));
        assert_eq!(doc.gross_pay, Some(dec("15000")));
    }

    #[test]
    fn test_net_pay_keeps_gross_field_when_earnings_are_not_positive() {
        let mut doc = SalarySlip::new("SLIP-1", "HR-EMP-00001", date(2026, 5, 1));
        doc.earnings.push(EarningLine {
            salary_component: "Basic".to_string(),
            amount: None,
            year_to_date: None,
        });
        doc.gross_pay = Some(dec("20000"));
        doc.deductions.push(DeductionLine::new("Professional Tax", dec("200")));

        assert_eq!(calculate_net_pay(&mut doc).unwrap(), dec("19800"));
        assert_eq!(doc.gross_pay, Some(dec("20000")));
    }

    #[test]
    fn test_year_and_month_to_date() {
        let prior = vec![
            submitted("SLIP-04", date(2026, 4, 1), "20000", "200"),
            submitted("SLIP-05a", date(2026, 5, 1), "1000", "0"),
        ];
        let mut doc = slip("SLIP-05b", date(2026, 5, 16), "10000", "200");
        calculate_net_pay(&mut doc).unwrap();

        assert_eq!(compute_year_to_date(&mut doc, &prior).unwrap(), dec("30600"));
        assert_eq!(compute_month_to_date(&mut doc, &prior).unwrap(), dec("10800"));
        assert_eq!(doc.year_to_date, Some(dec("30600")));
        assert_eq!(doc.month_to_date, Some(dec("10800")));
    }

    #[test]
    fn test_component_wise_year_to_date() {
        let prior = vec![
            submitted("SLIP-04", date(2026, 4, 1), "20000", "200"),
            submitted("SLIP-05", date(2026, 5, 1), "20000", "200"),
        ];
        let mut doc = slip("SLIP-06", date(2026, 6, 1), "21000", "200");
        doc.deductions.push(DeductionLine::new("TDS", dec("500")));

        compute_component_wise_year_to_date(&mut doc, &prior).unwrap();
        assert_eq!(doc.earnings[0].year_to_date, Some(dec("61000")));
        assert_eq!(doc.deductions[0].year_to_date, Some(dec("600")));
        assert_eq!(doc.deductions[1].year_to_date, Some(dec("500")));
    }

    #[test]
    fn test_overflow_is_a_calculation_error() {
        let mut doc = SalarySlip::new("SLIP-1", "HR-EMP-00001", date(2026, 5, 1));
        doc.gross_pay = Some(Decimal::MIN);
        doc.deductions.push(DeductionLine::new("Professional Tax", Decimal::MAX));

        let err = calculate_net_pay(&mut doc).unwrap_err();
        assert!(matches!(err, EngineError::CalculationError { .. }));
    }
}

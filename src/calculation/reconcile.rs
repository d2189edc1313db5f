//! Writing a computed amount into the slip's deduction list.

use rust_decimal::Decimal;

use crate::models::{AuditStep, DeductionLine, ReconcileAction, SalaryComponentMeta, SalarySlip};

/// The result of reconciling a deduction, including the audit step.
#[derive(Debug, Clone)]
pub struct ReconcileResult {
    /// What happened to the deduction list.
    pub action: ReconcileAction,
    /// Number of duplicate rows for the component that were removed.
    pub duplicates_removed: usize,
    /// The audit step recording this reconciliation.
    pub audit_step: AuditStep,
}

/// Upserts the deduction row for `component`.
///
/// - An existing row is overwritten in place, keeping its position, even
///   when the new amount is zero. Further rows for the same component are
///   removed so the slip never charges it twice.
/// - Otherwise a row is appended, but only for a positive amount.
///
/// When `meta` is known its flags are copied onto the row. Rows for other
/// components are never touched.
///
/// # Examples
///
/// ```
/// use professional_tax::calculation::reconcile_deduction;
/// use professional_tax::models::{DeductionLine, ReconcileAction, SalarySlip};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let mut slip = SalarySlip::new("slip", "emp", NaiveDate::from_ymd_opt(2026, 4, 1).unwrap());
/// slip.deductions.push(DeductionLine::new("Professional Tax", Decimal::new(50, 0)));
///
/// let result = reconcile_deduction(&mut slip, "Professional Tax", Decimal::new(100, 0), None, 1);
/// assert_eq!(result.action, ReconcileAction::Updated);
/// assert_eq!(slip.deductions.len(), 1);
/// assert_eq!(slip.deductions[0].amount, Decimal::new(100, 0));
/// ```
pub fn reconcile_deduction(
    doc: &mut SalarySlip,
    component: &str,
    amount: Decimal,
    meta: Option<&SalaryComponentMeta>,
    step_number: u32,
) -> ReconcileResult {
    let previous = doc.deduction(component).map(|line| line.amount);

    let (action, duplicates_removed) = match doc.deduction_mut(component) {
        Some(line) => {
            line.amount = amount;
            copy_flags(line, meta);
            (ReconcileAction::Updated, remove_duplicates(doc, component))
        }
        None if amount > Decimal::ZERO => {
            let mut line = DeductionLine::new(component, amount);
            copy_flags(&mut line, meta);
            doc.deductions.push(line);
            (ReconcileAction::Appended, 0)
        }
        None => (ReconcileAction::Suppressed, 0),
    };

    let reasoning = match action {
        ReconcileAction::Updated => format!(
            "Existing '{}' row updated from {} to {}",
            component,
            previous.unwrap_or_default().normalize(),
            amount.normalize()
        ),
        ReconcileAction::Appended => {
            format!("Appended '{}' row with {}", component, amount.normalize())
        }
        ReconcileAction::Suppressed => format!(
            "No '{}' row and amount {} is not positive; nothing added",
            component,
            amount.normalize()
        ),
    };

    ReconcileResult {
        action,
        duplicates_removed,
        audit_step: AuditStep {
            step_number,
            rule_id: "deduction_reconcile".to_string(),
            rule_name: "Deduction Reconciliation".to_string(),
            input: serde_json::json!({
                "component": component,
                "amount": amount.normalize().to_string(),
                "previous_amount": previous.map(|p| p.normalize().to_string()),
                "component_known": meta.is_some(),
            }),
            output: serde_json::json!({
                "action": action,
                "duplicates_removed": duplicates_removed,
                "deduction_rows": doc.deductions.len(),
            }),
            reasoning,
        },
    }
}

fn copy_flags(line: &mut DeductionLine, meta: Option<&SalaryComponentMeta>) {
    if let Some(meta) = meta {
        line.depends_on_payment_days = meta.depends_on_payment_days;
        line.exempted_from_income_tax = meta.exempted_from_income_tax;
    }
}

/// Keeps the first row for `component` and drops the rest.
fn remove_duplicates(doc: &mut SalarySlip, component: &str) -> usize {
    let before = doc.deductions.len();
    let mut seen = false;
    doc.deductions.retain(|line| {
        if line.salary_component != component {
            return true;
        }
        !std::mem::replace(&mut seen, true)
    });
    before - doc.deductions.len()
}

//! Formula rule selection for a jurisdiction.

use crate::models::{AuditStep, FormulaRule, Jurisdiction, SkipReason};

/// The result of scanning a jurisdiction's formula rows.
#[derive(Debug, Clone)]
pub struct RuleSelection<'a> {
    /// The selected rule, or why none applies.
    pub rule: Result<&'a FormulaRule, SkipReason>,
    /// The audit step recording this selection.
    pub audit_step: AuditStep,
}

/// Selects the formula row to evaluate.
///
/// Rows are scanned in stored order and the first one with both a component
/// and formula text wins. Later rows are never consulted, even when they name
/// a different component.
///
/// # Examples
///
/// ```
/// use professional_tax::calculation::select_rule;
/// use professional_tax::models::{DocStatus, FormulaRule, Jurisdiction, SkipReason};
///
/// let state = Jurisdiction {
///     name: "Goa".to_string(),
///     docstatus: DocStatus::Submitted,
///     formula: vec![],
/// };
/// assert_eq!(select_rule(&state, 1).rule.unwrap_err(), SkipReason::NoFormulaRules);
/// ```
pub fn select_rule(jurisdiction: &Jurisdiction, step_number: u32) -> RuleSelection<'_> {
    let eligible = jurisdiction.first_eligible_rule();

    let rule = match eligible {
        _ if jurisdiction.formula.is_empty() => Err(SkipReason::NoFormulaRules),
        Some((_, selected)) => Ok(selected),
        None => Err(SkipReason::NoEligibleRule),
    };

    let (output, reasoning) = match (eligible, &rule) {
        (Some((index, selected)), Ok(_)) => (
            serde_json::json!({
                "selected_row": index + 1,
                "component": selected.component,
                "formula": selected.formula,
                "default_amount": selected.default_amount.map(|d| d.normalize().to_string()),
            }),
            format!(
                "Row {} of {} is the first with a component and formula: '{}'",
                index + 1,
                jurisdiction.formula.len(),
                selected.component
            ),
        ),
        (_, Err(SkipReason::NoFormulaRules)) => (
            serde_json::json!({ "selected_row": null }),
            format!("State '{}' has no formula rows", jurisdiction.name),
        ),
        _ => (
            serde_json::json!({ "selected_row": null }),
            format!(
                "None of the {} formula row(s) of '{}' has both a component and formula",
                jurisdiction.formula.len(),
                jurisdiction.name
            ),
        ),
    };

    RuleSelection {
        rule,
        audit_step: AuditStep {
            step_number,
            rule_id: "rule_selection".to_string(),
            rule_name: "Formula Rule Selection".to_string(),
            input: serde_json::json!({
                "state": jurisdiction.name,
                "rows": jurisdiction.formula.len(),
            }),
            output,
            reasoning,
        },
    }
}

//! Deduction outcome models for the Professional Tax engine.
//!
//! This module contains the [`DeductionOutcome`] type returned by the hook,
//! together with the audit trace that records every decision taken while
//! resolving, evaluating and reconciling a formula.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why the hook did not apply a deduction.
///
/// None of these are errors: the slip continues through the pipeline and
/// the applied amount is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The lifecycle event is not one the hook is configured for.
    EventNotHandled,
    /// The employee has no jurisdiction reference.
    NoJurisdiction,
    /// The referenced jurisdiction does not exist.
    JurisdictionNotFound,
    /// The referenced jurisdiction is not submitted.
    JurisdictionInactive,
    /// The jurisdiction has no formula rows.
    NoFormulaRules,
    /// No formula row has both a component and formula text.
    NoEligibleRule,
    /// Gross pay is zero or negative.
    NonPositiveGrossPay,
    /// The formula failed to parse or evaluate.
    FormulaError,
}

/// How the computed amount was written into the deduction list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileAction {
    /// An existing row for the component was overwritten in place.
    Updated,
    /// A new row was appended.
    Appended,
    /// No row existed and the amount was not positive, so nothing was added.
    Suppressed,
}

/// The final status of one hook invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// The formula was evaluated and reconciled.
    Applied {
        /// What happened to the deduction list.
        action: ReconcileAction,
    },
    /// The hook skipped the slip.
    Skipped {
        /// Why it skipped.
        reason: SkipReason,
    },
}

/// A single step in the audit trace recording a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// How urgently a warning needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational.
    Low,
    /// Degraded result; the slip may be missing context.
    Medium,
    /// The deduction could not be computed.
    High,
}

/// An advisory message surfaced to the user who triggered the hook.
///
/// Warnings never block the slip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
    /// The severity level.
    pub severity: Severity,
}

/// The complete audit trace for one hook invocation.
///
/// # Example
///
/// ```
/// use professional_tax::models::{AuditTrace, Severity};
///
/// let mut trace = AuditTrace::default();
/// trace.record(
///     "gross_pay",
///     "Gross Pay",
///     serde_json::json!({ "earnings": 2 }),
///     serde_json::json!({ "gross_pay": "30000" }),
///     "Summed 2 earning rows",
/// );
/// trace.warn("FORMULA_ERROR", "bad formula", Severity::High);
///
/// assert_eq!(trace.steps[0].step_number, 1);
/// assert_eq!(trace.warnings.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of calculation steps.
    pub steps: Vec<AuditStep>,
    /// Any warnings generated during calculation.
    pub warnings: Vec<AuditWarning>,
    /// The total calculation duration in microseconds.
    pub duration_us: u64,
}

impl AuditTrace {
    /// Appends a step, numbering it after the existing steps.
    pub fn record(
        &mut self,
        rule_id: &str,
        rule_name: &str,
        input: serde_json::Value,
        output: serde_json::Value,
        reasoning: impl Into<String>,
    ) {
        let step_number = self.steps.len() as u32 + 1;
        self.steps.push(AuditStep {
            step_number,
            rule_id: rule_id.to_string(),
            rule_name: rule_name.to_string(),
            input,
            output,
            reasoning: reasoning.into(),
        });
    }

    /// Appends an advisory warning.
    pub fn warn(&mut self, code: &str, message: impl Into<String>, severity: Severity) {
        self.warnings.push(AuditWarning {
            code: code.to_string(),
            message: message.into(),
            severity,
        });
    }

    /// Returns true if a warning with the given code was recorded.
    pub fn has_warning(&self, code: &str) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }
}

/// The complete result of one hook invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionOutcome {
    /// Unique identifier for this invocation.
    pub calculation_id: Uuid,
    /// When the invocation was performed.
    pub timestamp: DateTime<Utc>,
    /// The version of the engine that performed the calculation.
    pub engine_version: String,
    /// The salary slip the hook ran on.
    pub salary_slip: String,
    /// The employee on the slip.
    pub employee_id: String,
    /// The jurisdiction that supplied the formula, if resolved.
    pub jurisdiction: Option<String>,
    /// The component the formula targets, if a rule was selected.
    pub component: Option<String>,
    /// The applied amount; zero on every skip path.
    pub amount: Decimal,
    /// Whether the deduction was applied or skipped.
    #[serde(flatten)]
    pub status: OutcomeStatus,
    /// Complete audit trace of decisions.
    pub audit_trace: AuditTrace,
}

impl DeductionOutcome {
    /// Returns the skip reason, if the hook skipped.
    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self.status {
            OutcomeStatus::Skipped { reason } => Some(reason),
            OutcomeStatus::Applied { .. } => None,
        }
    }

    /// Returns the reconcile action, if the hook applied a deduction.
    pub fn action(&self) -> Option<ReconcileAction> {
        match self.status {
            OutcomeStatus::Applied { action } => Some(action),
            OutcomeStatus::Skipped { .. } => None,
        }
    }
}

//! The Professional Tax salary slip hook.
//!
//! [`ProfessionalTaxHook`] resolves the employee's jurisdiction, selects its
//! formula row, evaluates the formula against the slip and upserts the
//! resulting deduction. Every decision is recorded in the returned
//! [`DeductionOutcome`]'s audit trace.

use std::time::Instant;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Settings;
use crate::error::{EngineError, EngineResult};
use crate::formula::Formula;
use crate::models::{
    AuditTrace, DeductionOutcome, FormulaRule, OutcomeStatus, SalarySlip, Severity, SkipReason,
};
use crate::store::PayrollStore;

use super::environment::build_context;
use super::gross_pay::resolve_gross_pay;
use super::reconcile::reconcile_deduction;
use super::rule_selection::select_rule;
use super::totals::{
    calculate_net_pay, compute_component_wise_year_to_date, compute_month_to_date,
    compute_year_to_date, fiscal_year_bounds,
};

/// Version stamped on every outcome.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// State carried through one hook invocation.
struct Run {
    started: Instant,
    trace: AuditTrace,
    jurisdiction: Option<String>,
    component: Option<String>,
}

impl Run {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            trace: AuditTrace::default(),
            jurisdiction: None,
            component: None,
        }
    }

    fn next_step(&self) -> u32 {
        self.trace.steps.len() as u32 + 1
    }

    fn finish(mut self, doc: &SalarySlip, amount: Decimal, status: OutcomeStatus) -> DeductionOutcome {
        self.trace.duration_us = self.started.elapsed().as_micros() as u64;
        DeductionOutcome {
            calculation_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            engine_version: ENGINE_VERSION.to_string(),
            salary_slip: doc.name.clone(),
            employee_id: doc.employee.clone(),
            jurisdiction: self.jurisdiction,
            component: self.component,
            amount,
            status,
            audit_trace: self.trace,
        }
    }

    fn skip(mut self, doc: &SalarySlip, reason: SkipReason, message: String) -> DeductionOutcome {
        debug!(
            salary_slip = %doc.name,
            employee = %doc.employee,
            reason = ?reason,
            "{}", message
        );
        self.trace.record(
            "skip",
            "Skipped",
            serde_json::json!({ "reason": reason }),
            serde_json::json!({ "amount": "0" }),
            message,
        );
        self.finish(doc, Decimal::ZERO, OutcomeStatus::Skipped { reason })
    }
}

/// Computes a jurisdiction-dependent deduction for salary slips.
///
/// # Example
///
/// ```
/// use professional_tax::calculation::ProfessionalTaxHook;
/// use professional_tax::config::Settings;
/// use professional_tax::models::{
///     DocStatus, EarningLine, Employee, FormulaRule, Jurisdiction, SalarySlip,
/// };
/// use professional_tax::store::InMemoryStore;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let store = InMemoryStore::new()
///     .with_employee(Employee {
///         id: "HR-EMP-00001".to_string(),
///         employee_name: None,
///         date_of_birth: None,
///         state: Some("Karnataka".to_string()),
///     })
///     .with_jurisdiction(Jurisdiction {
///         name: "Karnataka".to_string(),
///         docstatus: DocStatus::Submitted,
///         formula: vec![FormulaRule {
///             component: "Professional Tax".to_string(),
///             formula: "200 if gross_pay >= 25000 else 0".to_string(),
///             default_amount: None,
///         }],
///     });
/// let hook = ProfessionalTaxHook::new(store, Settings::default());
///
/// let mut slip = SalarySlip::new(
///     "Sal Slip/HR-EMP-00001/00001",
///     "HR-EMP-00001",
///     NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
/// );
/// slip.earnings.push(EarningLine::new("Basic", Decimal::new(30000, 0)));
///
/// let outcome = hook.handle_event(&mut slip, "validate").unwrap();
/// assert_eq!(outcome.amount, Decimal::new(200, 0));
/// assert_eq!(slip.deduction("Professional Tax").unwrap().amount, Decimal::new(200, 0));
/// assert_eq!(slip.net_pay, Some(Decimal::new(29800, 0)));
/// ```
#[derive(Debug, Clone)]
pub struct ProfessionalTaxHook<S> {
    store: S,
    settings: Settings,
}

impl<S: PayrollStore> ProfessionalTaxHook<S> {
    /// Creates a hook reading master data from `store`.
    pub fn new(store: S, settings: Settings) -> Self {
        Self { store, settings }
    }

    /// Returns the master data store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the hook settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Lifecycle entry point.
    ///
    /// Runs [`Self::apply`] when `event` is one of the configured hook events;
    /// any other event leaves the slip untouched and returns a skipped outcome.
    pub fn handle_event(&self, doc: &mut SalarySlip, event: &str) -> EngineResult<DeductionOutcome> {
        if !self.settings.handles_event(event) {
            let run = Run::new();
            return Ok(run.skip(
                doc,
                SkipReason::EventNotHandled,
                format!("Event '{}' does not trigger the hook", event),
            ));
        }
        self.apply(doc)
    }

    /// Computes the deduction and writes it into `doc`.
    ///
    /// The applied amount is `outcome.amount`; it is zero on every skip path.
    ///
    /// # Errors
    ///
    /// - [`EngineError::MissingEmployee`] if the slip names no employee
    /// - [`EngineError::EmployeeNotFound`] if the employee does not exist
    /// - [`EngineError::StoreError`] if the employee or jurisdiction lookup fails
    /// - [`EngineError::CalculationError`] if a total overflows
    ///
    /// A formula that fails to parse or evaluate is not an error: the outcome
    /// is skipped with a `FORMULA_ERROR` warning and the slip is left as is.
    pub fn apply(&self, doc: &mut SalarySlip) -> EngineResult<DeductionOutcome> {
        let mut run = Run::new();

        if doc.employee.trim().is_empty() {
            return Err(EngineError::MissingEmployee {
                slip: doc.name.clone(),
            });
        }

        // Step 1: employee and jurisdiction reference
        let employee = self
            .store
            .employee(&doc.employee)?
            .ok_or_else(|| EngineError::EmployeeNotFound {
                employee: doc.employee.clone(),
            })?;
        let state_name = employee.jurisdiction().map(str::to_string);
        run.trace.record(
            "employee_lookup",
            "Employee Jurisdiction",
            serde_json::json!({ "employee": employee.id }),
            serde_json::json!({ "state": state_name }),
            match &state_name {
                Some(state) => format!("Employee {} is linked to state '{}'", employee.id, state),
                None => format!("Employee {} has no state", employee.id),
            },
        );
        let Some(state_name) = state_name else {
            return Ok(run.skip(
                doc,
                SkipReason::NoJurisdiction,
                format!("Employee {} has no state; skipping", employee.id),
            ));
        };
        run.jurisdiction = Some(state_name.clone());

        // Step 2: jurisdiction must exist and be submitted
        let Some(jurisdiction) = self.store.jurisdiction(&state_name)? else {
            return Ok(run.skip(
                doc,
                SkipReason::JurisdictionNotFound,
                format!("State '{}' does not exist; skipping", state_name),
            ));
        };
        if !jurisdiction.is_active() {
            return Ok(run.skip(
                doc,
                SkipReason::JurisdictionInactive,
                format!(
                    "State '{}' is {:?}, not submitted; skipping",
                    state_name, jurisdiction.docstatus
                ),
            ));
        }

        // Step 3: first complete formula row
        let selection = select_rule(&jurisdiction, run.next_step());
        run.trace.steps.push(selection.audit_step);
        let rule: FormulaRule = match selection.rule {
            Ok(rule) => rule.clone(),
            Err(reason) => {
                return Ok(run.skip(
                    doc,
                    reason,
                    format!("State '{}' has no usable formula row; skipping", state_name),
                ));
            }
        };
        run.component = Some(rule.component.clone());

        // Step 4: gross pay
        let gross = resolve_gross_pay(doc, run.next_step())?;
        let gross_pay = gross.gross_pay;
        let positive = gross.is_positive();
        run.trace.steps.push(gross.audit_step);
        if !positive {
            return Ok(run.skip(
                doc,
                SkipReason::NonPositiveGrossPay,
                format!("Gross pay {} is not positive; skipping", gross_pay.normalize()),
            ));
        }

        // Steps 5 and 6: context and formula
        let context = build_context(
            &self.store,
            doc,
            gross_pay,
            &rule,
            &self.settings,
            &mut run.trace,
        );
        let amount = match Formula::parse(&rule.formula).and_then(|f| f.evaluate_amount(&context)) {
            Ok(amount) => amount,
            Err(e) => {
                let error = EngineError::InvalidFormula {
                    component: rule.component.clone(),
                    formula: rule.formula.clone(),
                    message: e.to_string(),
                };
                warn!(
                    salary_slip = %doc.name,
                    state = %state_name,
                    component = %rule.component,
                    error = %e,
                    "Formula evaluation failed"
                );
                run.trace.warn("FORMULA_ERROR", error.to_string(), Severity::High);
                return Ok(run.skip(doc, SkipReason::FormulaError, error.to_string()));
            }
        };
        run.trace.record(
            "formula_evaluation",
            "Formula Evaluation",
            serde_json::json!({
                "component": rule.component,
                "formula": rule.formula,
                "gross_pay": gross_pay.normalize().to_string(),
            }),
            serde_json::json!({ "amount": amount.normalize().to_string() }),
            format!("{} = {}", rule.formula, amount.normalize()),
        );

        // Step 7: upsert the deduction row
        let meta = match self.store.salary_component(&rule.component) {
            Ok(meta) => meta,
            Err(e) => {
                warn!(component = %rule.component, error = %e, "Salary component lookup failed");
                run.trace
                    .warn("COMPONENT_LOOKUP_FAILED", e.to_string(), Severity::Low);
                None
            }
        };
        let reconciled =
            reconcile_deduction(doc, &rule.component, amount, meta.as_ref(), run.next_step());
        let action = reconciled.action;
        if reconciled.duplicates_removed > 0 {
            run.trace.warn(
                "DUPLICATE_DEDUCTION_REMOVED",
                format!(
                    "Removed {} duplicate '{}' row(s)",
                    reconciled.duplicates_removed, rule.component
                ),
                Severity::Low,
            );
        }
        run.trace.steps.push(reconciled.audit_step);

        // Step 8: derived totals
        if self.settings.recompute_totals {
            self.recompute_totals(doc, &mut run.trace)?;
        }

        info!(
            salary_slip = %doc.name,
            employee = %doc.employee,
            state = %state_name,
            component = %rule.component,
            amount = %amount.normalize(),
            action = ?action,
            "Professional tax applied"
        );

        Ok(run.finish(doc, amount, OutcomeStatus::Applied { action }))
    }

    fn recompute_totals(&self, doc: &mut SalarySlip, trace: &mut AuditTrace) -> EngineResult<()> {
        let net_pay = calculate_net_pay(doc)?;

        let (fiscal_start, _) = fiscal_year_bounds(doc.start_date, self.settings.fiscal_year_start_month)?;
        let prior = match self
            .store
            .submitted_slips(&doc.employee, fiscal_start, doc.start_date, &doc.name)
        {
            Ok(slips) => slips,
            Err(e) => {
                warn!(salary_slip = %doc.name, error = %e, "Prior salary slip lookup failed");
                trace.warn("PRIOR_SLIPS_LOOKUP_FAILED", e.to_string(), Severity::Medium);
                Vec::new()
            }
        };

        let year_to_date = compute_year_to_date(doc, &prior)?;
        let month_to_date = compute_month_to_date(doc, &prior)?;
        compute_component_wise_year_to_date(doc, &prior)?;

        trace.record(
            "totals",
            "Derived Totals",
            serde_json::json!({
                "fiscal_year_start": fiscal_start,
                "prior_slips": prior.len(),
            }),
            serde_json::json!({
                "gross_pay": doc.gross_pay.map(|g| g.normalize().to_string()),
                "total_deduction": doc.total_deduction.map(|t| t.normalize().to_string()),
                "net_pay": net_pay.normalize().to_string(),
                "year_to_date": year_to_date.normalize().to_string(),
                "month_to_date": month_to_date.normalize().to_string(),
            }),
            format!(
                "Net pay {}, year to date {} over {} prior slip(s)",
                net_pay.normalize(),
                year_to_date.normalize(),
                prior.len()
            ),
        );
        Ok(())
    }
}

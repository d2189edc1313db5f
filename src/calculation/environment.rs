//! Evaluation context construction.
//!
//! The variables a formula can read are declared up front in
//! [`DECLARED_VARIABLES`] rather than reflected from the slip, so adding a
//! field to [`SalarySlip`] never silently changes what formulas can see.
//! Bump [`CONTEXT_SCHEMA_VERSION`] whenever the declared set changes.
//!
//! After the declared variables, salary component amounts are bound under
//! [`variable_name`]: first the slip's own earning rows, then the components
//! of the employee's salary structure. A component never replaces a name
//! that is already bound.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use tracing::warn;

use crate::config::Settings;
use crate::formula::{EvalContext, Value, variable_name};
use crate::models::{AuditTrace, FormulaRule, SalarySlip, SalaryStructure, Severity};
use crate::store::PayrollStore;

/// Version of the declared variable set.
pub const CONTEXT_SCHEMA_VERSION: u32 = 1;

/// The value kind a declared variable holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// Always a number.
    Number,
    /// A number, or `None` when unset.
    OptionalNumber,
    /// Always a date.
    Date,
    /// A date, or `None` when unset.
    OptionalDate,
    /// Text, or `None` when unset.
    OptionalText,
}

/// A variable every formula may read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableSpec {
    /// The name used in formula text.
    pub name: &'static str,
    /// The kind of value bound.
    pub kind: VariableKind,
    /// Only bound when `expose_slip_fields` is enabled.
    pub slip_field: bool,
}

const fn core(name: &'static str, kind: VariableKind) -> VariableSpec {
    VariableSpec {
        name,
        kind,
        slip_field: false,
    }
}

const fn slip(name: &'static str, kind: VariableKind) -> VariableSpec {
    VariableSpec {
        name,
        kind,
        slip_field: true,
    }
}

/// The declared formula variables.
pub const DECLARED_VARIABLES: &[VariableSpec] = &[
    core("gross_pay", VariableKind::Number),
    core("start_date", VariableKind::Date),
    core("default_amount", VariableKind::OptionalNumber),
    slip("end_date", VariableKind::OptionalDate),
    slip("posting_date", VariableKind::OptionalDate),
    slip("payment_days", VariableKind::Number),
    slip("total_working_days", VariableKind::Number),
    slip("employee", VariableKind::OptionalText),
    slip("employee_name", VariableKind::OptionalText),
    slip("company", VariableKind::OptionalText),
    slip("currency", VariableKind::OptionalText),
    slip("salary_structure", VariableKind::OptionalText),
];

/// Reads a declared variable from the slip.
fn declared_value(
    spec: &VariableSpec,
    doc: &SalarySlip,
    gross_pay: Decimal,
    rule: &FormulaRule,
    structure: Option<&str>,
) -> Value {
    match spec.name {
        "gross_pay" => Value::Number(gross_pay),
        "start_date" => Value::Date(doc.start_date),
        "default_amount" => Value::from(rule.default_amount),
        "end_date" => Value::from(doc.end_date),
        "posting_date" => Value::from(doc.posting_date),
        "payment_days" => Value::Number(doc.payment_days.unwrap_or(Decimal::ZERO)),
        "total_working_days" => Value::Number(doc.total_working_days.unwrap_or(Decimal::ZERO)),
        "employee" => Value::from(doc.employee.as_str()),
        "employee_name" => Value::from(doc.employee_name.clone()),
        "company" => Value::from(doc.company.clone()),
        "currency" => Value::from(doc.currency.clone()),
        "salary_structure" => Value::from(structure.map(str::to_string)),
        _ => Value::None,
    }
}

/// Finds the salary structure for a slip.
///
/// Uses the slip's `salary_structure` when set, otherwise the latest
/// submitted assignment effective on or before the slip's start date.
/// Lookup failures are recorded as warnings and yield `None`.
pub fn resolve_structure<S: PayrollStore + ?Sized>(
    store: &S,
    doc: &SalarySlip,
    trace: &mut AuditTrace,
) -> Option<SalaryStructure> {
    let name = match doc.salary_structure.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(name) => name.to_string(),
        None => match store.latest_structure_assignment(&doc.employee, doc.start_date) {
            Ok(Some(assignment)) => assignment.salary_structure,
            Ok(None) => return None,
            Err(e) => {
                warn!(employee = %doc.employee, error = %e, "Structure assignment lookup failed");
                trace.warn("STRUCTURE_LOOKUP_FAILED", e.to_string(), Severity::Medium);
                return None;
            }
        },
    };

    match store.salary_structure(&name) {
        Ok(Some(structure)) => Some(structure),
        Ok(None) => {
            trace.warn(
                "STRUCTURE_NOT_FOUND",
                format!("Salary structure '{}' does not exist", name),
                Severity::Low,
            );
            None
        }
        Err(e) => {
            warn!(structure = %name, error = %e, "Salary structure lookup failed");
            trace.warn("STRUCTURE_LOOKUP_FAILED", e.to_string(), Severity::Medium);
            None
        }
    }
}

/// Builds the context a formula is evaluated against.
///
/// Records a `context_build` audit step listing every bound name.
pub fn build_context<S: PayrollStore + ?Sized>(
    store: &S,
    doc: &SalarySlip,
    gross_pay: Decimal,
    rule: &FormulaRule,
    settings: &Settings,
    trace: &mut AuditTrace,
) -> EvalContext {
    let structure = if settings.expose_structure_components {
        resolve_structure(store, doc, trace)
    } else {
        None
    };
    let structure_name = doc
        .salary_structure
        .as_deref()
        .or(structure.as_ref().map(|s| s.name.as_str()));

    let mut context = EvalContext::new();
    for spec in DECLARED_VARIABLES {
        if spec.slip_field && !settings.expose_slip_fields {
            continue;
        }
        context.set(
            spec.name,
            declared_value(spec, doc, gross_pay, rule, structure_name),
        );
    }

    let mut shadowed = BTreeSet::new();
    if settings.expose_structure_components {
        let slip_rows = doc
            .earnings
            .iter()
            .map(|line| (line.salary_component.as_str(), line.amount.unwrap_or(Decimal::ZERO)));
        let structure_rows = structure
            .iter()
            .flat_map(|s| s.components())
            .map(|c| (c.salary_component.as_str(), c.amount));

        for (component, amount) in slip_rows.chain(structure_rows) {
            let name = variable_name(component);
            let declared = DECLARED_VARIABLES.iter().any(|spec| spec.name == name);
            if !context.set_if_absent(name.clone(), amount) && declared {
                shadowed.insert(name);
            }
        }
    }

    if !shadowed.is_empty() {
        let names: Vec<&str> = shadowed.iter().map(String::as_str).collect();
        trace.warn(
            "COMPONENT_NAME_SHADOWED",
            format!(
                "Component variable(s) {} collide with slip fields and are not visible",
                names.join(", ")
            ),
            Severity::Low,
        );
    }

    let names: Vec<&str> = context.iter().map(|(name, _)| name).collect();
    trace.record(
        "context_build",
        "Formula Context",
        serde_json::json!({
            "schema_version": CONTEXT_SCHEMA_VERSION,
            "expose_slip_fields": settings.expose_slip_fields,
            "expose_structure_components": settings.expose_structure_components,
            "salary_structure": structure_name,
        }),
        serde_json::json!({ "variables": names }),
        format!("Bound {} variable(s)", names.len()),
    );

    context
}

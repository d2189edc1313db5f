//! Calculation logic for the Professional Tax hook.
//!
//! This module contains gross pay resolution, formula rule selection,
//! evaluation context construction, deduction reconciliation, derived
//! total recomputation, and the [`ProfessionalTaxHook`] that drives them.

mod environment;
mod gross_pay;
mod professional_tax;
mod reconcile;
mod rule_selection;
mod totals;

pub use environment::{
    CONTEXT_SCHEMA_VERSION, DECLARED_VARIABLES, VariableKind, VariableSpec, build_context,
    resolve_structure,
};
pub use gross_pay::{GrossPayResult, GrossPaySource, resolve_gross_pay};
pub use professional_tax::{ENGINE_VERSION, ProfessionalTaxHook};
pub use reconcile::{ReconcileResult, reconcile_deduction};
pub use rule_selection::{RuleSelection, select_rule};
pub use totals::{
    calculate_net_pay, compute_component_wise_year_to_date, compute_month_to_date,
    compute_year_to_date, fiscal_year_bounds, month_start,
};

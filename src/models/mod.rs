//! Core data models for the Professional Tax engine.
//!
//! This module contains the domain records the hook reads (employees,
//! jurisdictions, salary structures) and the salary slip it mutates.

mod calculation_result;
mod employee;
mod jurisdiction;
mod salary_slip;
mod salary_structure;

pub use calculation_result::{
    AuditStep, AuditTrace, AuditWarning, DeductionOutcome, OutcomeStatus, ReconcileAction,
    Severity, SkipReason,
};
pub use employee::{DocStatus, Employee};
pub use jurisdiction::{FormulaRule, Jurisdiction};
pub use salary_slip::{DeductionLine, EarningLine, SalarySlip};
pub use salary_structure::{
    SalaryComponentMeta, SalaryStructure, SalaryStructureAssignment, StructureComponent,
};

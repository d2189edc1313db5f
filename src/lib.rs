//! Professional Tax deduction hook for salary slips.
//!
//! This crate computes a state-dependent payroll deduction (typically
//! "Professional Tax") for an employee's salary slip. The formula is stored
//! per jurisdiction, evaluated in a small sandboxed expression language, and
//! the result is upserted into the slip's deduction list.
//!
//! The entry point is [`calculation::ProfessionalTaxHook`]; master data is
//! read through the [`store::PayrollStore`] trait.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod formula;
pub mod install;
pub mod models;
pub mod store;

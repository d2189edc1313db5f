//! Error types for the Professional Tax engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for the conditions that must abort a salary slip hook. Benign skips
//! (no jurisdiction, no formula, non-positive gross pay) are not errors and
//! are reported through [`crate::models::SkipReason`] instead.

use thiserror::Error;

/// The main error type for the Professional Tax engine.
///
/// # Example
///
/// ```
/// use professional_tax::error::EngineError;
///
/// let error = EngineError::EmployeeNotFound {
///     employee: "HR-EMP-00042".to_string(),
/// };
/// assert_eq!(error.to_string(), "Employee HR-EMP-00042 does not exist");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// The salary slip does not reference an employee.
    #[error("Employee is not specified in the Salary Slip '{slip}'")]
    MissingEmployee {
        /// The name of the offending salary slip.
        slip: String,
    },

    /// The salary slip references an employee that does not exist.
    #[error("Employee {employee} does not exist")]
    EmployeeNotFound {
        /// The employee identifier that was not found.
        employee: String,
    },

    /// A record lookup against the payroll store failed.
    #[error("Failed to load {doctype} '{name}': {message}")]
    StoreError {
        /// The record type being looked up (e.g. "State").
        doctype: String,
        /// The record identifier.
        name: String,
        /// A description of the failure.
        message: String,
    },

    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A formula could not be parsed or evaluated.
    #[error("Invalid formula '{formula}' for component '{component}': {message}")]
    InvalidFormula {
        /// The salary component the formula belongs to.
        component: String,
        /// The formula text.
        formula: String,
        /// A description of the failure.
        message: String,
    },

    /// A general calculation error occurred.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },
}

impl EngineError {
    /// Builds a [`EngineError::StoreError`] for a failed lookup.
    pub fn store(
        doctype: impl Into<String>,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::StoreError {
            doctype: doctype.into(),
            name: name.into(),
            message: message.into(),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

//! Salary structures, their assignments, and salary component metadata.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::DocStatus;

/// A component row configured on a salary structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureComponent {
    /// The salary component name.
    pub salary_component: String,
    /// The configured amount.
    #[serde(default)]
    pub amount: Decimal,
}

/// A compensation template listing earning and deduction components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryStructure {
    /// Unique structure name.
    pub name: String,
    /// Lifecycle state.
    #[serde(default)]
    pub docstatus: DocStatus,
    /// Earning components.
    #[serde(default)]
    pub earnings: Vec<StructureComponent>,
    /// Deduction components.
    #[serde(default)]
    pub deductions: Vec<StructureComponent>,
}

impl SalaryStructure {
    /// Iterates over earning then deduction components.
    pub fn components(&self) -> impl Iterator<Item = &StructureComponent> {
        self.earnings.iter().chain(self.deductions.iter())
    }
}

/// Links an employee to a salary structure from a given date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryStructureAssignment {
    /// The employee identifier.
    pub employee: String,
    /// The assigned structure name.
    pub salary_structure: String,
    /// The date the assignment takes effect.
    pub from_date: NaiveDate,
    /// Lifecycle state; only submitted assignments are considered.
    #[serde(default)]
    pub docstatus: DocStatus,
}

/// Flags configured on a salary component master record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryComponentMeta {
    /// The component name.
    pub name: String,
    /// Whether the component is prorated by payment days.
    #[serde(default)]
    pub depends_on_payment_days: Option<bool>,
    /// Whether the component is exempt from income tax.
    #[serde(default)]
    pub exempted_from_income_tax: Option<bool>,
}

//! Jurisdiction ("State") master data and its formula rules.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::DocStatus;

/// A named expression that computes one payroll component's amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaRule {
    /// The salary component the formula produces (e.g. "Professional Tax").
    #[serde(default)]
    pub component: String,
    /// The expression text evaluated against the salary slip context.
    #[serde(default)]
    pub formula: String,
    /// Optional fallback amount, exposed to the formula as `default_amount`.
    #[serde(default)]
    pub default_amount: Option<Decimal>,
}

impl FormulaRule {
    /// Returns true if the rule has both a component name and formula text.
    pub fn is_eligible(&self) -> bool {
        !self.component.trim().is_empty() && !self.formula.trim().is_empty()
    }
}

/// A geographic or administrative region with its own tax formula rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Jurisdiction {
    /// Unique name of the jurisdiction (e.g. "Maharashtra").
    pub name: String,
    /// Lifecycle state; only submitted jurisdictions are applied.
    #[serde(default)]
    pub docstatus: DocStatus,
    /// Formula rows in stored order.
    #[serde(default)]
    pub formula: Vec<FormulaRule>,
}

impl Jurisdiction {
    /// Returns true if the jurisdiction is approved and active.
    pub fn is_active(&self) -> bool {
        self.docstatus.is_submitted()
    }

    /// Returns the first rule that has both a component and formula text,
    /// with its zero-based row index.
    ///
    /// Later rules are never consulted, even when they target the same
    /// component.
    ///
    /// # Examples
    ///
    /// ```
    /// use professional_tax::models::{DocStatus, FormulaRule, Jurisdiction};
    ///
    /// let state = Jurisdiction {
    ///     name: "Karnataka".to_string(),
    ///     docstatus: DocStatus::Submitted,
    ///     formula: vec![
    ///         FormulaRule { component: "".to_string(), formula: "1".to_string(), default_amount: None },
    ///         FormulaRule { component: "Professional Tax".to_string(), formula: "200".to_string(), default_amount: None },
    ///     ],
    /// };
    /// let (index, rule) = state.first_eligible_rule().unwrap();
    /// assert_eq!(index, 1);
    /// assert_eq!(rule.formula, "200");
    /// ```
    pub fn first_eligible_rule(&self) -> Option<(usize, &FormulaRule)> {
        self.formula
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.is_eligible())
    }
}

//! Configuration types for the Professional Tax hook.
//!
//! This module contains the strongly-typed structures deserialized from the
//! YAML files in a configuration directory.

use serde::{Deserialize, Serialize};

use crate::models::{
    Employee, Jurisdiction, SalaryComponentMeta, SalarySlip, SalaryStructure,
    SalaryStructureAssignment,
};

/// The lifecycle event the hook runs on when none is configured.
pub const DEFAULT_HOOK_EVENT: &str = "validate";

/// The first month of the fiscal year when none is configured (April).
pub const DEFAULT_FISCAL_YEAR_START_MONTH: u32 = 4;

/// Behaviour switches for the hook, read from `settings.yaml`.
///
/// Every field has a default, so an empty file is valid.
///
/// # Example
///
/// ```
/// use professional_tax::config::Settings;
///
/// let settings: Settings = serde_yaml::from_str("recompute_totals: false").unwrap();
/// assert_eq!(settings.hook_events, vec!["validate".to_string()]);
/// assert!(!settings.recompute_totals);
/// assert_eq!(settings.fiscal_year_start_month, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Lifecycle events that trigger the hook.
    pub hook_events: Vec<String>,
    /// Recompute net pay and year/month-to-date totals after reconciling.
    pub recompute_totals: bool,
    /// Expose slip header fields such as `end_date` and `company` to formulas.
    pub expose_slip_fields: bool,
    /// Expose salary structure components to formulas as variables.
    pub expose_structure_components: bool,
    /// First month of the fiscal year (1 to 12).
    pub fiscal_year_start_month: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hook_events: vec![DEFAULT_HOOK_EVENT.to_string()],
            recompute_totals: true,
            expose_slip_fields: true,
            expose_structure_components: true,
            fiscal_year_start_month: DEFAULT_FISCAL_YEAR_START_MONTH,
        }
    }
}

impl Settings {
    /// Returns true if the hook runs on this lifecycle event.
    pub fn handles_event(&self, event: &str) -> bool {
        self.hook_events.iter().any(|e| e == event)
    }
}

/// `states.yaml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatesFile {
    /// Jurisdictions with their formula rows.
    #[serde(default)]
    pub states: Vec<Jurisdiction>,
}

/// `employees.yaml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeesFile {
    /// Employee records.
    #[serde(default)]
    pub employees: Vec<Employee>,
}

/// `salary_components.yaml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComponentsFile {
    /// Salary component metadata.
    #[serde(default)]
    pub components: Vec<SalaryComponentMeta>,
}

/// `salary_structures.yaml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StructuresFile {
    /// Salary structures.
    #[serde(default)]
    pub structures: Vec<SalaryStructure>,
}

/// `structure_assignments.yaml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignmentsFile {
    /// Structure assignments.
    #[serde(default)]
    pub assignments: Vec<SalaryStructureAssignment>,
}

/// `salary_slips.yaml`: previously submitted slips used for year-to-date totals.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlipsFile {
    /// Historical salary slips.
    #[serde(default)]
    pub salary_slips: Vec<SalarySlip>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_settings_use_defaults() {
        let settings: Settings = serde_yaml::from_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.handles_event("validate"));
        assert!(!settings.handles_event("on_submit"));
    }

    #[test]
    fn test_settings_override_events() {
        let yaml = "hook_events: [validate, before_submit]\nfiscal_year_start_month: 1\n";
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert!(settings.handles_event("before_submit"));
        assert_eq!(settings.fiscal_year_start_month, 1);
        assert!(settings.expose_slip_fields);
    }

    #[test]
    fn test_states_file_parses_formula_rows() {
        let yaml = r#"
states:
  - name: Maharashtra
    docstatus: submitted
    formula:
      - component: Professional Tax
        formula: "300 if start_date.month == 2 else 200"
"#;
        let file: StatesFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(file.states.len(), 1);
        assert!(file.states[0].is_active());
        assert_eq!(file.states[0].formula[0].component, "Professional Tax");
    }
}

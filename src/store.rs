//! Record lookups the hook needs from the host payroll platform.
//!
//! The hook never talks to a database directly. It reads master data through
//! the [`PayrollStore`] trait; [`InMemoryStore`] is the implementation used by
//! the configuration loader, the HTTP layer and the tests.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::error::EngineResult;
use crate::install::state_link_filters;
use crate::models::{
    Employee, Jurisdiction, SalaryComponentMeta, SalarySlip, SalaryStructure,
    SalaryStructureAssignment,
};

/// Read access to payroll master data.
///
/// Every lookup returns `Ok(None)` (or an empty list) when the record does
/// not exist; `Err` is reserved for failures of the store itself.
pub trait PayrollStore {
    /// Looks up an employee by identifier.
    fn employee(&self, id: &str) -> EngineResult<Option<Employee>>;

    /// Looks up a jurisdiction ("State") by name.
    fn jurisdiction(&self, name: &str) -> EngineResult<Option<Jurisdiction>>;

    /// Looks up a salary structure by name.
    fn salary_structure(&self, name: &str) -> EngineResult<Option<SalaryStructure>>;

    /// Finds the most recent submitted assignment for an employee that takes
    /// effect on or before the given date.
    fn latest_structure_assignment(
        &self,
        employee: &str,
        on_or_before: NaiveDate,
    ) -> EngineResult<Option<SalaryStructureAssignment>>;

    /// Looks up salary component metadata by name.
    fn salary_component(&self, name: &str) -> EngineResult<Option<SalaryComponentMeta>>;

    /// Lists submitted slips for an employee whose `start_date` falls within
    /// `from..=to`, excluding the slip named `exclude`.
    fn submitted_slips(
        &self,
        employee: &str,
        from: NaiveDate,
        to: NaiveDate,
        exclude: &str,
    ) -> EngineResult<Vec<SalarySlip>>;
}

/// A [`PayrollStore`] backed by in-memory maps.
///
/// # Example
///
/// ```
/// use professional_tax::models::{DocStatus, Employee, Jurisdiction};
/// use professional_tax::store::{InMemoryStore, PayrollStore};
///
/// let store = InMemoryStore::new()
///     .with_employee(Employee {
///         id: "HR-EMP-00001".to_string(),
///         employee_name: None,
///         date_of_birth: None,
///         state: Some("Maharashtra".to_string()),
///     })
///     .with_jurisdiction(Jurisdiction {
///         name: "Maharashtra".to_string(),
///         docstatus: DocStatus::Submitted,
///         formula: vec![],
///     });
///
/// assert!(store.employee("HR-EMP-00001").unwrap().is_some());
/// assert_eq!(store.active_jurisdictions().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    employees: HashMap<String, Employee>,
    jurisdictions: HashMap<String, Jurisdiction>,
    structures: HashMap<String, SalaryStructure>,
    assignments: Vec<SalaryStructureAssignment>,
    components: HashMap<String, SalaryComponentMeta>,
    slips: Vec<SalarySlip>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an employee.
    pub fn with_employee(mut self, employee: Employee) -> Self {
        self.insert_employee(employee);
        self
    }

    /// Adds or replaces a jurisdiction.
    pub fn with_jurisdiction(mut self, jurisdiction: Jurisdiction) -> Self {
        self.insert_jurisdiction(jurisdiction);
        self
    }

    /// Adds or replaces a salary structure.
    pub fn with_structure(mut self, structure: SalaryStructure) -> Self {
        self.insert_structure(structure);
        self
    }

    /// Adds a structure assignment.
    pub fn with_assignment(mut self, assignment: SalaryStructureAssignment) -> Self {
        self.assignments.push(assignment);
        self
    }

    /// Adds or replaces salary component metadata.
    pub fn with_component(mut self, component: SalaryComponentMeta) -> Self {
        self.components.insert(component.name.clone(), component);
        self
    }

    /// Adds a historical salary slip.
    pub fn with_slip(mut self, slip: SalarySlip) -> Self {
        self.slips.push(slip);
        self
    }

    /// Adds or replaces an employee in place.
    pub fn insert_employee(&mut self, employee: Employee) {
        self.employees.insert(employee.id.clone(), employee);
    }

    /// Adds or replaces a jurisdiction in place.
    pub fn insert_jurisdiction(&mut self, jurisdiction: Jurisdiction) {
        self.jurisdictions
            .insert(jurisdiction.name.clone(), jurisdiction);
    }

    /// Adds or replaces a salary structure in place.
    pub fn insert_structure(&mut self, structure: SalaryStructure) {
        self.structures.insert(structure.name.clone(), structure);
    }

    /// Jurisdictions that may be linked from an employee, sorted by name.
    ///
    /// Applies the same filter the installed `custom_state` link field uses.
    pub fn active_jurisdictions(&self) -> Vec<&Jurisdiction> {
        let filters = state_link_filters();
        let mut active: Vec<&Jurisdiction> = self
            .jurisdictions
            .values()
            .filter(|j| filters.matches(j))
            .collect();
        active.sort_by(|a, b| a.name.cmp(&b.name));
        active
    }

    /// Number of employees held.
    pub fn employee_count(&self) -> usize {
        self.employees.len()
    }
}

impl PayrollStore for InMemoryStore {
    fn employee(&self, id: &str) -> EngineResult<Option<Employee>> {
        Ok(self.employees.get(id).cloned())
    }

    fn jurisdiction(&self, name: &str) -> EngineResult<Option<Jurisdiction>> {
        Ok(self.jurisdictions.get(name).cloned())
    }

    fn salary_structure(&self, name: &str) -> EngineResult<Option<SalaryStructure>> {
        Ok(self.structures.get(name).cloned())
    }

    fn latest_structure_assignment(
        &self,
        employee: &str,
        on_or_before: NaiveDate,
    ) -> EngineResult<Option<SalaryStructureAssignment>> {
        Ok(self
            .assignments
            .iter()
            .filter(|a| {
                a.employee == employee
                    && a.docstatus.is_submitted()
                    && a.from_date <= on_or_before
            })
            .max_by_key(|a| a.from_date)
            .cloned())
    }

    fn salary_component(&self, name: &str) -> EngineResult<Option<SalaryComponentMeta>> {
        Ok(self.components.get(name).cloned())
    }

    fn submitted_slips(
        &self,
        employee: &str,
        from: NaiveDate,
        to: NaiveDate,
        exclude: &str,
    ) -> EngineResult<Vec<SalarySlip>> {
        Ok(self
            .slips
            .iter()
            .filter(|slip| {
                slip.employee == employee
                    && slip.docstatus.is_submitted()
                    && slip.name != exclude
                    && slip.start_date >= from
                    && slip.start_date <= to
            })
            .cloned()
            .collect())
    }
}

//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading hook settings
//! and payroll master data from YAML files.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::info;

use crate::error::{EngineError, EngineResult};
use crate::store::InMemoryStore;

use super::types::{
    AssignmentsFile, ComponentsFile, EmployeesFile, Settings, SlipsFile, StatesFile,
    StructuresFile,
};

/// Loads the hook settings and master data from a directory.
///
/// # Directory Structure
///
/// ```text
/// config/sample/
/// ├── settings.yaml              # Hook behaviour switches
/// ├── states.yaml                # Jurisdictions and their formula rows
/// ├── employees.yaml             # Employees and their jurisdiction
/// ├── salary_components.yaml     # Component flags
/// ├── salary_structures.yaml     # Structures and component amounts
/// ├── structure_assignments.yaml # Employee to structure links
/// └── salary_slips.yaml          # Optional: submitted slips for YTD totals
/// ```
///
/// # Example
///
/// ```no_run
/// use professional_tax::config::ConfigLoader;
///
/// let config = ConfigLoader::load("./config/sample")?;
/// let (store, settings) = config.into_parts();
/// # Ok::<(), professional_tax::error::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    settings: Settings,
    store: InMemoryStore,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// Returns an error if a required file is missing, a file contains
    /// invalid YAML, or `fiscal_year_start_month` is outside 1 to 12.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let settings_path = path.join("settings.yaml");
        let settings = Self::load_yaml::<Settings>(&settings_path)?;
        if !(1..=12).contains(&settings.fiscal_year_start_month) {
            return Err(EngineError::ConfigParseError {
                path: settings_path.display().to_string(),
                message: format!(
                    "fiscal_year_start_month must be between 1 and 12, got {}",
                    settings.fiscal_year_start_month
                ),
            });
        }

        let states = Self::load_yaml::<StatesFile>(&path.join("states.yaml"))?;
        let employees = Self::load_yaml::<EmployeesFile>(&path.join("employees.yaml"))?;
        let components = Self::load_yaml::<ComponentsFile>(&path.join("salary_components.yaml"))?;
        let structures = Self::load_yaml::<StructuresFile>(&path.join("salary_structures.yaml"))?;
        let assignments =
            Self::load_yaml::<AssignmentsFile>(&path.join("structure_assignments.yaml"))?;
        let slips = Self::load_optional_yaml::<SlipsFile>(&path.join("salary_slips.yaml"))?;

        let mut store = InMemoryStore::new();
        for state in states.states {
            store = store.with_jurisdiction(state);
        }
        for employee in employees.employees {
            store = store.with_employee(employee);
        }
        for component in components.components {
            store = store.with_component(component);
        }
        for structure in structures.structures {
            store = store.with_structure(structure);
        }
        for assignment in assignments.assignments {
            store = store.with_assignment(assignment);
        }
        for slip in slips.salary_slips {
            store = store.with_slip(slip);
        }

        info!(
            path = %path.display(),
            employees = store.employee_count(),
            active_states = store.active_jurisdictions().len(),
            "Loaded payroll configuration"
        );

        Ok(Self { settings, store })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Like [`Self::load_yaml`], but a missing file yields the default.
    fn load_optional_yaml<T: DeserializeOwned + Default>(path: &Path) -> EngineResult<T> {
        if !path.exists() {
            return Ok(T::default());
        }
        Self::load_yaml(path)
    }

    /// Returns the hook settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns the master data store.
    pub fn store(&self) -> &InMemoryStore {
        &self.store
    }

    /// Splits the loader into its store and settings.
    pub fn into_parts(self) -> (InMemoryStore, Settings) {
        (self.store, self.settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::PayrollStore;
    use std::path::PathBuf;

    fn sample_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/sample")
    }

    #[test]
    fn test_load_sample_config() {
        let config = ConfigLoader::load(sample_dir()).unwrap();
        assert!(config.settings().handles_event("validate"));

        let store = config.store();
        let employee = store.employee("HR-EMP-00001").unwrap().unwrap();
        assert_eq!(employee.jurisdiction(), Some("Maharashtra"));
        assert!(store.jurisdiction("Maharashtra").unwrap().unwrap().is_active());
        assert!(store.salary_component("Professional Tax").unwrap().is_some());
    }

    #[test]
    fn test_sample_lists_only_submitted_states() {
        let config = ConfigLoader::load(sample_dir()).unwrap();
        let names: Vec<&str> = config
            .store()
            .active_jurisdictions()
            .iter()
            .map(|j| j.name.as_str())
            .collect();
        assert!(names.contains(&"Maharashtra"));
        assert!(!names.contains(&"Kerala"));
    }

    #[test]
    fn test_missing_directory_is_config_not_found() {
        let err = ConfigLoader::load("/nonexistent/professional-tax").unwrap_err();
        assert!(matches!(err, EngineError::ConfigNotFound { .. }));
    }
}

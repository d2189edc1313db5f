//! Configuration loading for the Professional Tax hook.
//!
//! A configuration directory holds the hook settings and the payroll master
//! data (jurisdictions, employees, structures) as YAML files. Loading it
//! yields the [`Settings`] and an [`crate::store::InMemoryStore`].
//!
//! # Example
//!
//! ```no_run
//! use professional_tax::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/sample").unwrap();
//! println!("Hook events: {:?}", config.settings().hook_events);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    AssignmentsFile, ComponentsFile, DEFAULT_FISCAL_YEAR_START_MONTH, DEFAULT_HOOK_EVENT,
    EmployeesFile, Settings, SlipsFile, StatesFile, StructuresFile,
};

//! Employee model and document lifecycle status.
//!
//! This module defines the [`Employee`] record as seen by the payroll hook
//! and the [`DocStatus`] lifecycle shared by every submittable record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The lifecycle state of a submittable record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocStatus {
    /// Saved but not yet approved.
    #[default]
    Draft,
    /// Approved and active.
    Submitted,
    /// Withdrawn after submission.
    Cancelled,
}

impl DocStatus {
    /// Returns true if the record is approved and active.
    pub fn is_submitted(self) -> bool {
        self == DocStatus::Submitted
    }

    /// Returns the numeric code the host platform stores for this status.
    pub fn code(self) -> u8 {
        match self {
            DocStatus::Draft => 0,
            DocStatus::Submitted => 1,
            DocStatus::Cancelled => 2,
        }
    }
}

/// Represents an employee whose salary slips are subject to the hook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier for the employee (e.g. "HR-EMP-00001").
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub employee_name: Option<String>,
    /// The employee's date of birth.
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    /// The jurisdiction ("State") the employee is taxed in.
    ///
    /// Stored on the host through the `custom_state` field registered at
    /// install time.
    #[serde(default, alias = "custom_state")]
    pub state: Option<String>,
}

impl Employee {
    /// Returns the jurisdiction reference, treating blank values as unset.
    ///
    /// # Examples
    ///
    /// ```
    /// use professional_tax::models::Employee;
    ///
    /// let employee = Employee {
    ///     id: "HR-EMP-00001".to_string(),
    ///     employee_name: None,
    ///     date_of_birth: None,
    ///     state: Some("  ".to_string()),
    /// };
    /// assert_eq!(employee.jurisdiction(), None);
    /// ```
    pub fn jurisdiction(&self) -> Option<&str> {
        self.state
            .as_deref()
            .map(str::trim)
            .filter(|state| !state.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_employee_with_custom_state_alias() {
        let json = r#"{
            "id": "HR-EMP-00001",
            "employee_name": "Asha Rao",
            "date_of_birth": "1990-01-15",
            "custom_state": "Maharashtra"
        }"#;

        let employee: Employee = serde_json::from_str(json).unwrap();
        assert_eq!(employee.id, "HR-EMP-00001");
        assert_eq!(employee.jurisdiction(), Some("Maharashtra"));
        assert_eq!(
            employee.date_of_birth,
            NaiveDate::from_ymd_opt(1990, 1, 15)
        );
    }

    #[test]
    fn test_deserialize_employee_without_state() {
        let json = r#"{ "id": "HR-EMP-00002" }"#;

        let employee: Employee = serde_json::from_str(json).unwrap();
        assert_eq!(employee.jurisdiction(), None);
        assert!(employee.employee_name.is_none());
    }

    #[test]
    fn test_docstatus_serialization() {
        assert_eq!(
            serde_json::to_string(&DocStatus::Submitted).unwrap(),
            "\"submitted\""
        );
        assert_eq!(DocStatus::default(), DocStatus::Draft);
    }

    #[test]
    fn test_docstatus_codes() {
        assert_eq!(DocStatus::Draft.code(), 0);
        assert_eq!(DocStatus::Submitted.code(), 1);
        assert_eq!(DocStatus::Cancelled.code(), 2);
        assert!(DocStatus::Submitted.is_submitted());
        assert!(!DocStatus::Cancelled.is_submitted());
    }
}

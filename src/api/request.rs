//! Request types for the Professional Tax API.

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_HOOK_EVENT;
use crate::models::SalarySlip;

fn default_event() -> String {
    DEFAULT_HOOK_EVENT.to_string()
}

/// Request body for `POST /salary-slip/events`.
///
/// ```
/// use professional_tax::api::SalarySlipEventRequest;
///
/// let request: SalarySlipEventRequest = serde_json::from_str(r#"{
///     "salary_slip": { "employee": "HR-EMP-00001", "start_date": "2026-05-01" }
/// }"#).unwrap();
/// assert_eq!(request.event, "validate");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalarySlipEventRequest {
    /// The lifecycle event being fired; defaults to `validate`.
    #[serde(default = "default_event")]
    pub event: String,
    /// The slip being saved.
    pub salary_slip: SalarySlip,
}

/// Request body for `POST /formulas/validate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormulaValidationRequest {
    /// The formula text to check.
    pub formula: String,
}

//! Response types for the Professional Tax API.
//!
//! This module defines the success bodies, the error body, and the mapping
//! from [`EngineError`] to HTTP status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::{DeductionOutcome, SalarySlip};

/// Response body for `POST /salary-slip/events`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalarySlipEventResponse {
    /// The applied deduction amount; zero when skipped.
    pub amount: Decimal,
    /// The slip after the hook ran.
    pub salary_slip: SalarySlip,
    /// The full outcome with its audit trace.
    pub outcome: DeductionOutcome,
}

/// Response body for `POST /formulas/validate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaValidationResponse {
    /// Whether the formula parses.
    pub valid: bool,
    /// The parse error, when invalid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Variables the formula reads, when valid.
    #[serde(default)]
    pub variables: Vec<String>,
}

/// A jurisdiction as listed by `GET /states`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSummary {
    /// Jurisdiction name.
    pub name: String,
    /// Components named by its formula rows, in stored order.
    pub components: Vec<String>,
}

/// Response body for `GET /states`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatesResponse {
    /// Jurisdictions selectable on an employee.
    pub states: Vec<StateSummary>,
}

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let message = error.to_string();
        match error {
            EngineError::MissingEmployee { .. } => ApiErrorResponse {
                status: StatusCode::BAD_REQUEST,
                error: ApiError::new("MISSING_EMPLOYEE", message),
            },
            EngineError::EmployeeNotFound { employee } => ApiErrorResponse {
                status: StatusCode::NOT_FOUND,
                error: ApiError::with_details(
                    "EMPLOYEE_NOT_FOUND",
                    message,
                    format!("No employee record with id '{}'", employee),
                ),
            },
            EngineError::InvalidFormula { .. } => ApiErrorResponse {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                error: ApiError::new("INVALID_FORMULA", message),
            },
            EngineError::StoreError { doctype, .. } => ApiErrorResponse {
                status: StatusCode::BAD_GATEWAY,
                error: ApiError::with_details(
                    "STORE_ERROR",
                    "Record lookup failed",
                    format!("{} ({})", message, doctype),
                ),
            },
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => {
                ApiErrorResponse {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    error: ApiError::with_details("CONFIG_ERROR", "Configuration error", message),
                }
            }
            EngineError::CalculationError { .. } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details("CALCULATION_ERROR", "Calculation failed", message),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_serialization() {
        let error = ApiError::new("TEST_ERROR", "Test message");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"code\":\"TEST_ERROR\""));
        assert!(json.contains("\"message\":\"Test message\""));
        assert!(!json.contains("details"));
    }

    #[test]
    fn test_employee_not_found_maps_to_404() {
        let api_error: ApiErrorResponse = EngineError::EmployeeNotFound {
            employee: "HR-EMP-09999".to_string(),
        }
        .into();
        assert_eq!(api_error.status, StatusCode::NOT_FOUND);
        assert_eq!(api_error.error.code, "EMPLOYEE_NOT_FOUND");
        assert_eq!(api_error.error.message, "Employee HR-EMP-09999 does not exist");
    }

    #[test]
    fn test_missing_employee_maps_to_400() {
        let api_error: ApiErrorResponse = EngineError::MissingEmployee {
            slip: "SLIP-1".to_string(),
        }
        .into();
        assert_eq!(api_error.status, StatusCode::BAD_REQUEST);
        assert_eq!(api_error.error.code, "MISSING_EMPLOYEE");
    }

    #[test]
    fn test_store_error_maps_to_502() {
        let api_error: ApiErrorResponse =
            EngineError::store("State", "Maharashtra", "connection reset").into();
        assert_eq!(api_error.status, StatusCode::BAD_GATEWAY);
        assert!(api_error.error.details.unwrap().contains("connection reset"));
    }

    #[test]
    fn test_validation_response_omits_missing_error() {
        let response = FormulaValidationResponse {
            valid: true,
            error: None,
            variables: vec!["gross_pay".to_string()],
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"valid":true,"variables":["gross_pay"]}"#);
    }
}

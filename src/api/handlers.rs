//! HTTP request handlers for the Professional Tax API.
//!
//! This module contains the handler functions for all API endpoints.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::formula::Formula;

use super::request::{FormulaValidationRequest, SalarySlipEventRequest};
use super::response::{
    ApiError, ApiErrorResponse, FormulaValidationResponse, SalarySlipEventResponse, StateSummary,
    StatesResponse,
};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/salary-slip/events", post(salary_slip_event_handler))
        .route("/formulas/validate", post(validate_formula_handler))
        .route("/states", get(states_handler))
        .with_state(state)
}

fn json_response<T: serde::Serialize>(status: StatusCode, body: T) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

/// Turns a body extraction failure into a 400 response.
fn rejection_response(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    json_response(StatusCode::BAD_REQUEST, error)
}

/// Handler for `POST /salary-slip/events`.
///
/// Fires a lifecycle event on the posted slip and returns the slip as the
/// hook left it.
async fn salary_slip_event_handler(
    State(state): State<AppState>,
    payload: Result<Json<SalarySlipEventRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };
    let SalarySlipEventRequest {
        event,
        mut salary_slip,
    } = request;
    info!(
        correlation_id = %correlation_id,
        salary_slip = %salary_slip.name,
        event = %event,
        "Processing salary slip event"
    );

    match state.hook().handle_event(&mut salary_slip, &event) {
        Ok(outcome) => {
            info!(
                correlation_id = %correlation_id,
                calculation_id = %outcome.calculation_id,
                amount = %outcome.amount,
                duration_us = outcome.audit_trace.duration_us,
                "Salary slip event completed"
            );
            json_response(
                StatusCode::OK,
                SalarySlipEventResponse {
                    amount: outcome.amount,
                    salary_slip,
                    outcome,
                },
            )
        }
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "Salary slip event failed"
            );
            let api_error: ApiErrorResponse = err.into();
            json_response(api_error.status, api_error.error)
        }
    }
}

/// Handler for `POST /formulas/validate`.
///
/// Checks that formula text parses, without evaluating it.
async fn validate_formula_handler(
    payload: Result<Json<FormulaValidationRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let response = match Formula::parse(&request.formula) {
        Ok(formula) => FormulaValidationResponse {
            valid: true,
            error: None,
            variables: formula.variables().into_iter().map(str::to_string).collect(),
        },
        Err(err) => {
            info!(
                correlation_id = %correlation_id,
                error = %err,
                "Formula rejected"
            );
            FormulaValidationResponse {
                valid: false,
                error: Some(err.to_string()),
                variables: Vec::new(),
            }
        }
    };
    json_response(StatusCode::OK, response)
}

/// Handler for `GET /states`.
///
/// Lists the jurisdictions an employee may be linked to.
async fn states_handler(State(state): State<AppState>) -> Response {
    let states = state
        .hook()
        .store()
        .active_jurisdictions()
        .into_iter()
        .map(|j| StateSummary {
            name: j.name.clone(),
            components: j.formula.iter().map(|r| r.component.clone()).collect(),
        })
        .collect();
    json_response(StatusCode::OK, StatesResponse { states })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;
    use crate::models::SkipReason;
    use axum::body::Body;
    use axum::http::Request;
    use rust_decimal::Decimal;
    use std::path::PathBuf;
    use tower::ServiceExt;

    fn create_test_state() -> AppState {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/sample");
        let config = ConfigLoader::load(dir).expect("Failed to load config");
        AppState::new(config)
    }

    async fn post_json(uri: &str, body: String) -> Response {
        create_router(create_test_state())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("Content-Type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_event_applies_deduction() {
        let body = r#"{
            "event": "validate",
            "salary_slip": {
                "name": "Sal Slip/HR-EMP-00002/00001",
                "employee": "HR-EMP-00002",
                "start_date": "2026-05-01",
                "earnings": [ { "salary_component": "Basic", "amount": 30000 } ]
            }
        }"#;
        let response = post_json("/salary-slip/events", body.to_string()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );

        let result: SalarySlipEventResponse = body_json(response).await;
        assert_eq!(result.amount, Decimal::new(200, 0));
        assert_eq!(result.outcome.jurisdiction.as_deref(), Some("Karnataka"));
        assert_eq!(
            result.salary_slip.deduction("Professional Tax").unwrap().amount,
            Decimal::new(200, 0)
        );
    }

    #[tokio::test]
    async fn test_other_event_is_skipped() {
        let body = r#"{
            "event": "on_cancel",
            "salary_slip": { "employee": "HR-EMP-00002", "start_date": "2026-05-01" }
        }"#;
        let response = post_json("/salary-slip/events", body.to_string()).await;
        assert_eq!(response.status(), StatusCode::OK);
        let result: SalarySlipEventResponse = body_json(response).await;
        assert_eq!(result.outcome.skip_reason(), Some(SkipReason::EventNotHandled));
    }

    #[tokio::test]
    async fn test_unknown_employee_returns_404() {
        let body = r#"{
            "salary_slip": { "employee": "HR-EMP-09999", "start_date": "2026-05-01" }
        }"#;
        let response = post_json("/salary-slip/events", body.to_string()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let error: ApiError = body_json(response).await;
        assert_eq!(error.code, "EMPLOYEE_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_malformed_json_returns_400() {
        let response = post_json("/salary-slip/events", "{invalid json".to_string()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error: ApiError = body_json(response).await;
        assert_eq!(error.code, "MALFORMED_JSON");
    }

    #[tokio::test]
    async fn test_missing_slip_returns_validation_error() {
        let response = post_json("/salary-slip/events", r#"{"event":"validate"}"#.to_string()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error: ApiError = body_json(response).await;
        assert_eq!(error.code, "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_validate_formula() {
        let response = post_json(
            "/formulas/validate",
            r#"{"formula":"200 if gross_pay > 10000 else 0"}"#.to_string(),
        )
        .await;
        let result: FormulaValidationResponse = body_json(response).await;
        assert!(result.valid);
        assert_eq!(result.variables, vec!["gross_pay".to_string()]);

        let response =
            post_json("/formulas/validate", r#"{"formula":"gross_pay +"}"#.to_string()).await;
        assert_eq!(response.status(), StatusCode::OK);
        let result: FormulaValidationResponse = body_json(response).await;
        assert!(!result.valid);
        assert_eq!(result.error.as_deref(), Some("unexpected end of formula"));
    }

    #[tokio::test]
    async fn test_states_lists_only_submitted() {
        let response = create_router(create_test_state())
            .oneshot(Request::builder().uri("/states").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let result: StatesResponse = body_json(response).await;
        let names: Vec<&str> = result.states.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Karnataka", "Maharashtra", "West Bengal"]);
    }
}

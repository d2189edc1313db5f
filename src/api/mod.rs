//! HTTP API module for the Professional Tax hook.
//!
//! This module exposes the salary slip lifecycle trigger, formula
//! validation, and the list of jurisdictions selectable on an employee.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{FormulaValidationRequest, SalarySlipEventRequest};
pub use response::{
    ApiError, ApiErrorResponse, FormulaValidationResponse, SalarySlipEventResponse, StateSummary,
    StatesResponse,
};
pub use state::AppState;

//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates storage to
//! [`CustomerService`](crate::services::CustomerService).

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};

use super::dto::HealthResponse;
use super::error::AppError;
use super::state::AppState;
use crate::models::{Customer, CustomerId, CustomerPayload};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Unparseable JSON is a 400; other rejections keep their own status.
fn body(payload: Result<Json<CustomerPayload>, JsonRejection>) -> Result<CustomerPayload, AppError> {
    payload.map(|Json(p)| p).map_err(|rejection| match rejection {
        JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
            AppError::BadRequest(rejection.body_text())
        }
        _ => AppError::Rejected(rejection.status(), rejection.body_text()),
    })
}

fn customer_id(id: Result<Path<CustomerId>, PathRejection>) -> Result<CustomerId, AppError> {
    id.map(|Path(id)| id)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the store is reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match state.customers.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Customers
// =============================================================================

/// POST /customers
///
/// Register a new customer. Any client-supplied id is ignored.
pub async fn register_customer(
    State(state): State<AppState>,
    payload: Result<Json<CustomerPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Customer>), AppError> {
    let mut customer = body(payload)?
        .into_customer()
        .map_err(AppError::Validation)?;
    customer.id = None;

    if let Some(field) = state.customers.find_conflict(&customer, None).await? {
        tracing::info!(%field, "registration rejected, value already taken");
        return Err(AppError::Conflict(Some(field)));
    }

    let saved = state.customers.save(&customer).await?;
    tracing::info!(
        customer_id = ?saved.id.map(|id| id.value()),
        username = %saved.username,
        "registered customer"
    );
    Ok((StatusCode::CREATED, Json(saved)))
}

/// GET /customers
pub async fn list_customers(State(state): State<AppState>) -> HandlerResult<Vec<Customer>> {
    Ok(Json(state.customers.find_all().await?))
}

/// PUT /customers
///
/// Replace an existing customer. The payload must carry the id; an absent
/// password keeps the stored one.
pub async fn update_customer(
    State(state): State<AppState>,
    payload: Result<Json<CustomerPayload>, JsonRejection>,
) -> HandlerResult<Customer> {
    let mut customer = body(payload)?
        .into_customer()
        .map_err(AppError::Validation)?;
    let id = customer
        .id
        .ok_or_else(|| AppError::BadRequest("Customer id is required for update".to_string()))?;

    let existing = state
        .customers
        .find_by_id(id)
        .await?
        .ok_or(AppError::CustomerNotFound)?;
    if customer.password_digest.is_none() {
        customer.password_digest = existing.password_digest;
    }

    if let Some(field) = state.customers.find_conflict(&customer, Some(id)).await? {
        tracing::info!(customer_id = id.value(), %field, "update rejected, value already taken");
        return Err(AppError::Conflict(Some(field)));
    }

    let saved = state.customers.save(&customer).await?;
    tracing::info!(customer_id = id.value(), "updated customer");
    Ok(Json(saved))
}

/// GET /customers/{id}
pub async fn get_customer(
    State(state): State<AppState>,
    id: Result<Path<CustomerId>, PathRejection>,
) -> HandlerResult<Customer> {
    let id = customer_id(id)?;
    state
        .customers
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or(AppError::CustomerNotFound)
}

/// GET /customers/email/{email}
pub async fn get_customer_by_email(
    State(state): State<AppState>,
    email: Result<Path<String>, PathRejection>,
) -> HandlerResult<Customer> {
    let Path(email) = email.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    if email.is_empty() {
        return Err(missing_email().await);
    }

    state
        .customers
        .find_by_email(&email)
        .await?
        .map(Json)
        .ok_or(AppError::CustomerNotFound)
}

/// GET /customers/email/
pub async fn missing_email() -> AppError {
    AppError::BadRequest("Email path segment is required".to_string())
}

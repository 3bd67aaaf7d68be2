//! Tests for db::repository::error module.

use customerdb::db::repository::error::unique_field_from_constraint;
use customerdb::db::repository::{ErrorContext, RepositoryError};
use customerdb::models::UniqueField;

#[test]
fn test_error_context_chaining() {
    let ctx = ErrorContext::new("save")
        .with_entity("customer")
        .with_entity_id(42)
        .with_details("timeout occurred")
        .retryable();

    assert_eq!(ctx.operation, Some("save".to_string()));
    assert_eq!(ctx.entity, Some("customer".to_string()));
    assert_eq!(ctx.entity_id, Some("42".to_string()));
    assert_eq!(ctx.details, Some("timeout occurred".to_string()));
    assert!(ctx.retryable);
}

#[test]
fn test_error_context_display() {
    let ctx = ErrorContext::new("find_by_email")
        .with_entity("customer")
        .with_entity_id("7")
        .retryable();

    let display = format!("{}", ctx);
    assert!(display.contains("operation=find_by_email"));
    assert!(display.contains("entity=customer"));
    assert!(display.contains("id=7"));
    assert!(display.contains("retryable=true"));
}

#[test]
fn test_error_context_default() {
    let ctx = ErrorContext::default();
    assert!(ctx.operation.is_none());
    assert!(ctx.entity.is_none());
    assert!(ctx.entity_id.is_none());
    assert!(ctx.details.is_none());
    assert!(!ctx.retryable);
    assert_eq!(ctx.to_string(), "[]");
}

#[test]
fn test_connection_errors_are_retryable() {
    let err = RepositoryError::connection("connection failed");
    assert!(err.to_string().contains("Connection error"));
    assert!(err.is_retryable());

    let err = RepositoryError::connection_with_context("refused", ErrorContext::new("connect"));
    assert!(err.is_retryable());
    assert_eq!(err.context().operation.as_deref(), Some("connect"));
}

#[test]
fn test_terminal_errors_are_not_retryable() {
    assert!(!RepositoryError::query("bad sql").is_retryable());
    assert!(!RepositoryError::not_found("missing").is_retryable());
    assert!(!RepositoryError::configuration("bad config").is_retryable());
    assert!(!RepositoryError::internal("boom").is_retryable());
    assert!(
        !RepositoryError::conflict(UniqueField::Email, ErrorContext::new("save")).is_retryable()
    );
}

#[test]
fn test_conflict_field() {
    let email = RepositoryError::conflict(UniqueField::Email, ErrorContext::new("save"));
    assert_eq!(email.conflict_field(), Some(UniqueField::Email));
    assert!(email.to_string().contains("Conflict: email already exists"));

    let unknown = RepositoryError::conflict_unknown("duplicate key", ErrorContext::default());
    assert_eq!(unknown.conflict_field(), None);
    assert!(matches!(unknown, RepositoryError::Conflict { .. }));

    assert_eq!(RepositoryError::not_found("x").conflict_field(), None);
}

#[test]
fn test_with_operation_overwrites_context() {
    let err = RepositoryError::not_found_with_context(
        "Customer 3 not found",
        ErrorContext::new("lookup").with_entity_id(3),
    )
    .with_operation("save");

    assert_eq!(err.context().operation.as_deref(), Some("save"));
    assert_eq!(err.context().entity_id.as_deref(), Some("3"));
    assert!(err.to_string().contains("Not found: Customer 3 not found"));
}

#[test]
fn test_unique_field_from_constraint() {
    assert_eq!(
        unique_field_from_constraint(Some("customers_email_key"), ""),
        Some(UniqueField::Email)
    );
    assert_eq!(
        unique_field_from_constraint(None, "Key (username)=(test) already exists."),
        Some(UniqueField::Username)
    );
    assert_eq!(unique_field_from_constraint(None, ""), None);
}

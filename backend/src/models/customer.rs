//! Customer entity, inbound payload and field-level validation.

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{Validate, ValidationErrors};

use super::password::{digest_password, verify_password};

crate::define_id_type!(i64, CustomerId);

/// A stored customer record.
///
/// `id` is `None` only before the record has been persisted. The password
/// digest is never serialized in either direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Option<CustomerId>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub username: String,
    #[serde(skip)]
    pub password_digest: Option<String>,
}

impl Customer {
    /// Build an unsaved customer with the two required fields.
    pub fn new(email: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: None,
            first_name: None,
            last_name: None,
            email: email.into(),
            username: username.into(),
            password_digest: None,
        }
    }

    pub fn with_names(mut self, first_name: Option<&str>, last_name: Option<&str>) -> Self {
        self.first_name = first_name.map(str::to_string);
        self.last_name = last_name.map(str::to_string);
        self
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Whether `candidate` is the password this customer registered with.
    ///
    /// Customers without a stored password never match.
    pub fn matches_password(&self, candidate: &str) -> bool {
        self.password_digest
            .as_deref()
            .is_some_and(|digest| verify_password(digest, candidate))
    }

    /// Value of one of the uniquely indexed fields.
    pub fn unique_value(&self, field: UniqueField) -> &str {
        match field {
            UniqueField::Email => &self.email,
            UniqueField::Username => &self.username,
        }
    }
}

/// Fields that must be unique across all customers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UniqueField {
    Email,
    Username,
}

impl UniqueField {
    pub const ALL: [UniqueField; 2] = [UniqueField::Email, UniqueField::Username];

    pub fn as_str(&self) -> &'static str {
        match self {
            UniqueField::Email => "email",
            UniqueField::Username => "username",
        }
    }
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failed validation rule on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Customer as received from a client on create or update.
///
/// Everything is optional here so that a missing `email` or `username`
/// surfaces as a validation failure rather than a body parsing failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPayload {
    pub id: Option<CustomerId>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[validate(
        required(message = "Email should not be null"),
        length(min = 1, message = "Email should not be empty"),
        email(message = "Email should be a valid email address")
    )]
    pub email: Option<String>,
    #[validate(
        required(message = "Username should not be null"),
        length(min = 1, message = "Username should not be empty")
    )]
    pub username: Option<String>,
    pub password: Option<String>,
}

impl CustomerPayload {
    /// All rule violations, ordered by field name and then by rule
    /// (`required`, `length`, `email`), so the first entry is stable.
    pub fn violations(&self) -> Vec<FieldViolation> {
        match self.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => flatten_errors(&errors),
        }
    }

    /// Validate and convert into a [`Customer`], digesting the password.
    ///
    /// The payload id is carried over unchanged; callers decide whether to
    /// honour it.
    pub fn into_customer(self) -> Result<Customer, Vec<FieldViolation>> {
        let violations = self.violations();
        if !violations.is_empty() {
            return Err(violations);
        }

        let Self {
            id,
            first_name,
            last_name,
            email,
            username,
            password,
        } = self;

        match (email, username) {
            (Some(email), Some(username)) => Ok(Customer {
                id,
                first_name,
                last_name,
                email,
                username,
                password_digest: password.as_deref().map(digest_password),
            }),
            (email, _) => {
                let field = if email.is_none() { "email" } else { "username" };
                Err(vec![FieldViolation::new(
                    field,
                    "required",
                    format!("{field} is required"),
                )])
            }
        }
    }
}

fn rule_rank(code: &str) -> u8 {
    match code {
        "required" => 0,
        "length" => 1,
        "email" => 2,
        _ => 3,
    }
}

fn flatten_errors(errors: &ValidationErrors) -> Vec<FieldViolation> {
    let mut violations: Vec<FieldViolation> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, field_errors)| {
            let field = field.to_string();
            field_errors.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field));
                FieldViolation::new(field.clone(), e.code.to_string(), message)
            })
        })
        .collect();

    violations.sort_by(|a, b| {
        a.field
            .cmp(&b.field)
            .then_with(|| rule_rank(&a.code).cmp(&rule_rank(&b.code)))
    });
    violations
}

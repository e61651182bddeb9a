//! Boundary helpers shared by the feature modules.

pub mod timestamps;

use serde::Serialize;

/// One rejected input field, rendered into error `details`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub error: String,
}

impl FieldError {
    pub fn new(field: &'static str, error: impl Into<String>) -> Self {
        Self {
            field,
            error: error.into(),
        }
    }
}

/// Trimmed email, or a field error when it is blank or has no `@`.
pub fn validate_email(email: &str, errors: &mut Vec<FieldError>) -> String {
    let email = email.trim();
    if email.is_empty() {
        errors.push(FieldError::new("email", "required"));
    } else if !email.contains('@') {
        errors.push(FieldError::new("email", "must be an email address"));
    }
    email.to_string()
}

pub fn field_details(errors: &[FieldError]) -> Vec<serde_json::Value> {
    errors
        .iter()
        .map(|error| serde_json::json!({ "field": error.field, "error": error.error }))
        .collect()
}

use chrono::NaiveDate;
use slotbook_authz::AuthError;
use slotbook_db::StoreError;
use slotbook_http::AppError;
use thiserror::Error;

use crate::utils::{field_details, FieldError};

/// Why the booking pipeline refused a request.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("malformed booking body: {0}")]
    MalformedBody(String),

    #[error("invalid booking fields")]
    InvalidFields(Vec<FieldError>),

    #[error("booking conflicts with an existing booking on {day}")]
    Overlap { day: NaiveDate },

    #[error("email '{email}' belongs to a registered user; log in or use another email")]
    EmailTaken { email: String },

    /// A read needed to decide admission failed.
    #[error("booking store unavailable")]
    StoreUnavailable(#[source] StoreError),

    #[error("failed to write booking")]
    Persist(#[source] StoreError),
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Auth(AuthError::InvalidCredential) => {
                AppError::unauthorized("invalid API key")
            }
            BookingError::Auth(AuthError::NotAdministrator) => {
                AppError::unauthorized("administrator privileges required")
            }
            BookingError::Auth(other) => {
                AppError::Internal(anyhow::Error::new(other).context("identity resolution failed"))
            }
            BookingError::MalformedBody(message) => AppError::bad_request(message),
            BookingError::InvalidFields(errors) => {
                AppError::bad_request_with(field_details(&errors), "invalid booking fields")
            }
            err @ BookingError::Overlap { .. } => AppError::conflict(
                vec![serde_json::json!({ "reason": "overlap" })],
                err.to_string(),
            ),
            err @ BookingError::EmailTaken { .. } => AppError::conflict(
                vec![serde_json::json!({ "reason": "email_taken" })],
                err.to_string(),
            ),
            BookingError::StoreUnavailable(source) => {
                AppError::Internal(anyhow::Error::new(source).context("booking store unavailable"))
            }
            BookingError::Persist(source) => {
                AppError::Internal(anyhow::Error::new(source).context("failed to write booking"))
            }
        }
    }
}

use serde::{Deserialize, Serialize};
use slotbook_db::BookingDraft;

use super::error::BookingError;
use crate::utils::timestamps::parse_timestamp;
use crate::utils::{validate_email, FieldError};

/// Booking body as sent by clients on create and edit.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub name: String,
    pub surname: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// Service id; absent and `0` both mean the standard service.
    #[serde(default)]
    pub service: Option<i32>,
    pub start_time: String,
    pub end_time: String,
}

impl BookingRequest {
    pub fn parse(body: &[u8]) -> Result<Self, BookingError> {
        serde_json::from_slice(body).map_err(|err| BookingError::MalformedBody(err.to_string()))
    }

    /// Check every field and parse timestamps, reporting all failures at once.
    /// The service stays as sent; defaulting happens during admission.
    pub fn validate(self) -> Result<BookingDraft, BookingError> {
        let mut errors = Vec::new();

        let name = self.name.trim().to_string();
        if name.is_empty() {
            errors.push(FieldError::new("name", "required"));
        }

        let email = validate_email(&self.email, &mut errors);

        let service = self.service.unwrap_or(0);
        if service < 0 {
            errors.push(FieldError::new("service", "must not be negative"));
        }

        let start_time = parse_timestamp(&self.start_time);
        if start_time.is_none() {
            errors.push(FieldError::new("start_time", "expected YYYY-MM-DDTHH:MM:SS"));
        }
        let end_time = parse_timestamp(&self.end_time);
        if end_time.is_none() {
            errors.push(FieldError::new("end_time", "expected YYYY-MM-DDTHH:MM:SS"));
        }

        match (start_time, end_time) {
            (Some(start_time), Some(end_time)) if errors.is_empty() => {
                if start_time >= end_time {
                    return Err(BookingError::InvalidFields(vec![FieldError::new(
                        "end_time",
                        "must be after start_time",
                    )]));
                }

                Ok(BookingDraft {
                    name,
                    surname: self.surname.trim().to_string(),
                    email,
                    phone: self
                        .phone
                        .map(|phone| phone.trim().to_string())
                        .filter(|phone| !phone.is_empty()),
                    service,
                    start_time,
                    end_time,
                })
            }
            _ => Err(BookingError::InvalidFields(errors)),
        }
    }
}

/// A booking as one particular viewer may see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingView {
    pub id: i64,
    /// Owner id; `0` for guest bookings and redacted rows.
    pub user_id: i64,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub phone: String,
    pub service: i32,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedBooking {
    pub id: i64,
}

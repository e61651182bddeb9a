use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// A persisted booking row.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct BookingRecord {
    pub id: i64,
    /// Owning identity; `None` for guest bookings.
    pub user_id: Option<i64>,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub phone: Option<String>,
    pub service: i32,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
}

/// Booking fields written on insert and update. The owner is passed alongside
/// on insert and never changed by an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingDraft {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub phone: Option<String>,
    pub service: i32,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
}

impl BookingDraft {
    /// Calendar day the booking belongs to, taken from its start.
    pub fn day(&self) -> NaiveDate {
        self.start_time.date()
    }

    pub(crate) fn into_record(self, id: i64, user_id: Option<i64>) -> BookingRecord {
        BookingRecord {
            id,
            user_id,
            name: self.name,
            surname: self.surname,
            email: self.email,
            phone: self.phone,
            service: self.service,
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct IdentityRecord {
    pub id: i64,
    pub name: String,
    pub surname: String,
    pub email: String,
    #[sqlx(rename = "password")]
    pub password_hash: String,
    pub api_key: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub password_hash: String,
    pub api_key: String,
    pub is_admin: bool,
}

/// Bookable service reference data. Duration is in minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ServiceRecord {
    pub id: i32,
    pub name: String,
    pub duration: i32,
}

impl ServiceRecord {
    /// The service every store starts with; bookings without a service use it.
    pub fn standard() -> Self {
        Self {
            id: 1,
            name: "Standard appointment".to_string(),
            duration: 60,
        }
    }
}

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use slotbook_kernel::Migration;

use crate::error::StoreResult;
use crate::models::{BookingDraft, BookingRecord, IdentityRecord, NewIdentity, ServiceRecord};

/// Durable owner of bookings, identities and service reference data.
///
/// Implementations handle their own internal concurrency; every call is
/// request-scoped and nothing is cached between calls.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Insert a booking, re-checking same-day overlap atomically with the write.
    ///
    /// Returns [`crate::StoreError::Overlap`] when an overlapping booking on the
    /// same day already exists.
    async fn insert_booking(&self, owner: Option<i64>, booking: &BookingDraft) -> StoreResult<i64>;

    /// Overwrite the fields of booking `id`. Updating a missing id is not an error.
    async fn update_booking(&self, id: i64, booking: &BookingDraft) -> StoreResult<()>;

    /// Delete booking `id`. Deleting a missing id is not an error.
    async fn delete_booking(&self, id: i64) -> StoreResult<()>;

    /// Count bookings starting on `day` whose interval overlaps `(start, end)`
    /// under open-interval comparison.
    async fn count_overlapping(
        &self,
        day: NaiveDate,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> StoreResult<i64>;

    /// Every booking joined to its owner, in booking id order.
    async fn list_bookings(&self) -> StoreResult<Vec<(BookingRecord, Option<IdentityRecord>)>>;

    async fn find_identity_by_token(&self, token: &str) -> StoreResult<Option<IdentityRecord>>;

    async fn find_identity_by_email(&self, email: &str) -> StoreResult<Option<IdentityRecord>>;

    async fn email_exists(&self, email: &str) -> StoreResult<bool>;

    /// Returns [`crate::StoreError::DuplicateEmail`] when the email is taken.
    async fn insert_identity(&self, identity: &NewIdentity) -> StoreResult<i64>;

    async fn list_services(&self) -> StoreResult<Vec<ServiceRecord>>;

    /// Apply module migrations not yet recorded. Stores without a schema ignore them.
    async fn migrate(&self, _migrations: &[(String, Migration)]) -> StoreResult<()> {
        Ok(())
    }
}

/// Open-interval overlap between `[a_start, a_end)` and `[b_start, b_end)`.
pub fn intervals_overlap(
    a_start: NaiveDateTime,
    a_end: NaiveDateTime,
    b_start: NaiveDateTime,
    b_end: NaiveDateTime,
) -> bool {
    a_start < b_end && b_start < a_end
}

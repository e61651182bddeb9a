use std::sync::Arc;

use chrono::NaiveDateTime;
use slotbook_db::{BookingStore, StoreError};

/// Decides whether a proposed slot collides with an existing booking.
///
/// Two bookings conflict when they start on the same calendar day and their
/// intervals overlap (`existing.start < end && start < existing.end`). A
/// booking that crosses midnight is only compared with bookings starting on
/// its own start day.
#[derive(Clone)]
pub struct ConflictDetector {
    store: Arc<dyn BookingStore>,
}

impl ConflictDetector {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    /// Store failures are returned as errors, never read as "no conflict".
    pub async fn check_conflict(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<bool, StoreError> {
        let day = start.date();
        let overlapping = self.store.count_overlapping(day, start, end).await?;
        if overlapping > 0 {
            tracing::debug!(%day, %start, %end, overlapping, "slot conflicts with existing bookings");
        }
        Ok(overlapping > 0)
    }
}

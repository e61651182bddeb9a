use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use tokio::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::models::{BookingDraft, BookingRecord, IdentityRecord, NewIdentity, ServiceRecord};
use crate::store::{intervals_overlap, BookingStore};

/// Process-local store used by tests and the `memory` backend.
///
/// A single lock guards all tables, so the overlap check inside
/// [`BookingStore::insert_booking`] and the insert happen as one step.
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    bookings: BTreeMap<i64, BookingRecord>,
    identities: BTreeMap<i64, IdentityRecord>,
    services: Vec<ServiceRecord>,
    last_booking_id: i64,
    last_identity_id: i64,
}

impl MemoryState {
    fn overlapping(&self, day: NaiveDate, start: NaiveDateTime, end: NaiveDateTime) -> i64 {
        let count = self
            .bookings
            .values()
            .filter(|existing| existing.start_time.date() == day)
            .filter(|existing| intervals_overlap(existing.start_time, existing.end_time, start, end))
            .count();
        i64::try_from(count).unwrap_or(i64::MAX)
    }
}

impl MemoryStore {
    /// Empty store seeded with the standard service.
    pub fn new() -> Self {
        let state = MemoryState {
            services: vec![ServiceRecord::standard()],
            ..MemoryState::default()
        };
        Self {
            state: RwLock::new(state),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn insert_booking(&self, owner: Option<i64>, booking: &BookingDraft) -> StoreResult<i64> {
        let mut state = self.state.write().await;
        let day = booking.day();
        if state.overlapping(day, booking.start_time, booking.end_time) > 0 {
            return Err(StoreError::Overlap { day });
        }

        state.last_booking_id += 1;
        let id = state.last_booking_id;
        state
            .bookings
            .insert(id, booking.clone().into_record(id, owner));
        Ok(id)
    }

    async fn update_booking(&self, id: i64, booking: &BookingDraft) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if let Some(existing) = state.bookings.get_mut(&id) {
            let owner = existing.user_id;
            *existing = booking.clone().into_record(id, owner);
        }
        Ok(())
    }

    async fn delete_booking(&self, id: i64) -> StoreResult<()> {
        self.state.write().await.bookings.remove(&id);
        Ok(())
    }

    async fn count_overlapping(
        &self,
        day: NaiveDate,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> StoreResult<i64> {
        Ok(self.state.read().await.overlapping(day, start, end))
    }

    async fn list_bookings(&self) -> StoreResult<Vec<(BookingRecord, Option<IdentityRecord>)>> {
        let state = self.state.read().await;
        Ok(state
            .bookings
            .values()
            .map(|booking| {
                let owner = booking
                    .user_id
                    .and_then(|user_id| state.identities.get(&user_id).cloned());
                (booking.clone(), owner)
            })
            .collect())
    }

    async fn find_identity_by_token(&self, token: &str) -> StoreResult<Option<IdentityRecord>> {
        let state = self.state.read().await;
        Ok(state
            .identities
            .values()
            .find(|identity| identity.api_key == token)
            .cloned())
    }

    async fn find_identity_by_email(&self, email: &str) -> StoreResult<Option<IdentityRecord>> {
        let state = self.state.read().await;
        Ok(state
            .identities
            .values()
            .find(|identity| identity.email == email)
            .cloned())
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        Ok(self.find_identity_by_email(email).await?.is_some())
    }

    async fn insert_identity(&self, identity: &NewIdentity) -> StoreResult<i64> {
        let mut state = self.state.write().await;
        if state
            .identities
            .values()
            .any(|existing| existing.email == identity.email)
        {
            return Err(StoreError::DuplicateEmail {
                email: identity.email.clone(),
            });
        }

        state.last_identity_id += 1;
        let id = state.last_identity_id;
        state.identities.insert(
            id,
            IdentityRecord {
                id,
                name: identity.name.clone(),
                surname: identity.surname.clone(),
                email: identity.email.clone(),
                password_hash: identity.password_hash.clone(),
                api_key: identity.api_key.clone(),
                is_admin: identity.is_admin,
            },
        );
        Ok(id)
    }

    async fn list_services(&self) -> StoreResult<Vec<ServiceRecord>> {
        Ok(self.state.read().await.services.clone())
    }
}

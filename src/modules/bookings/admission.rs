use std::sync::Arc;

use slotbook_authz::{require_administrator, Identity, IdentityResolver};
use slotbook_db::{BookingDraft, BookingStore, StoreError};
use slotbook_events::{BookingNotice, NotificationDispatcher};

use super::conflict::ConflictDetector;
use super::error::BookingError;
use super::models::{BookingRequest, BookingView};
use super::visibility::{owns, project};
use crate::bootstrap::AppContext;
use crate::utils::timestamps::format_timestamp;

/// Service id used when a booking names none.
pub const DEFAULT_SERVICE: i32 = 1;

pub fn normalize_service(service: i32) -> i32 {
    if service == 0 {
        DEFAULT_SERVICE
    } else {
        service
    }
}

/// Runs create, edit, delete and list for bookings. Every gate that fails
/// aborts the request before anything is written.
#[derive(Clone)]
pub struct AdmissionPipeline {
    store: Arc<dyn BookingStore>,
    resolver: IdentityResolver,
    conflicts: ConflictDetector,
    notifications: NotificationDispatcher,
}

impl AdmissionPipeline {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            store: Arc::clone(&ctx.store),
            resolver: ctx.resolver.clone(),
            conflicts: ConflictDetector::new(Arc::clone(&ctx.store)),
            notifications: ctx.notifications.clone(),
        }
    }

    /// Create a booking for whoever `credential` resolves to; guests pass none.
    pub async fn create(&self, credential: Option<&str>, body: &[u8]) -> Result<i64, BookingError> {
        let identity = self.resolver.resolve(credential).await?;
        self.admit(&identity, credential, body).await
    }

    /// Create a booking as a guest, whatever credential the caller holds.
    pub async fn create_as_guest(&self, body: &[u8]) -> Result<i64, BookingError> {
        self.admit(&Identity::Anonymous, None, body).await
    }

    async fn admit(
        &self,
        identity: &Identity,
        credential: Option<&str>,
        body: &[u8],
    ) -> Result<i64, BookingError> {
        let mut draft = BookingRequest::parse(body)?.validate()?;

        if self
            .conflicts
            .check_conflict(draft.start_time, draft.end_time)
            .await
            .map_err(BookingError::StoreUnavailable)?
        {
            return Err(BookingError::Overlap { day: draft.day() });
        }

        self.ensure_email_available(identity, &draft.email).await?;
        draft.service = normalize_service(draft.service);

        let owner = match identity {
            Identity::User(_) => self.resolve_owner(credential).await,
            Identity::Anonymous => None,
        };

        let id = self
            .store
            .insert_booking(owner, &draft)
            .await
            .map_err(|err| match err {
                StoreError::Overlap { day } => BookingError::Overlap { day },
                other => BookingError::Persist(other),
            })?;

        tracing::info!(
            booking_id = id,
            owner = ?owner,
            day = %draft.day(),
            "booking admitted"
        );

        self.notifications.booking_created(&notice(&draft));
        Ok(id)
    }

    /// Registered callers may book with their own email; any other email that
    /// belongs to an account is refused so its owner has to log in.
    async fn ensure_email_available(
        &self,
        identity: &Identity,
        email: &str,
    ) -> Result<(), BookingError> {
        if identity
            .principal()
            .is_some_and(|principal| principal.email == email)
        {
            return Ok(());
        }

        let taken = self
            .store
            .email_exists(email)
            .await
            .map_err(BookingError::StoreUnavailable)?;
        if taken {
            return Err(BookingError::EmailTaken {
                email: email.to_string(),
            });
        }
        Ok(())
    }

    /// Re-read the owner id behind `credential`. Failures fall back to an
    /// ownerless booking instead of refusing it.
    async fn resolve_owner(&self, credential: Option<&str>) -> Option<i64> {
        let token = credential?;
        match self.store.find_identity_by_token(token).await {
            Ok(Some(owner)) => Some(owner.id),
            Ok(None) => {
                tracing::warn!("owner vanished before insert; booking stored without owner");
                None
            }
            Err(err) => {
                tracing::warn!(error = %err, "owner lookup failed; booking stored without owner");
                None
            }
        }
    }

    /// Replace a booking's fields. Administrators only; the new interval is
    /// not checked for conflicts.
    pub async fn edit(
        &self,
        credential: Option<&str>,
        id: i64,
        body: &[u8],
    ) -> Result<(), BookingError> {
        let identity = self.resolver.resolve(credential).await?;
        require_administrator(&identity)?;

        let mut draft: BookingDraft = BookingRequest::parse(body)?.validate()?;
        draft.service = normalize_service(draft.service);

        self.store
            .update_booking(id, &draft)
            .await
            .map_err(BookingError::Persist)?;

        tracing::info!(booking_id = id, "booking edited");
        Ok(())
    }

    /// Delete a booking by id. Administrators only; deleting a missing id succeeds.
    pub async fn delete(&self, credential: Option<&str>, id: i64) -> Result<(), BookingError> {
        let identity = self.resolver.resolve(credential).await?;
        require_administrator(&identity)?;

        self.store
            .delete_booking(id)
            .await
            .map_err(BookingError::Persist)?;

        tracing::info!(booking_id = id, "booking deleted");
        Ok(())
    }

    /// Every booking in store order, each redacted for the caller on its own.
    pub async fn list(&self, credential: Option<&str>) -> Result<Vec<BookingView>, BookingError> {
        let identity = self.resolver.resolve(credential).await?;
        let rows = self
            .store
            .list_bookings()
            .await
            .map_err(BookingError::StoreUnavailable)?;

        Ok(rows
            .into_iter()
            .map(|(booking, owner)| {
                let viewer_owns_booking = owns(&identity, owner.as_ref());
                project(booking, &identity, viewer_owns_booking)
            })
            .collect())
    }
}

fn notice(draft: &BookingDraft) -> BookingNotice {
    BookingNotice {
        name: draft.name.clone(),
        surname: draft.surname.clone(),
        email: draft.email.clone(),
        start_time: format_timestamp(draft.start_time),
        end_time: format_timestamp(draft.end_time),
    }
}

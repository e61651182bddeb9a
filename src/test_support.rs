//! Shared fixtures for unit and HTTP tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{json, Value};
use slotbook_authz::{generate_api_key, PasswordHasher};
use slotbook_db::{
    BookingDraft, BookingRecord, BookingStore, IdentityRecord, MemoryStore, NewIdentity,
    ServiceRecord, StoreError, StoreResult,
};
use slotbook_events::{MemoryNotifier, NotificationDispatcher};
use slotbook_kernel::settings::Settings;
use tower::ServiceExt;

use crate::bootstrap::{build_registry, AppContext};
use crate::utils::timestamps::parse_timestamp;

pub const ADMIN_INBOX: &str = "admin@example.com";

pub fn at(value: &str) -> NaiveDateTime {
    parse_timestamp(value).unwrap_or_else(|| panic!("bad test timestamp {value}"))
}

pub fn draft(start: &str, end: &str) -> BookingDraft {
    BookingDraft {
        name: "John".to_string(),
        surname: "Doe".to_string(),
        email: "john@example.com".to_string(),
        phone: None,
        service: 1,
        start_time: at(start),
        end_time: at(end),
    }
}

/// Create body for John Doe without phone or service.
pub fn booking_json(start: &str, end: &str, email: &str) -> Value {
    json!({
        "name": "John",
        "surname": "Doe",
        "email": email,
        "start_time": start,
        "end_time": end
    })
}

/// Memory store with switchable failures.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub fail_overlap_counts: bool,
    pub fail_inserts: bool,
    /// Token lookups succeed this many times, then fail.
    pub token_lookups_before_failure: Option<usize>,
    pub token_lookups: AtomicUsize,
}

fn injected(operation: &str) -> StoreError {
    StoreError::Unavailable(format!("injected {operation} failure"))
}

#[async_trait]
impl BookingStore for FlakyStore {
    async fn insert_booking(&self, owner: Option<i64>, booking: &BookingDraft) -> StoreResult<i64> {
        if self.fail_inserts {
            return Err(injected("insert"));
        }
        self.inner.insert_booking(owner, booking).await
    }

    async fn update_booking(&self, id: i64, booking: &BookingDraft) -> StoreResult<()> {
        self.inner.update_booking(id, booking).await
    }

    async fn delete_booking(&self, id: i64) -> StoreResult<()> {
        self.inner.delete_booking(id).await
    }

    async fn count_overlapping(
        &self,
        day: NaiveDate,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> StoreResult<i64> {
        if self.fail_overlap_counts {
            return Err(injected("overlap count"));
        }
        self.inner.count_overlapping(day, start, end).await
    }

    async fn list_bookings(&self) -> StoreResult<Vec<(BookingRecord, Option<IdentityRecord>)>> {
        self.inner.list_bookings().await
    }

    async fn find_identity_by_token(&self, token: &str) -> StoreResult<Option<IdentityRecord>> {
        let seen = self.token_lookups.fetch_add(1, Ordering::SeqCst);
        if self
            .token_lookups_before_failure
            .is_some_and(|allowed| seen >= allowed)
        {
            return Err(injected("token lookup"));
        }
        self.inner.find_identity_by_token(token).await
    }

    async fn find_identity_by_email(&self, email: &str) -> StoreResult<Option<IdentityRecord>> {
        self.inner.find_identity_by_email(email).await
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        self.inner.email_exists(email).await
    }

    async fn insert_identity(&self, identity: &NewIdentity) -> StoreResult<i64> {
        self.inner.insert_identity(identity).await
    }

    async fn list_services(&self) -> StoreResult<Vec<ServiceRecord>> {
        self.inner.list_services().await
    }
}

/// The full router over a memory-backed context.
pub struct TestApp {
    pub ctx: AppContext,
    pub notifier: Arc<MemoryNotifier>,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<dyn BookingStore>) -> Self {
        Self::build(store, Arc::new(MemoryNotifier::new()))
    }

    pub fn with_failing_notifier() -> Self {
        Self::build(Arc::new(MemoryStore::new()), Arc::new(MemoryNotifier::failing()))
    }

    fn build(store: Arc<dyn BookingStore>, notifier: Arc<MemoryNotifier>) -> Self {
        let notifications =
            NotificationDispatcher::new(notifier.clone(), Some(ADMIN_INBOX.to_string()));
        let ctx = AppContext::new(store, notifications, PasswordHasher::new(4));
        let registry = build_registry(&ctx).expect("modules register");
        let router = slotbook_http::build_router(&registry, &Settings::default());
        Self {
            ctx,
            notifier,
            router,
        }
    }

    /// Insert an identity directly; returns its id and API key.
    pub async fn register(&self, email: &str, is_admin: bool) -> (i64, String) {
        let api_key = generate_api_key();
        let id = self
            .ctx
            .store
            .insert_identity(&NewIdentity {
                name: "John".to_string(),
                surname: "Doe".to_string(),
                email: email.to_string(),
                password_hash: self.ctx.hasher.hash("password").unwrap(),
                api_key: api_key.clone(),
                is_admin,
            })
            .await
            .unwrap();
        (id, api_key)
    }

    /// Send one request through the router; an empty response body reads as `null`.
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        credential: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(credential) = credential {
            request = request.header("authorization", credential);
        }
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }
}

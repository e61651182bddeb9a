//! Booking store contract with PostgreSQL and in-memory implementations.

use std::sync::Arc;

use anyhow::Context;
use slotbook_kernel::settings::{DatabaseSettings, StoreBackend};

pub mod error;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use models::{BookingDraft, BookingRecord, IdentityRecord, NewIdentity, ServiceRecord};
pub use postgres::PgStore;
pub use store::BookingStore;

/// Open the store selected by `settings.backend`.
///
/// The PostgreSQL backend retries the initial connection; migrations are
/// applied separately through [`BookingStore::migrate`].
pub async fn open(settings: &DatabaseSettings) -> anyhow::Result<Arc<dyn BookingStore>> {
    match settings.backend {
        StoreBackend::Postgres => {
            let store = PgStore::connect(settings)
                .await
                .context("failed to open PostgreSQL store")?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            tracing::warn!(
                target: "slotbook-db",
                "using in-memory store; bookings are lost on restart"
            );
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

//! Wiring: store, collaborators, module registry and the serve loop.

use std::sync::Arc;

use anyhow::Context;
use slotbook_authz::{IdentityResolver, PasswordHasher};
use slotbook_db::BookingStore;
use slotbook_events::NotificationDispatcher;
use slotbook_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::modules::{self, auth::AccountService};

/// Shared dependencies handed to every module at construction.
#[derive(Clone)]
pub struct AppContext {
    pub store: Arc<dyn BookingStore>,
    pub resolver: IdentityResolver,
    pub notifications: NotificationDispatcher,
    pub hasher: PasswordHasher,
}

impl AppContext {
    pub fn new(
        store: Arc<dyn BookingStore>,
        notifications: NotificationDispatcher,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            resolver: IdentityResolver::new(Arc::clone(&store)),
            store,
            notifications,
            hasher,
        }
    }

    /// Open the configured store and build the notification client.
    pub async fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let store = slotbook_db::open(&settings.database).await?;
        let notifications = NotificationDispatcher::from_settings(&settings.notifications)
            .context("invalid notification settings")?;
        Ok(Self::new(
            store,
            notifications,
            PasswordHasher::new(settings.auth.bcrypt_cost),
        ))
    }
}

pub fn build_registry(ctx: &AppContext) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, ctx)?;
    Ok(registry)
}

/// Apply every module migration not yet recorded by the store.
pub async fn migrate(ctx: &AppContext, registry: &ModuleRegistry) -> anyhow::Result<()> {
    let migrations = registry.collect_migrations();
    tracing::info!(count = migrations.len(), "applying module migrations");
    ctx.store
        .migrate(&migrations)
        .await
        .context("failed to apply migrations")
}

/// Ensure the configured administrator exists. Skipped unless both email and
/// password are set.
pub async fn ensure_admin(ctx: &AppContext, settings: &Settings) -> anyhow::Result<()> {
    let (Some(email), Some(password)) = (&settings.auth.admin_email, &settings.auth.admin_password)
    else {
        tracing::debug!("no administrator configured");
        return Ok(());
    };

    AccountService::new(ctx)
        .ensure_administrator(email, password)
        .await
        .context("failed to ensure administrator account")?;
    Ok(())
}

/// Open the store, migrate, bootstrap the administrator and serve until shutdown.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(
        env = ?settings.environment,
        backend = ?settings.database.backend,
        "slotbook bootstrap starting"
    );

    let ctx = AppContext::from_settings(&settings).await?;
    let registry = build_registry(&ctx)?;

    migrate(&ctx, &registry).await?;
    ensure_admin(&ctx, &settings).await?;

    let init_ctx = InitCtx {
        settings: &settings,
    };
    registry.init_modules(&init_ctx).await?;
    registry.start_modules(&init_ctx).await?;

    tracing::info!("slotbook bootstrap complete");
    let served = slotbook_http::start_server(&registry, &settings).await;

    registry.stop_modules().await?;
    served
}

pub mod auth;
pub mod bookings;
pub mod services;

use slotbook_kernel::ModuleRegistry;

use crate::bootstrap::AppContext;

/// Register all feature modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, ctx: &AppContext) -> anyhow::Result<()> {
    registry.register(auth::create_module(ctx))?;
    registry.register(bookings::create_module(ctx))?;
    registry.register(services::create_module(ctx))?;
    Ok(())
}

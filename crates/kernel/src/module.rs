use async_trait::async_trait;
use axum::Router;

use crate::settings::Settings;

/// Handed to every module hook.
pub struct InitCtx<'a> {
    pub settings: &'a Settings,
}

/// One SQL script owned by a module. The `(module, id)` pair is recorded once
/// applied, so scripts must never be edited after release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

/// A feature area of the service: its routes, API docs and schema.
///
/// Hooks run in registration order (`stop` in reverse), and so do migrations,
/// so a module may reference tables of modules registered before it.
#[async_trait]
pub trait Module: Sync + Send {
    /// Unique name; routes are mounted under `/api/{name}`.
    fn name(&self) -> &'static str;

    /// One-line description, rendered as the module's OpenAPI tag.
    fn summary(&self) -> &'static str {
        ""
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Paths relative to the mount point, with state already applied.
    fn routes(&self) -> Router {
        Router::new()
    }

    /// OpenAPI fragment with `paths` relative to the mount point and optional
    /// `components.schemas`.
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    /// Ordered by `id` within the module.
    fn migrations(&self) -> Vec<Migration> {
        vec![]
    }

    /// Runs after every module is initialized, right before serving.
    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

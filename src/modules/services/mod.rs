use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::State, routing::get, Json, Router};
use slotbook_db::{BookingStore, ServiceRecord};
use slotbook_http::AppError;
use slotbook_kernel::{InitCtx, Migration, Module};

use crate::bootstrap::AppContext;

/// Services module: read-only reference data under `/api/services`
pub struct ServicesModule {
    store: Arc<dyn BookingStore>,
}

impl ServicesModule {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for ServicesModule {
    fn name(&self) -> &'static str {
        "services"
    }

    fn summary(&self) -> &'static str {
        "Bookable services"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "services module initialized");
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(list_services))
            .with_state(Arc::clone(&self.store))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List bookable services",
                        "tags": ["services"],
                        "responses": {
                            "200": {
                                "description": "Every service",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Service" }
                                        }
                                    }
                                }
                            },
                            "500": {
                                "description": "Internal server error",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Service": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer" },
                            "name": { "type": "string" },
                            "duration": { "type": "integer", "description": "Minutes" }
                        },
                        "required": ["id", "name", "duration"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                CREATE TABLE IF NOT EXISTS services (
                    id        SERIAL PRIMARY KEY,
                    name      TEXT NOT NULL,
                    duration  INTEGER NOT NULL CHECK (duration > 0)
                );
                INSERT INTO services (id, name, duration)
                VALUES (1, 'Standard appointment', 60)
                ON CONFLICT (id) DO NOTHING;
                SELECT setval(pg_get_serial_sequence('services', 'id'), (SELECT MAX(id) FROM services));
                "#,
        }]
    }
}

async fn list_services(
    State(store): State<Arc<dyn BookingStore>>,
) -> Result<Json<Vec<ServiceRecord>>, AppError> {
    let services = store
        .list_services()
        .await
        .map_err(|err| AppError::Internal(anyhow::Error::new(err).context("failed to list services")))?;
    Ok(Json(services))
}

pub fn create_module(ctx: &AppContext) -> Arc<dyn Module> {
    Arc::new(ServicesModule::new(Arc::clone(&ctx.store)))
}

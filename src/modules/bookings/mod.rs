//! Booking admission, conflict detection and per-viewer visibility.

pub mod admission;
pub mod conflict;
pub mod error;
pub mod models;
pub mod routes;
pub mod visibility;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use slotbook_kernel::{InitCtx, Migration, Module};

use crate::bootstrap::AppContext;
pub use admission::AdmissionPipeline;
pub use error::BookingError;

/// Bookings module: `/api/bookings`
pub struct BookingsModule {
    pipeline: AdmissionPipeline,
}

impl BookingsModule {
    pub fn new(pipeline: AdmissionPipeline) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl Module for BookingsModule {
    fn name(&self) -> &'static str {
        "bookings"
    }

    fn summary(&self) -> &'static str {
        "Time-slot bookings"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            notifications = ctx.settings.notifications.enabled,
            "bookings module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.pipeline.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = |description: &str| {
            serde_json::json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };
        let id_param = serde_json::json!({
            "name": "id",
            "in": "path",
            "required": true,
            "schema": { "type": "integer", "format": "int64" }
        });
        let request_body = serde_json::json!({
            "required": true,
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/BookingRequest" }
                }
            }
        });
        let created = serde_json::json!({
            "description": "Booking created",
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/CreatedBooking" }
                }
            }
        });

        Some(serde_json::json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List bookings, redacted for the caller",
                        "tags": ["bookings"],
                        "security": [{}, { "ApiKey": [] }],
                        "responses": {
                            "200": {
                                "description": "Every booking",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Booking" }
                                        }
                                    }
                                }
                            },
                            "401": error("Unknown API key"),
                            "500": error("Internal server error")
                        }
                    },
                    "post": {
                        "summary": "Create a booking as the caller, or as a guest without a key",
                        "tags": ["bookings"],
                        "security": [{}, { "ApiKey": [] }],
                        "requestBody": request_body,
                        "responses": {
                            "201": created,
                            "400": error("Malformed or invalid booking"),
                            "401": error("Unknown API key"),
                            "409": error("Slot taken or email belongs to an account"),
                            "500": error("Internal server error")
                        }
                    }
                },
                "/guest": {
                    "post": {
                        "summary": "Create a booking as a guest",
                        "tags": ["bookings"],
                        "requestBody": request_body,
                        "responses": {
                            "201": created,
                            "400": error("Malformed or invalid booking"),
                            "409": error("Slot taken or email belongs to an account"),
                            "500": error("Internal server error")
                        }
                    }
                },
                "/{id}": {
                    "put": {
                        "summary": "Replace a booking (administrators)",
                        "tags": ["bookings"],
                        "security": [{ "ApiKey": [] }],
                        "parameters": [id_param],
                        "requestBody": request_body,
                        "responses": {
                            "200": { "description": "Booking updated" },
                            "400": error("Malformed or invalid booking"),
                            "401": error("Not an administrator"),
                            "500": error("Internal server error")
                        }
                    },
                    "delete": {
                        "summary": "Delete a booking (administrators)",
                        "tags": ["bookings"],
                        "security": [{ "ApiKey": [] }],
                        "parameters": [id_param],
                        "responses": {
                            "200": { "description": "Booking deleted or already gone" },
                            "401": error("Not an administrator"),
                            "500": error("Internal server error")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "BookingRequest": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "surname": { "type": "string" },
                            "email": { "type": "string" },
                            "phone": { "type": "string" },
                            "service": {
                                "type": "integer",
                                "description": "Service id; 0 or absent selects the standard service"
                            },
                            "start_time": { "type": "string", "example": "2025-05-01T09:00:00" },
                            "end_time": { "type": "string", "example": "2025-05-01T10:00:00" }
                        },
                        "required": ["name", "surname", "email", "start_time", "end_time"]
                    },
                    "Booking": {
                        "type": "object",
                        "description": "Redacted to Taken/Hidden unless the caller owns the booking or is an administrator",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "user_id": { "type": "integer", "format": "int64" },
                            "name": { "type": "string" },
                            "surname": { "type": "string" },
                            "email": { "type": "string" },
                            "phone": { "type": "string" },
                            "service": { "type": "integer" },
                            "start_time": { "type": "string" },
                            "end_time": { "type": "string" }
                        },
                        "required": [
                            "id", "user_id", "name", "surname", "email",
                            "phone", "service", "start_time", "end_time"
                        ]
                    },
                    "CreatedBooking": {
                        "type": "object",
                        "properties": { "id": { "type": "integer", "format": "int64" } },
                        "required": ["id"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                CREATE TABLE IF NOT EXISTS bookings (
                    id          BIGSERIAL PRIMARY KEY,
                    user_id     BIGINT REFERENCES users (id) ON DELETE SET NULL,
                    name        TEXT NOT NULL,
                    surname     TEXT NOT NULL DEFAULT '',
                    email       TEXT NOT NULL,
                    phone       TEXT,
                    service     INTEGER NOT NULL DEFAULT 1,
                    start_time  TIMESTAMP NOT NULL,
                    end_time    TIMESTAMP NOT NULL,
                    CONSTRAINT bookings_interval CHECK (start_time < end_time)
                );
                CREATE INDEX IF NOT EXISTS bookings_start_day ON bookings ((start_time::date));
                "#,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "bookings module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "bookings module stopped");
        Ok(())
    }
}

pub fn create_module(ctx: &AppContext) -> Arc<dyn Module> {
    Arc::new(BookingsModule::new(AdmissionPipeline::new(ctx)))
}

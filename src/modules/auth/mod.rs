//! Accounts: registration, login, administrator check and profile.

pub mod models;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use slotbook_http::{AppError, Credential, JsonBody};
use slotbook_kernel::{InitCtx, Migration, Module};

use crate::bootstrap::AppContext;
use models::{LoginRequest, LoginResponse, Profile, RegisterRequest, Registered};
pub use service::{AccountError, AccountService};

/// Auth module: `/api/auth`
pub struct AuthModule {
    accounts: AccountService,
}

impl AuthModule {
    pub fn new(accounts: AccountService) -> Self {
        Self { accounts }
    }
}

#[async_trait]
impl Module for AuthModule {
    fn name(&self) -> &'static str {
        "auth"
    }

    fn summary(&self) -> &'static str {
        "Account registration, login and API keys"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            bcrypt_cost = ctx.settings.auth.bcrypt_cost,
            "auth module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/register", post(register))
            .route("/login", post(login))
            .route("/check", get(check))
            .route("/me", get(me))
            .with_state(self.accounts.clone())
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
        let json_of = |schema: &str| {
            serde_json::json!({
                "application/json": {
                    "schema": { "$ref": format!("#/components/schemas/{schema}") }
                }
            })
        };

        Some(serde_json::json!({
            "paths": {
                "/register": {
                    "post": {
                        "summary": "Register an account",
                        "tags": ["auth"],
                        "requestBody": { "required": true, "content": json_of("RegisterRequest") },
                        "responses": {
                            "201": { "description": "Account created" },
                            "400": error("Invalid registration"),
                            "409": error("Email already registered"),
                            "500": error("Internal server error")
                        }
                    }
                },
                "/login": {
                    "post": {
                        "summary": "Exchange email and password for an API key",
                        "tags": ["auth"],
                        "requestBody": { "required": true, "content": json_of("LoginRequest") },
                        "responses": {
                            "200": { "description": "API key", "content": json_of("LoginResponse") },
                            "401": error("Unknown email or wrong password"),
                            "500": error("Internal server error")
                        }
                    }
                },
                "/check": {
                    "get": {
                        "summary": "Succeeds only for administrator API keys",
                        "tags": ["auth"],
                        "security": [{ "ApiKey": [] }],
                        "responses": {
                            "200": { "description": "Caller is an administrator" },
                            "401": error("Not an administrator")
                        }
                    }
                },
                "/me": {
                    "get": {
                        "summary": "The caller's account",
                        "tags": ["auth"],
                        "security": [{ "ApiKey": [] }],
                        "responses": {
                            "200": { "description": "Profile", "content": json_of("Profile") },
                            "401": error("Missing or unknown API key")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "RegisterRequest": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "surname": { "type": "string" },
                            "email": { "type": "string" },
                            "password": { "type": "string" }
                        },
                        "required": ["name", "email", "password"]
                    },
                    "LoginRequest": {
                        "type": "object",
                        "properties": {
                            "email": { "type": "string" },
                            "password": { "type": "string" }
                        },
                        "required": ["email", "password"]
                    },
                    "LoginResponse": {
                        "type": "object",
                        "properties": { "api_key": { "type": "string" } },
                        "required": ["api_key"]
                    },
                    "Profile": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "surname": { "type": "string" },
                            "email": { "type": "string" },
                            "is_admin": { "type": "boolean" }
                        },
                        "required": ["name", "surname", "email", "is_admin"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                CREATE TABLE IF NOT EXISTS users (
                    id        BIGSERIAL PRIMARY KEY,
                    name      TEXT NOT NULL,
                    surname   TEXT NOT NULL DEFAULT '',
                    email     TEXT NOT NULL UNIQUE,
                    password  TEXT NOT NULL,
                    api_key   TEXT NOT NULL UNIQUE,
                    is_admin  BOOLEAN NOT NULL DEFAULT FALSE
                );
                "#,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "auth module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "auth module stopped");
        Ok(())
    }
}

async fn register(
    State(accounts): State<AccountService>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<Registered>), AppError> {
    let id = accounts.register(request).await?;
    Ok((StatusCode::CREATED, Json(Registered { id })))
}

async fn login(
    State(accounts): State<AccountService>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let api_key = accounts.login(&request.email, &request.password).await?;
    Ok(Json(LoginResponse { api_key }))
}

async fn check(
    State(accounts): State<AccountService>,
    credential: Credential,
) -> Result<StatusCode, AppError> {
    accounts.check_administrator(credential.as_deref()).await?;
    Ok(StatusCode::OK)
}

async fn me(
    State(accounts): State<AccountService>,
    credential: Credential,
) -> Result<Json<Profile>, AppError> {
    Ok(Json(accounts.profile(credential.as_deref()).await?))
}

pub fn create_module(ctx: &AppContext) -> Arc<dyn Module> {
    Arc::new(AuthModule::new(AccountService::new(ctx)))
}

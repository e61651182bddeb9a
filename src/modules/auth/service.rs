use std::sync::Arc;

use slotbook_authz::{
    generate_api_key, require_administrator, AuthError, IdentityResolver, PasswordHasher,
};
use slotbook_db::{BookingStore, NewIdentity, StoreError};
use slotbook_http::AppError;
use thiserror::Error;

use super::models::{Profile, RegisterRequest};
use crate::bootstrap::AppContext;
use crate::utils::{field_details, FieldError};

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("invalid registration fields")]
    InvalidFields(Vec<FieldError>),

    #[error("an account with email '{email}' already exists")]
    EmailTaken { email: String },

    /// Unknown email and wrong password look the same to the caller.
    #[error("invalid email or password")]
    InvalidLogin,

    #[error("API key required")]
    Anonymous,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("password hashing task failed: {0}")]
    Blocking(#[from] tokio::task::JoinError),
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::InvalidFields(errors) => {
                AppError::bad_request_with(field_details(&errors), "invalid registration fields")
            }
            err @ AccountError::EmailTaken { .. } => AppError::conflict(
                vec![serde_json::json!({ "reason": "email_taken" })],
                err.to_string(),
            ),
            err @ (AccountError::InvalidLogin | AccountError::Anonymous) => {
                AppError::unauthorized(err.to_string())
            }
            AccountError::Auth(AuthError::InvalidCredential) => {
                AppError::unauthorized("invalid API key")
            }
            AccountError::Auth(AuthError::NotAdministrator) => {
                AppError::unauthorized("administrator privileges required")
            }
            other => AppError::Internal(anyhow::Error::new(other)),
        }
    }
}

/// Registration, login and self-inspection for accounts.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn BookingStore>,
    resolver: IdentityResolver,
    hasher: PasswordHasher,
}

impl AccountService {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            store: Arc::clone(&ctx.store),
            resolver: ctx.resolver.clone(),
            hasher: ctx.hasher,
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<i64, AccountError> {
        let request = request.validate().map_err(AccountError::InvalidFields)?;

        if self.store.email_exists(&request.email).await? {
            return Err(AccountError::EmailTaken {
                email: request.email,
            });
        }

        let id = self
            .create_identity(request.name, request.surname, request.email, request.password, false)
            .await?;
        tracing::info!(user_id = id, "account registered");
        Ok(id)
    }

    /// Verify the password and hand back the account's API key.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AccountError> {
        let Some(identity) = self.store.find_identity_by_email(email.trim()).await? else {
            tracing::debug!("login for unknown email");
            return Err(AccountError::InvalidLogin);
        };

        let hasher = self.hasher;
        let password = password.to_string();
        let hash = identity.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || hasher.verify(&password, &hash)).await??;

        if !verified {
            tracing::debug!(user_id = identity.id, "login with wrong password");
            return Err(AccountError::InvalidLogin);
        }
        Ok(identity.api_key)
    }

    /// Succeeds only for administrator credentials.
    pub async fn check_administrator(&self, credential: Option<&str>) -> Result<(), AccountError> {
        let identity = self.resolver.resolve(credential).await?;
        require_administrator(&identity)?;
        Ok(())
    }

    pub async fn profile(&self, credential: Option<&str>) -> Result<Profile, AccountError> {
        match self.resolver.resolve(credential).await?.principal() {
            Some(principal) => Ok(principal.clone().into()),
            None => Err(AccountError::Anonymous),
        }
    }

    /// Create an administrator for `email` unless that email already has an
    /// account. Returns whether one was created.
    pub async fn ensure_administrator(
        &self,
        email: &str,
        password: &str,
    ) -> Result<bool, AccountError> {
        let email = email.trim();
        if self.store.email_exists(email).await? {
            tracing::info!("administrator account already present");
            return Ok(false);
        }

        let result = self
            .create_identity(
                "admin".to_string(),
                "admin".to_string(),
                email.to_string(),
                password.to_string(),
                true,
            )
            .await;
        match result {
            Ok(id) => {
                tracing::info!(user_id = id, "administrator account created");
                Ok(true)
            }
            // Another instance created it first.
            Err(AccountError::EmailTaken { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn create_identity(
        &self,
        name: String,
        surname: String,
        email: String,
        password: String,
        is_admin: bool,
    ) -> Result<i64, AccountError> {
        let hasher = self.hasher;
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password)).await??;

        let identity = NewIdentity {
            name,
            surname,
            email,
            password_hash,
            api_key: generate_api_key(),
            is_admin,
        };
        self.store
            .insert_identity(&identity)
            .await
            .map_err(|err| match err {
                StoreError::DuplicateEmail { email } => AccountError::EmailTaken { email },
                other => AccountError::Store(other),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestApp;

    fn registration(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Ada".to_string(),
            surname: "Lovelace".to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn register_then_login() {
        let app = TestApp::new();
        let accounts = AccountService::new(&app.ctx);

        accounts
            .register(registration("ada@example.com", "s3cret"))
            .await
            .unwrap();

        let key = accounts.login("ada@example.com", "s3cret").await.unwrap();
        assert_eq!(key.len(), 64);

        let profile = accounts.profile(Some(&key)).await.unwrap();
        assert_eq!(profile.email, "ada@example.com");
        assert!(!profile.is_admin);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_rejected() {
        let app = TestApp::new();
        let accounts = AccountService::new(&app.ctx);
        accounts
            .register(registration("ada@example.com", "s3cret"))
            .await
            .unwrap();

        assert!(matches!(
            accounts.login("ada@example.com", "wrong").await,
            Err(AccountError::InvalidLogin)
        ));
        assert!(matches!(
            accounts.login("ghost@example.com", "s3cret").await,
            Err(AccountError::InvalidLogin)
        ));
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let app = TestApp::new();
        let accounts = AccountService::new(&app.ctx);
        accounts
            .register(registration("ada@example.com", "s3cret"))
            .await
            .unwrap();

        let again = accounts.register(registration("ada@example.com", "other")).await;
        assert!(matches!(again, Err(AccountError::EmailTaken { .. })));
    }

    #[tokio::test]
    async fn ensure_administrator_is_idempotent() {
        let app = TestApp::new();
        let accounts = AccountService::new(&app.ctx);

        assert!(accounts.ensure_administrator("root@example.com", "pw").await.unwrap());
        assert!(!accounts.ensure_administrator("root@example.com", "pw").await.unwrap());

        let key = accounts.login("root@example.com", "pw").await.unwrap();
        accounts.check_administrator(Some(&key)).await.unwrap();
    }

    #[tokio::test]
    async fn check_rejects_regular_and_anonymous_callers() {
        let app = TestApp::new();
        let (_, key) = app.register("ada@example.com", false).await;
        let accounts = AccountService::new(&app.ctx);

        assert!(accounts.check_administrator(Some(&key)).await.is_err());
        assert!(accounts.check_administrator(None).await.is_err());
        assert!(matches!(
            accounts.profile(None).await,
            Err(AccountError::Anonymous)
        ));
    }
}

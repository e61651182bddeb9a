use std::sync::Arc;

use slotbook_db::{BookingStore, IdentityRecord};

use crate::error::AuthError;

/// The account behind a resolved credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: i64,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub is_admin: bool,
}

impl From<IdentityRecord> for Principal {
    fn from(record: IdentityRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            surname: record.surname,
            email: record.email,
            is_admin: record.is_admin,
        }
    }
}

/// Who is calling. Anonymous callers are guests, which is a valid outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    User(Principal),
}

impl Identity {
    pub fn is_administrator(&self) -> bool {
        matches!(self, Identity::User(principal) if principal.is_admin)
    }

    pub fn is_registered(&self) -> bool {
        matches!(self, Identity::User(_))
    }

    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Identity::User(principal) => Some(principal),
            Identity::Anonymous => None,
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.principal().map(|principal| principal.id)
    }
}

/// Maps opaque API keys to identities. Never mutates identity records.
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn BookingStore>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    /// Resolve a credential.
    ///
    /// A missing or blank token is [`Identity::Anonymous`]; a non-empty token
    /// without a matching identity is [`AuthError::InvalidCredential`].
    pub async fn resolve(&self, token: Option<&str>) -> Result<Identity, AuthError> {
        let token = match token.map(str::trim) {
            Some(token) if !token.is_empty() => token,
            _ => return Ok(Identity::Anonymous),
        };

        match self.store.find_identity_by_token(token).await? {
            Some(record) => {
                tracing::debug!(user_id = record.id, is_admin = record.is_admin, "credential resolved");
                Ok(Identity::User(record.into()))
            }
            None => {
                tracing::debug!("credential did not match any identity");
                Err(AuthError::InvalidCredential)
            }
        }
    }
}

/// Fails with [`AuthError::NotAdministrator`] unless `identity` is an administrator.
pub fn require_administrator(identity: &Identity) -> Result<(), AuthError> {
    if identity.is_administrator() {
        Ok(())
    } else {
        Err(AuthError::NotAdministrator)
    }
}

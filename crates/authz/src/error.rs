use slotbook_db::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// A non-empty credential matched no identity.
    #[error("invalid credential")]
    InvalidCredential,

    #[error("administrator privileges required")]
    NotAdministrator,

    #[error("password longer than {} bytes", crate::credentials::MAX_PASSWORD_BYTES)]
    PasswordTooLong,

    #[error("identity lookup failed: {0}")]
    Store(#[from] StoreError),

    #[error("password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),
}

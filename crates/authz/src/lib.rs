//! Identity resolution, administrator guard and credential helpers.

pub mod credentials;
pub mod error;
pub mod identity;

pub use credentials::{generate_api_key, PasswordHasher, MAX_PASSWORD_BYTES};
pub use error::AuthError;
pub use identity::{require_administrator, Identity, IdentityResolver, Principal};

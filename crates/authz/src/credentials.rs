use rand::RngCore;

use crate::error::AuthError;

/// Raw API key length; rendered as twice as many hex characters.
const API_KEY_BYTES: usize = 32;

/// bcrypt only reads this many bytes of a password.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// bcrypt password hashing with a configurable cost.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Refuses passwords longer than [`MAX_PASSWORD_BYTES`] instead of
    /// hashing a truncated prefix.
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(AuthError::PasswordTooLong);
        }
        Ok(bcrypt::hash(password, self.cost)?)
    }

    /// `false` for a wrong password; an error only when `hash` is malformed.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        Ok(bcrypt::verify(password, hash)?)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

/// Generate a long-lived opaque API key.
pub fn generate_api_key() -> String {
    let mut key = [0u8; API_KEY_BYTES];
    rand::thread_rng().fill_bytes(&mut key);
    hex::encode(key)
}

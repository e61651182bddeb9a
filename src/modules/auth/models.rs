use serde::{Deserialize, Serialize};
use slotbook_authz::{Principal, MAX_PASSWORD_BYTES};

use crate::utils::{validate_email, FieldError};

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    #[serde(default)]
    pub surname: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    /// Trim names and email; collect every field error.
    pub fn validate(self) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();

        let name = self.name.trim().to_string();
        if name.is_empty() {
            errors.push(FieldError::new("name", "required"));
        }
        let email = validate_email(&self.email, &mut errors);
        if self.password.is_empty() {
            errors.push(FieldError::new("password", "required"));
        } else if self.password.len() > MAX_PASSWORD_BYTES {
            errors.push(FieldError::new(
                "password",
                format!("must be at most {MAX_PASSWORD_BYTES} bytes"),
            ));
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(Self {
            name,
            surname: self.surname.trim().to_string(),
            email,
            password: self.password,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registered {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub api_key: String,
}

/// What `GET /api/auth/me` reports about the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub is_admin: bool,
}

impl From<Principal> for Profile {
    fn from(principal: Principal) -> Self {
        Self {
            name: principal.name,
            surname: principal.surname,
            email: principal.email,
            is_admin: principal.is_admin,
        }
    }
}

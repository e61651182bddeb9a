//! Request extractors shared by module routes

use std::convert::Infallible;

use axum::{
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts},
    Json,
};

use crate::error::AppError;

/// The opaque credential from the `Authorization` header, raw or `Bearer`-prefixed.
/// Absent or blank headers yield `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential(pub Option<String>);

impl Credential {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }

    fn from_header(value: &str) -> Self {
        let token = value.trim();
        let token = token
            .strip_prefix("Bearer ")
            .or_else(|| token.strip_prefix("bearer "))
            .unwrap_or(token)
            .trim();

        if token.is_empty() {
            Self(None)
        } else {
            Self(Some(token.to_string()))
        }
    }
}

impl<S> FromRequestParts<S> for Credential
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .headers
            .get(AUTHORIZATION)
            // Undecodable bytes still make a non-empty token, which resolves to
            // an invalid credential rather than to an anonymous caller.
            .map(|value| Credential::from_header(&String::from_utf8_lossy(value.as_bytes())))
            .unwrap_or(Credential(None)))
    }
}

/// JSON body extractor whose rejections render as `400 bad_request`.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::bad_request(rejection.body_text())),
        }
    }
}

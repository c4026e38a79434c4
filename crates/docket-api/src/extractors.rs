//! # Custom Extractors & Validation
//!
//! Provides the [`Validate`] trait for request DTOs, a helper to extract and
//! validate JSON bodies in handlers, and the owner header every case route
//! is scoped by.

use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use axum::Json;
use uuid::Uuid;

use docket_core::OwnerId;

use crate::error::AppError;

/// Header identifying the calling case owner.
pub const OWNER_HEADER: &str = "x-owner-id";

/// A business rule broken by one request field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Business rules checked after deserialization.
pub trait Validate {
    fn validate(&self) -> Result<(), FieldError>;
}

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a JSON body and validate it using the [`Validate`] trait.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value
        .validate()
        .map_err(|e| AppError::InvalidField {
            field: e.field,
            message: e.message,
        })?;
    Ok(value)
}

/// Read the owner from the `X-Owner-Id` header.
pub fn owner_from_headers(headers: &HeaderMap) -> Result<OwnerId, AppError> {
    let raw = headers
        .get(OWNER_HEADER)
        .ok_or_else(|| AppError::Unauthorized("missing X-Owner-Id header".to_string()))?
        .to_str()
        .map_err(|_| AppError::BadRequest("X-Owner-Id header is not valid text".to_string()))?;
    Uuid::parse_str(raw.trim())
        .map(OwnerId::from_uuid)
        .map_err(|_| AppError::BadRequest(format!("X-Owner-Id \"{raw}\" is not a UUID")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn owner_header_is_required() {
        let err = owner_from_headers(&HeaderMap::new()).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn owner_header_must_be_a_uuid() {
        let mut headers = HeaderMap::new();
        headers.insert(OWNER_HEADER, HeaderValue::from_static("alice"));
        assert!(matches!(
            owner_from_headers(&headers).unwrap_err(),
            AppError::BadRequest(_)
        ));

        let id = Uuid::new_v4();
        headers.insert(OWNER_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());
        assert_eq!(owner_from_headers(&headers).unwrap(), OwnerId::from_uuid(id));
    }
}

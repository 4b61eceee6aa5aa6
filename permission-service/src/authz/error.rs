use service_core::error::AppError;
use thiserror::Error;

use crate::services::ServiceError;

/// Why a permission check did not grant access.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// Policy denied, or a lookup failed along the way.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed identifier or requested level.
    #[error("Wrong request: {0}")]
    WrongRequest(String),
}

impl AuthzError {
    pub fn forbidden(reason: impl Into<String>) -> Self {
        AuthzError::Forbidden(reason.into())
    }

    pub fn not_found(reason: impl Into<String>) -> Self {
        AuthzError::NotFound(reason.into())
    }

    pub fn wrong_request(reason: impl Into<String>) -> Self {
        AuthzError::WrongRequest(reason.into())
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, AuthzError::Forbidden(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AuthzError::NotFound(_))
    }

    pub fn is_wrong_request(&self) -> bool {
        matches!(self, AuthzError::WrongRequest(_))
    }
}

impl From<ServiceError> for AuthzError {
    fn from(err: ServiceError) -> Self {
        tracing::warn!(error = %err, "Permission lookup failed");
        AuthzError::Forbidden("permission lookup failed".to_string())
    }
}

impl From<AuthzError> for AppError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Forbidden(msg) => AppError::Forbidden(anyhow::anyhow!(msg)),
            AuthzError::NotFound(msg) => AppError::NotFound(anyhow::anyhow!(msg)),
            AuthzError::WrongRequest(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn test_store_failure_is_indistinguishable_from_denial() {
        let err: AuthzError = ServiceError::Store(anyhow::anyhow!("connection reset")).into();
        assert!(err.is_forbidden());
        assert!(!err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AuthzError::forbidden("no"), StatusCode::FORBIDDEN),
            (AuthzError::not_found("gone"), StatusCode::NOT_FOUND),
            (AuthzError::wrong_request("bad"), StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status_code(), status);
        }
    }
}

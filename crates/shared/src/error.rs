//! Application-wide error types.
//!
//! Domain-specific errors (ledger postings, storage) live with their own
//! crates; this type covers the cross-cutting request-layer failures.

use thiserror::Error;

/// Result alias using [`AppError`].
pub type AppResult<T> = Result<T, AppError>;

/// Application-wide error type for the request layer.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication is missing or invalid.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The caller is authenticated but not allowed to do this.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The requested resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request payload failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The request violates a business rule.
    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    /// The request conflicts with existing state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// An unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::BusinessRule(_) => 422,
            Self::Conflict(_) => 409,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns a stable machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::BusinessRule(_) => "BUSINESS_RULE_VIOLATION",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::Unauthorized("msg".into()).status_code(), 401);
        assert_eq!(AppError::Forbidden("msg".into()).status_code(), 403);
        assert_eq!(AppError::NotFound("msg".into()).status_code(), 404);
        assert_eq!(AppError::Validation("msg".into()).status_code(), 400);
        assert_eq!(AppError::BusinessRule("msg".into()).status_code(), 422);
        assert_eq!(AppError::Conflict("msg".into()).status_code(), 409);
        assert_eq!(AppError::Database("msg".into()).status_code(), 500);
        assert_eq!(AppError::Internal("msg".into()).status_code(), 500);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::Unauthorized("msg".into()).error_code(),
            "UNAUTHORIZED"
        );
        assert_eq!(AppError::Forbidden("msg".into()).error_code(), "FORBIDDEN");
        assert_eq!(AppError::NotFound("msg".into()).error_code(), "NOT_FOUND");
        assert_eq!(
            AppError::Validation("msg".into()).error_code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            AppError::BusinessRule("msg".into()).error_code(),
            "BUSINESS_RULE_VIOLATION"
        );
        assert_eq!(AppError::Conflict("msg".into()).error_code(), "CONFLICT");
        assert_eq!(
            AppError::Database("msg".into()).error_code(),
            "DATABASE_ERROR"
        );
        assert_eq!(
            AppError::Internal("msg".into()).error_code(),
            "INTERNAL_ERROR"
        );
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            AppError::Unauthorized("msg".into()).to_string(),
            "Unauthorized: msg"
        );
        assert_eq!(
            AppError::Validation("msg".into()).to_string(),
            "Validation error: msg"
        );
        assert_eq!(
            AppError::Conflict("msg".into()).to_string(),
            "Conflict: msg"
        );
        assert_eq!(
            AppError::Internal("msg".into()).to_string(),
            "Internal error: msg"
        );
    }
}

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use thiserror::Error;

use crate::lifecycle::GuardrailViolation;

/// Error code constants for type-safe error handling
pub mod code {
    pub const EXISTS: &str = "EXISTS";
    pub const NOTFOUND: &str = "NOTFOUND";
    pub const INVALID: &str = "INVALID";
    pub const GUARDRAIL: &str = "GUARDRAIL";
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const FORBIDDEN: &str = "FORBIDDEN";
    pub const DEPENDENCY: &str = "DEPENDENCY";
    pub const INTERNAL: &str = "INTERNAL";
}

#[derive(Error, Debug)]
pub enum CrmError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Guardrail(#[from] GuardrailViolation),

    #[error("{0}")]
    Exists(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CrmError {
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{entity} {id} not found"))
    }

    /// Returns the protocol error code for this error
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => code::NOTFOUND,
            Self::Validation(_) | Self::SerializationError(_) | Self::ConfigError(_) => {
                code::INVALID
            }
            Self::Guardrail(_) => code::GUARDRAIL,
            Self::Exists(_) => code::EXISTS,
            Self::Unauthorized(_) => code::UNAUTHORIZED,
            Self::Forbidden(_) => code::FORBIDDEN,
            Self::IoError(_) => code::DEPENDENCY,
            Self::DatabaseError(_) | Self::SqlxError(_) | Self::Internal(_) => code::INTERNAL,
        }
    }

    /// Returns the process exit code for this error
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigError(_) => 2,
            Self::DatabaseError(_) | Self::SqlxError(_) => 3,
            Self::NotFound(_) => 4,
            Self::Validation(_) | Self::Guardrail(_) | Self::Exists(_) => 5,
            Self::Unauthorized(_) | Self::Forbidden(_) => 6,
            Self::IoError(_) => 7,
            Self::SerializationError(_) => 8,
            Self::Internal(_) => 9,
        }
    }

    /// Whether the message is safe to show to an API caller verbatim.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Self::DatabaseError(_) | Self::SqlxError(_) | Self::IoError(_) | Self::Internal(_)
        )
    }
}

/// Protocol error codes as documented in the API
pub const ERROR_CODES: &[(&str, &str, &str)] = &[
    (
        code::EXISTS,
        "Resource already exists",
        "Use a different identifier or sign in with the existing account",
    ),
    (
        code::NOTFOUND,
        "Resource was not found",
        "List resources and verify identifier",
    ),
    (
        code::INVALID,
        "Invalid request payload",
        "Validate JSON syntax and ensure all required fields are present",
    ),
    (
        code::GUARDRAIL,
        "Kanban stage transition blocked",
        "Approve the sit, reconcile and devsite documents before moving to Ready for Deploy",
    ),
    (
        code::UNAUTHORIZED,
        "Missing or invalid session",
        "Sign in again",
    ),
    (
        code::FORBIDDEN,
        "Account not allowed to sign in",
        "Ask an administrator to approve the account",
    ),
    (
        code::DEPENDENCY,
        "Missing system dependency",
        "Check the database and filesystem are reachable",
    ),
    (
        code::INTERNAL,
        "Unexpected internal failure",
        "Inspect logs and retry",
    ),
];

/// Get error code details (description and fix) for a given error code
#[must_use]
pub fn get_error_info(error_code: &str) -> Option<(&'static str, &'static str)> {
    ERROR_CODES
        .iter()
        .find(|(code, _, _)| *code == error_code)
        .map(|(_, desc, fix)| (*desc, *fix))
}

pub type Result<T> = std::result::Result<T, CrmError>;

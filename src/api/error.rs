use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use crate::error::{code, CrmError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Http {
        status: StatusCode,
        code: &'static str,
        message: String,
    },
    #[error(transparent)]
    Crm(#[from] CrmError),
}

impl ApiError {
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self::Http {
            status: StatusCode::BAD_REQUEST,
            code: code::INVALID,
            message: message.into(),
        }
    }

    pub(crate) fn unauthorized(message: impl Into<String>) -> Self {
        Self::Http {
            status: StatusCode::UNAUTHORIZED,
            code: code::UNAUTHORIZED,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Http { status, .. } => *status,
            Self::Crm(err) => status_for(err),
        }
    }
}

fn status_for(err: &CrmError) -> StatusCode {
    match err {
        CrmError::NotFound(_) => StatusCode::NOT_FOUND,
        CrmError::Validation(_) | CrmError::Guardrail(_) => StatusCode::BAD_REQUEST,
        CrmError::Exists(_) => StatusCode::CONFLICT,
        CrmError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        CrmError::Forbidden(_) => StatusCode::FORBIDDEN,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Path ids that do not parse name no record, so they are reported the same
/// way as an unknown id.
pub(crate) fn parse_id(entity: &str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| CrmError::not_found(entity, raw).into())
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match self {
            Self::Http { code, message, .. } => (code, message),
            Self::Crm(err) if status.is_server_error() || !err.is_client_error() => {
                error!("Request failed: {err}");
                (err.code(), "Internal server error".to_string())
            }
            Self::Crm(err) => (err.code(), err.to_string()),
        };
        (
            status,
            Json(serde_json::json!({ "error": message, "code": code })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{DocApprovalKind, GuardrailViolation};

    #[test]
    fn given_crm_errors_when_mapping_then_statuses_follow_error_kind() {
        let cases = [
            (CrmError::not_found("Partner", "x"), StatusCode::NOT_FOUND),
            (CrmError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (
                CrmError::Guardrail(GuardrailViolation::new(vec![DocApprovalKind::Sit])),
                StatusCode::BAD_REQUEST,
            ),
            (CrmError::Exists("dup".into()), StatusCode::CONFLICT),
            (CrmError::Unauthorized("no".into()), StatusCode::UNAUTHORIZED),
            (CrmError::Forbidden("wait".into()), StatusCode::FORBIDDEN),
            (
                CrmError::DatabaseError("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn given_unparseable_id_when_parsing_then_not_found() {
        let err = parse_id("Partner", "not-a-uuid").err();
        assert_eq!(err.map(|e| e.status()), Some(StatusCode::NOT_FOUND));
        assert!(parse_id("Partner", &Uuid::new_v4().to_string()).is_ok());
    }
}

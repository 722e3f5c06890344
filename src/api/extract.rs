use axum::async_trait;
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;

use super::ApiError;

/// `Json<T>` whose rejections are reported as 400 with the crate error body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| Self(value))
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
    }
}

/// Parses an optional numeric query parameter.
pub(crate) fn parse_u32(name: &str, raw: Option<&str>) -> Result<Option<u32>, ApiError> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(value) => value
            .parse::<u32>()
            .map(Some)
            .map_err(|_| ApiError::bad_request(format!("{name} must be a positive integer"))),
    }
}

/// `All` and the empty string both mean "no filter".
pub(crate) fn optional_filter(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case("all"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_query_numbers_when_parsing_then_blank_is_absent_and_garbage_is_rejected() {
        assert!(matches!(parse_u32("page", None), Ok(None)));
        assert!(matches!(parse_u32("page", Some(" ")), Ok(None)));
        assert!(matches!(parse_u32("page", Some("3")), Ok(Some(3))));
        assert!(parse_u32("page", Some("-1")).is_err());
        assert!(parse_u32("limit", Some("ten")).is_err());
    }

    #[test]
    fn given_all_or_blank_filter_when_normalising_then_no_filter_applies() {
        assert_eq!(optional_filter(Some("All")), None);
        assert_eq!(optional_filter(Some("")), None);
        assert_eq!(optional_filter(Some("LIVE")), Some("LIVE"));
    }
}

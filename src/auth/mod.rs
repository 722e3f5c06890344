#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

//! Accounts and cookie sessions.

mod password;
mod session;

use chrono::Duration;
use serde::Deserialize;

use crate::error::Result;
use crate::validation::{require_email, require_min_chars, Validate};

pub use password::{check_credentials, hash_password, verify_password};
pub use session::{SessionClaims, SessionSigner};

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Validate for RegisterRequest {
    fn validated(mut self) -> Result<Self> {
        self.name = self.name.trim().to_string();
        self.email = normalise_email(&self.email);
        require_min_chars("Name", &self.name, 2)?;
        require_email("email", &self.email)?;
        require_min_chars("Password", &self.password, 6)?;
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validated(mut self) -> Result<Self> {
        self.email = normalise_email(&self.email);
        require_email("email", &self.email)?;
        Ok(self)
    }
}

/// Accounts are keyed by lower-cased, trimmed email.
#[must_use]
pub fn normalise_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[must_use]
pub fn session_cookie(token: &str, ttl: Duration) -> String {
    format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        ttl.num_seconds()
    )
}

#[must_use]
pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Pulls the session token out of a `Cookie` header value.
#[must_use]
pub fn session_token_from_cookies(header: &str) -> Option<&str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_cookie_header_when_extracting_session_then_only_session_value_returns() {
        assert_eq!(
            session_token_from_cookies("theme=dark; session=abc.def.ghi; other=1"),
            Some("abc.def.ghi")
        );
        assert_eq!(session_token_from_cookies("theme=dark"), None);
        assert_eq!(session_token_from_cookies("session="), None);
        assert_eq!(session_token_from_cookies("sessionid=zzz"), None);
    }

    #[test]
    fn given_token_when_building_cookie_then_it_is_http_only_with_max_age() {
        let cookie = session_cookie("tok", Duration::hours(2));
        assert!(cookie.starts_with("session=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=7200"));
        assert!(expired_session_cookie().contains("Max-Age=0"));
    }

    #[test]
    fn given_short_name_or_password_when_registering_then_validation_fails() {
        let short_name = RegisterRequest {
            name: "A".to_string(),
            email: "a@acme.io".to_string(),
            password: "secret1".to_string(),
        };
        assert!(short_name.validated().is_err());

        let short_password = RegisterRequest {
            name: "Ada".to_string(),
            email: "a@acme.io".to_string(),
            password: "12345".to_string(),
        };
        assert!(short_password.validated().is_err());
    }

    #[test]
    fn given_mixed_case_email_when_registering_then_it_is_normalised() {
        let request = RegisterRequest {
            name: "Ada".to_string(),
            email: "  Ada@Acme.IO ".to_string(),
            password: "secret1".to_string(),
        }
        .validated();
        assert_eq!(request.ok().map(|r| r.email), Some("ada@acme.io".to_string()));
    }
}

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CrmError, Result};
use crate::types::{UserAccount, UserRole};

const TOKEN_VERSION: &str = "v1";
const KEY_CONTEXT: &str = "partner-desk 2024 session token v1";
const MAX_TOKEN_LEN: usize = 2048;

/// Signed session payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub name: String,
    /// Expiry as a unix timestamp in seconds.
    pub exp: i64,
}

impl SessionClaims {
    #[must_use]
    pub fn for_user(user: &UserAccount, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
            name: user.name.clone(),
            exp: expires_at.timestamp(),
        }
    }
}

/// Issues and checks `v1.<payload>.<mac>` tokens.
#[derive(Clone)]
pub struct SessionSigner {
    key: [u8; 32],
    ttl: Duration,
}

impl std::fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSigner")
            .field("key", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl SessionSigner {
    #[must_use]
    pub fn new(secret: &str, ttl_hours: u32) -> Self {
        Self {
            key: blake3::derive_key(KEY_CONTEXT, secret.as_bytes()),
            ttl: Duration::hours(i64::from(ttl_hours.max(1))),
        }
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    fn mac(&self, payload_part: &str) -> blake3::Hash {
        blake3::keyed_hash(&self.key, payload_part.as_bytes())
    }

    /// # Errors
    /// Returns an error if the claims cannot be serialized.
    pub fn issue(&self, user: &UserAccount, now: DateTime<Utc>) -> Result<String> {
        let claims = SessionClaims::for_user(user, now + self.ttl);
        let payload_part = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let mac_part = URL_SAFE_NO_PAD.encode(self.mac(&payload_part).as_bytes());
        Ok(format!("{TOKEN_VERSION}.{payload_part}.{mac_part}"))
    }

    /// # Errors
    /// `CrmError::Unauthorized` for a malformed, forged or expired token.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims> {
        let invalid = || CrmError::Unauthorized("Invalid session".to_string());

        if token.len() > MAX_TOKEN_LEN {
            return Err(invalid());
        }
        let mut parts = token.split('.');
        let (Some(TOKEN_VERSION), Some(payload_part), Some(mac_part), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let mac_bytes: [u8; 32] = URL_SAFE_NO_PAD
            .decode(mac_part)
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(invalid)?;
        // blake3::Hash equality is constant time.
        if self.mac(payload_part) != blake3::Hash::from(mac_bytes) {
            return Err(invalid());
        }

        let claims: SessionClaims = URL_SAFE_NO_PAD
            .decode(payload_part)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or_else(invalid)?;

        if claims.exp <= now.timestamp() {
            return Err(CrmError::Unauthorized("Session expired".to_string()));
        }
        Ok(claims)
    }
}

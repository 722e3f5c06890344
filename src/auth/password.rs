use std::sync::OnceLock;

use crate::error::{CrmError, Result};

pub const DEFAULT_COST: u32 = 10;

/// Hashes a password with bcrypt at [`DEFAULT_COST`].
///
/// # Errors
/// Returns `CrmError::Internal` if bcrypt rejects the input.
pub fn hash_password(password: &str) -> Result<String> {
    hash_password_with_cost(password, DEFAULT_COST)
}

fn hash_password_with_cost(password: &str, cost: u32) -> Result<String> {
    bcrypt::hash(password, cost)
        .map_err(|e| CrmError::Internal(format!("Failed to hash password: {e}")))
}

/// # Errors
/// Returns `CrmError::Internal` when the stored hash is not a bcrypt hash.
pub fn verify_password(password: &str, stored: &str) -> Result<bool> {
    bcrypt::verify(password, stored)
        .map_err(|e| CrmError::Internal(format!("Stored password hash is malformed: {e}")))
}

/// Hash checked for unknown accounts, built at the same cost as real ones.
fn absent_account_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| {
        hash_password(&uuid::Uuid::new_v4().simple().to_string()).unwrap_or_default()
    })
}

/// Runs exactly one verification whether or not the account exists, so a
/// login for an unknown email costs the same as a wrong password.
///
/// # Errors
/// Propagates a verifier error for a known account.
pub fn check_credentials<F>(stored_hash: Option<&str>, password: &str, verify: F) -> Result<bool>
where
    F: FnOnce(&str, &str) -> Result<bool>,
{
    match stored_hash {
        Some(hash) => verify(password, hash),
        None => {
            let _ = verify(password, absent_account_hash());
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn given_hashed_password_when_verifying_then_only_the_original_matches() {
        let stored = hash_password_with_cost("hunter22", 4);
        assert!(stored.is_ok());
        let stored = stored.unwrap_or_default();
        assert!(matches!(verify_password("hunter22", &stored), Ok(true)));
        assert!(matches!(verify_password("hunter23", &stored), Ok(false)));
    }

    #[test]
    fn given_same_password_twice_when_hashing_then_salts_differ() {
        let first = hash_password_with_cost("correct horse", 4).unwrap_or_default();
        let second = hash_password_with_cost("correct horse", 4).unwrap_or_default();
        assert!(first.starts_with("$2b$04$"));
        assert_ne!(first, second);
    }

    #[test]
    fn given_garbage_hash_when_verifying_then_error_is_returned() {
        assert!(verify_password("x", "sha256i$0$salt$dead").is_err());
        assert!(verify_password("x", "").is_err());
    }

    #[test]
    fn given_known_and_unknown_accounts_when_checking_credentials_then_both_run_the_verifier() {
        let calls = Cell::new(0);
        let counting = |password: &str, hash: &str| {
            calls.set(calls.get() + 1);
            Ok(password == "right" && hash == "stored")
        };

        assert!(matches!(check_credentials(None, "right", counting), Ok(false)));
        assert!(matches!(check_credentials(Some("stored"), "wrong", counting), Ok(false)));
        assert!(matches!(check_credentials(Some("stored"), "right", counting), Ok(true)));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn given_unknown_account_when_checking_then_placeholder_hash_uses_full_cost() {
        let hash = absent_account_hash();
        assert!(hash.starts_with(&format!("$2b${DEFAULT_COST}$")));
        assert!(matches!(
            check_credentials(None, "anything", verify_password),
            Ok(false)
        ));
    }
}

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use chrono::Utc;
use sqlx::Acquire;
use tracing::info;
use uuid::Uuid;

use super::mappers::parse_user;
use super::types::UserRow;
use crate::db::CrmDb;
use crate::error::{CrmError, Result};
use crate::types::{NewUser, UserAccount, UserRole};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, is_approved, created_at";

/// Serialises first-account detection across concurrent registrations.
const USERS_LOCK_KEY: i64 = 0x7061_7274_6e65_72;

impl CrmDb {
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn fetch_user_by_email(&self, email: &str) -> Result<Option<UserAccount>> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| CrmError::DatabaseError(format!("Failed to load user: {e}")))?
        .map(parse_user)
        .transpose()
    }

    /// # Errors
    /// `CrmError::Exists` when the email is already registered.
    pub async fn insert_user(&self, user: NewUser) -> Result<UserAccount> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| CrmError::DatabaseError(format!("Failed to begin tx: {e}")))?;
        let conn = tx
            .acquire()
            .await
            .map_err(|e| CrmError::DatabaseError(format!("Failed to acquire tx conn: {e}")))?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(USERS_LOCK_KEY)
            .execute(&mut *conn)
            .await
            .map_err(|e| CrmError::DatabaseError(format!("Failed to lock users: {e}")))?;

        let (taken, is_first) = sqlx::query_as::<_, (bool, bool)>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1),
                    NOT EXISTS(SELECT 1 FROM users)",
        )
        .bind(&user.email)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| CrmError::DatabaseError(format!("Failed to inspect users: {e}")))?;

        if taken {
            return Err(CrmError::Exists("Email already exists".to_string()));
        }

        let role = if is_first { UserRole::Admin } else { UserRole::User };
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (id, name, email, password_hash, role, is_approved, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(role.as_str())
        .bind(is_first)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| CrmError::DatabaseError(format!("Failed to create user: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| CrmError::DatabaseError(format!("Failed to commit tx: {e}")))?;

        if is_first {
            info!("First account registered as approved admin");
        }
        parse_user(row)
    }
}

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::mappers::parse_reminder;
use super::types::{ReminderRow, REMINDER_COLUMNS};
use crate::db::CrmDb;
use crate::error::{CrmError, Result};
use crate::types::{NewReminder, Reminder};

impl CrmDb {
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn fetch_reminders(&self, active_at: Option<DateTime<Utc>>) -> Result<Vec<Reminder>> {
        sqlx::query_as::<_, ReminderRow>(&format!(
            "SELECT {REMINDER_COLUMNS} FROM reminders
             WHERE $1::timestamptz IS NULL
                OR (NOT is_completed AND scheduled_at <= $1)
             ORDER BY scheduled_at ASC, id"
        ))
        .bind(active_at)
        .fetch_all(self.pool())
        .await
        .map_err(|e| CrmError::DatabaseError(format!("Failed to list reminders: {e}")))?
        .into_iter()
        .map(parse_reminder)
        .collect()
    }

    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn insert_reminder(&self, reminder: NewReminder) -> Result<Reminder> {
        let row = sqlx::query_as::<_, ReminderRow>(&format!(
            "INSERT INTO reminders (id, title, scheduled_at, level, is_completed, created_at, updated_at)
             VALUES ($1, $2, $3, $4, FALSE, $5, $5)
             RETURNING {REMINDER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&reminder.title)
        .bind(reminder.scheduled_at)
        .bind(reminder.level.as_str())
        .bind(Utc::now())
        .fetch_one(self.pool())
        .await
        .map_err(|e| CrmError::DatabaseError(format!("Failed to create reminder: {e}")))?;
        parse_reminder(row)
    }

    /// # Errors
    /// `CrmError::NotFound` for an unknown id.
    pub async fn mark_reminder(&self, id: Uuid, completed: bool) -> Result<Reminder> {
        sqlx::query_as::<_, ReminderRow>(&format!(
            "UPDATE reminders SET is_completed = $2, updated_at = $3
             WHERE id = $1
             RETURNING {REMINDER_COLUMNS}"
        ))
        .bind(id)
        .bind(completed)
        .bind(Utc::now())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| CrmError::DatabaseError(format!("Failed to update reminder {id}: {e}")))?
        .map_or_else(|| Err(CrmError::not_found("Reminder", id)), parse_reminder)
    }

    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn delete_reminder_row(&self, id: Uuid) -> Result<bool> {
        sqlx::query("DELETE FROM reminders WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map(|result| result.rows_affected() > 0)
            .map_err(|e| CrmError::DatabaseError(format!("Failed to delete reminder {id}: {e}")))
    }
}

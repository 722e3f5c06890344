use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use super::error::parse_id;
use super::{ApiError, ApiJson, AppState, Deleted};
use crate::error::CrmError;
use crate::types::{NewReminder, Reminder, ReminderCompletion};
use crate::validation::Validate;

#[derive(Debug, Deserialize)]
pub(crate) struct ReminderListParams {
    active: Option<String>,
}

pub(crate) async fn list_reminders(
    State(state): State<AppState>,
    Query(params): Query<ReminderListParams>,
) -> Result<Json<Vec<Reminder>>, ApiError> {
    let active_at = (params.active.as_deref() == Some("true")).then(Utc::now);
    Ok(Json(state.store.list_reminders(active_at).await?))
}

pub(crate) async fn create_reminder(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewReminder>,
) -> Result<(StatusCode, Json<Reminder>), ApiError> {
    let reminder = state.store.create_reminder(body.validated()?).await?;
    Ok((StatusCode::CREATED, Json(reminder)))
}

pub(crate) async fn set_completion(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<ReminderCompletion>,
) -> Result<Json<Reminder>, ApiError> {
    let id = parse_id("Reminder", &id)?;
    Ok(Json(
        state
            .store
            .set_reminder_completed(id, body.is_completed)
            .await?,
    ))
}

pub(crate) async fn delete_reminder(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Deleted>, ApiError> {
    let id = parse_id("Reminder", &id)?;
    if state.store.delete_reminder(id).await? {
        Ok(Json(Deleted::OK))
    } else {
        Err(CrmError::not_found("Reminder", id).into())
    }
}

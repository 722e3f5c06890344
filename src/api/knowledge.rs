use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::error::parse_id;
use super::extract::parse_u32;
use super::{ApiError, ApiJson, AppState, Deleted};
use crate::error::CrmError;
use crate::types::{KnowledgeNote, NoteInput, NoteQuery, Page, PageRequest};
use crate::validation::Validate;

#[derive(Debug, Deserialize)]
pub(crate) struct NoteListParams {
    q: Option<String>,
    tag: Option<String>,
    page: Option<String>,
    limit: Option<String>,
}

pub(crate) async fn list_notes(
    State(state): State<AppState>,
    Query(params): Query<NoteListParams>,
) -> Result<Json<Page<KnowledgeNote>>, ApiError> {
    let query = NoteQuery {
        text: params.q,
        tag: params.tag.filter(|tag| !tag.trim().is_empty()),
        page: PageRequest::new(
            parse_u32("page", params.page.as_deref())?,
            parse_u32("limit", params.limit.as_deref())?,
        ),
    };
    Ok(Json(state.store.list_notes(query).await?))
}

pub(crate) async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<KnowledgeNote>, ApiError> {
    let id = parse_id("Note", &id)?;
    state
        .store
        .get_note(id)
        .await?
        .map(Json)
        .ok_or_else(|| CrmError::not_found("Note", id).into())
}

pub(crate) async fn create_note(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NoteInput>,
) -> Result<(StatusCode, Json<KnowledgeNote>), ApiError> {
    let note = state.store.create_note(body.validated()?).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

pub(crate) async fn replace_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<NoteInput>,
) -> Result<Json<KnowledgeNote>, ApiError> {
    let id = parse_id("Note", &id)?;
    Ok(Json(state.store.replace_note(id, body.validated()?).await?))
}

pub(crate) async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Deleted>, ApiError> {
    let id = parse_id("Note", &id)?;
    if state.store.delete_note(id).await? {
        Ok(Json(Deleted::OK))
    } else {
        Err(CrmError::not_found("Note", id).into())
    }
}

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::error::parse_id;
use super::extract::parse_u32;
use super::{ApiError, ApiJson, AppState, Deleted};
use crate::error::CrmError;
use crate::types::{NewPerson, Page, PageRequest, PeopleQuery, Person, PersonPatch};
use crate::validation::Validate;

#[derive(Debug, Deserialize)]
pub(crate) struct PeopleListParams {
    search: Option<String>,
    page: Option<String>,
    limit: Option<String>,
}

pub(crate) async fn list_people(
    State(state): State<AppState>,
    Query(params): Query<PeopleListParams>,
) -> Result<Json<Page<Person>>, ApiError> {
    let query = PeopleQuery {
        search: params.search,
        page: PageRequest::new(
            parse_u32("page", params.page.as_deref())?,
            parse_u32("limit", params.limit.as_deref())?,
        ),
    };
    Ok(Json(state.store.list_people(query).await?))
}

pub(crate) async fn get_person(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Person>, ApiError> {
    let id = parse_id("Person", &id)?;
    state
        .store
        .get_person(id)
        .await?
        .map(Json)
        .ok_or_else(|| CrmError::not_found("Person", id).into())
}

pub(crate) async fn create_person(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewPerson>,
) -> Result<(StatusCode, Json<Person>), ApiError> {
    let person = state.store.create_person(body.validated()?).await?;
    Ok((StatusCode::CREATED, Json(person)))
}

pub(crate) async fn update_person(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<PersonPatch>,
) -> Result<Json<Person>, ApiError> {
    let id = parse_id("Person", &id)?;
    Ok(Json(state.store.update_person(id, patch.validated()?).await?))
}

pub(crate) async fn delete_person(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Deleted>, ApiError> {
    let id = parse_id("Person", &id)?;
    if state.store.delete_person(id).await? {
        Ok(Json(Deleted::OK))
    } else {
        Err(CrmError::not_found("Person", id).into())
    }
}

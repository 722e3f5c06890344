use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::error::parse_id;
use super::extract::{optional_filter, parse_u32};
use super::{ApiError, ApiJson, AppState, Deleted};
use crate::error::CrmError;
use crate::types::{Feature, FeatureCategory, FeatureInput, FeatureQuery, Page, PageRequest};
use crate::validation::Validate;

#[derive(Debug, Deserialize)]
pub(crate) struct FeatureListParams {
    category: Option<String>,
    search: Option<String>,
    page: Option<String>,
    limit: Option<String>,
}

pub(crate) async fn list_features(
    State(state): State<AppState>,
    Query(params): Query<FeatureListParams>,
) -> Result<Json<Page<Feature>>, ApiError> {
    let category = optional_filter(params.category.as_deref())
        .map(FeatureCategory::try_from)
        .transpose()
        .map_err(ApiError::bad_request)?;
    let query = FeatureQuery {
        category,
        search: params.search,
        page: PageRequest::new(
            parse_u32("page", params.page.as_deref())?,
            parse_u32("limit", params.limit.as_deref())?,
        ),
    };
    Ok(Json(state.store.list_features(query).await?))
}

pub(crate) async fn get_feature(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Feature>, ApiError> {
    let id = parse_id("Feature", &id)?;
    state
        .store
        .get_feature(id)
        .await?
        .map(Json)
        .ok_or_else(|| CrmError::not_found("Feature", id).into())
}

pub(crate) async fn create_feature(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<FeatureInput>,
) -> Result<(StatusCode, Json<Feature>), ApiError> {
    let feature = state.store.create_feature(body.validated()?).await?;
    Ok((StatusCode::CREATED, Json(feature)))
}

pub(crate) async fn replace_feature(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<FeatureInput>,
) -> Result<Json<Feature>, ApiError> {
    let id = parse_id("Feature", &id)?;
    Ok(Json(
        state.store.replace_feature(id, body.validated()?).await?,
    ))
}

pub(crate) async fn delete_feature(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Deleted>, ApiError> {
    let id = parse_id("Feature", &id)?;
    if state.store.delete_feature(id).await? {
        Ok(Json(Deleted::OK))
    } else {
        Err(CrmError::not_found("Feature", id).into())
    }
}

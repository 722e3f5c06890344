use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::error::parse_id;
use super::extract::{optional_filter, parse_u32};
use super::{ApiError, ApiJson, AppState, Deleted};
use crate::error::CrmError;
use crate::types::{
    NewPartner, Page, PageRequest, Partner, PartnerPatch, PartnerQuery, PartnerSortField,
    PartnerStatus, SortOrder,
};
use crate::validation::Validate;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PartnerListParams {
    active_kanban: Option<String>,
    status: Option<String>,
    search: Option<String>,
    sort_by: Option<String>,
    order: Option<String>,
    page: Option<String>,
    limit: Option<String>,
}

impl PartnerListParams {
    fn wants_board(&self) -> bool {
        self.active_kanban.as_deref() == Some("true")
    }

    fn into_query(self) -> Result<PartnerQuery, ApiError> {
        let status = optional_filter(self.status.as_deref())
            .map(PartnerStatus::try_from)
            .transpose()
            .map_err(ApiError::bad_request)?;
        let sort_by = self
            .sort_by
            .as_deref()
            .map(PartnerSortField::try_from)
            .transpose()
            .map_err(ApiError::bad_request)?
            .unwrap_or_default();
        let order = self
            .order
            .as_deref()
            .map(SortOrder::try_from)
            .transpose()
            .map_err(ApiError::bad_request)?
            .unwrap_or_default();

        Ok(PartnerQuery {
            status,
            search: self.search,
            sort_by,
            order,
            page: PageRequest::new(
                parse_u32("page", self.page.as_deref())?,
                parse_u32("limit", self.limit.as_deref())?,
            ),
        })
    }
}

/// The board view is a bare array; every other listing is a page.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum PartnerListing {
    Board(Vec<Partner>),
    Page(Page<Partner>),
}

pub(crate) async fn list_partners(
    State(state): State<AppState>,
    Query(params): Query<PartnerListParams>,
) -> Result<Json<PartnerListing>, ApiError> {
    if params.wants_board() {
        let board = state.store.list_kanban_partners().await?;
        return Ok(Json(PartnerListing::Board(board)));
    }
    let page = state.store.list_partners(params.into_query()?).await?;
    Ok(Json(PartnerListing::Page(page)))
}

pub(crate) async fn get_partner(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Partner>, ApiError> {
    let id = parse_id("Partner", &id)?;
    state
        .store
        .get_partner(id)
        .await?
        .map(Json)
        .ok_or_else(|| CrmError::not_found("Partner", id).into())
}

pub(crate) async fn create_partner(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewPartner>,
) -> Result<(StatusCode, Json<Partner>), ApiError> {
    let partner = state.store.create_partner(body.validated()?).await?;
    Ok((StatusCode::CREATED, Json(partner)))
}

pub(crate) async fn update_partner(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<PartnerPatch>,
) -> Result<Json<Partner>, ApiError> {
    let id = parse_id("Partner", &id)?;
    let partner = state.store.update_partner(id, patch.validated()?).await?;
    Ok(Json(partner))
}

pub(crate) async fn delete_partner(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Deleted>, ApiError> {
    let id = parse_id("Partner", &id)?;
    if state.store.delete_partner(id).await? {
        Ok(Json(Deleted::OK))
    } else {
        Err(CrmError::not_found("Partner", id).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_all_status_and_defaults_when_building_query_then_no_filter_and_updated_desc() {
        let query = PartnerListParams {
            status: Some("All".to_string()),
            ..PartnerListParams::default()
        }
        .into_query();

        assert!(matches!(
            query,
            Ok(PartnerQuery {
                status: None,
                sort_by: PartnerSortField::UpdatedAt,
                order: SortOrder::Desc,
                ..
            })
        ));
    }

    #[test]
    fn given_unknown_sort_field_when_building_query_then_bad_request() {
        let query = PartnerListParams {
            sort_by: Some("integrator; DROP TABLE partners".to_string()),
            ..PartnerListParams::default()
        }
        .into_query();
        assert_eq!(query.err().map(|e| e.status()), Some(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn given_active_kanban_flag_when_checking_then_only_true_selects_board() {
        let board = PartnerListParams {
            active_kanban: Some("true".to_string()),
            ..PartnerListParams::default()
        };
        let not_board = PartnerListParams {
            active_kanban: Some("false".to_string()),
            ..PartnerListParams::default()
        };
        assert!(board.wants_board());
        assert!(!not_board.wants_board());
    }
}

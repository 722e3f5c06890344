use axum::extract::State;
use axum::Json;

use super::{ApiError, AppState};
use crate::types::DashboardStats;

pub(crate) async fn stats(State(state): State<AppState>) -> Result<Json<DashboardStats>, ApiError> {
    Ok(Json(state.store.dashboard_stats().await?))
}

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

//! JSON HTTP surface over a [`SharedStore`].

mod dashboard;
mod error;
mod extract;
mod features;
mod knowledge;
mod partners;
mod people;
mod reminders;
mod sessions;

use axum::extract::State;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::auth::SessionSigner;
use crate::store::SharedStore;

pub use error::ApiError;
pub use extract::ApiJson;

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub sessions: SessionSigner,
    /// When false the session guard lets every request through.
    pub auth_required: bool,
}

impl AppState {
    #[must_use]
    pub fn new(store: SharedStore, sessions: SessionSigner, auth_required: bool) -> Self {
        Self {
            store,
            sessions,
            auth_required,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route(
            "/api/partners",
            get(partners::list_partners).post(partners::create_partner),
        )
        .route(
            "/api/partners/:id",
            get(partners::get_partner)
                .put(partners::update_partner)
                .delete(partners::delete_partner),
        )
        .route(
            "/api/people",
            get(people::list_people).post(people::create_person),
        )
        .route(
            "/api/people/:id",
            get(people::get_person)
                .put(people::update_person)
                .delete(people::delete_person),
        )
        .route(
            "/api/knowledge",
            get(knowledge::list_notes).post(knowledge::create_note),
        )
        .route(
            "/api/knowledge/:id",
            get(knowledge::get_note)
                .put(knowledge::replace_note)
                .delete(knowledge::delete_note),
        )
        .route(
            "/api/reminders",
            get(reminders::list_reminders).post(reminders::create_reminder),
        )
        .route(
            "/api/reminders/:id",
            put(reminders::set_completion).delete(reminders::delete_reminder),
        )
        .route(
            "/api/features",
            get(features::list_features).post(features::create_feature),
        )
        .route(
            "/api/features/:id",
            get(features::get_feature)
                .put(features::replace_feature)
                .delete(features::delete_feature),
        )
        .route("/api/dashboard/stats", get(dashboard::stats))
        .route("/api/auth/register", post(sessions::register))
        .route("/api/auth/login", post(sessions::login))
        .route("/api/auth/logout", post(sessions::logout))
        .route("/api/auth/me", get(sessions::me))
        .layer(from_fn_with_state(state.clone(), sessions::require_session))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Clone, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    storage: &'static str,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        storage: state.store.backend_label(),
    })
}

#[derive(Debug, Clone, Copy, Serialize)]
pub(crate) struct Deleted {
    success: bool,
}

impl Deleted {
    pub(crate) const OK: Self = Self { success: true };
}

use axum::body::Body;
use axum::extract::State;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::{ApiError, ApiJson, AppState};
use crate::auth::{
    check_credentials, expired_session_cookie, hash_password, session_cookie,
    session_token_from_cookies, verify_password, LoginRequest, RegisterRequest, SessionClaims,
};
use crate::error::CrmError;
use crate::types::{NewUser, PublicUser, UserRole};
use crate::validation::Validate;

/// Reachable without a session. `me` answers for itself.
const PUBLIC_PATHS: [&str; 4] = [
    "/api/auth/login",
    "/api/auth/register",
    "/api/auth/me",
    "/api/health",
];

fn is_protected(path: &str) -> bool {
    path.starts_with("/api/") && !PUBLIC_PATHS.contains(&path)
}

fn session_from_headers(state: &AppState, headers: &HeaderMap) -> Result<SessionClaims, ApiError> {
    let token = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(session_token_from_cookies)
        .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;
    Ok(state.sessions.verify(token, Utc::now())?)
}

pub(crate) async fn require_session(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if !state.auth_required || !is_protected(req.uri().path()) {
        return next.run(req).await;
    }
    match session_from_headers(&state, req.headers()) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(err) => {
            let mut response = err.into_response();
            if let Ok(value) = expired_session_cookie().parse() {
                response.headers_mut().insert(SET_COOKIE, value);
            }
            response
        }
    }
}

/// bcrypt is CPU bound; keep it off the async workers.
async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> crate::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| CrmError::Internal(format!("Password task failed: {e}")))?
        .map_err(ApiError::from)
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterResponse {
    message: &'static str,
    user: PublicUser,
}

pub(crate) async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let RegisterRequest {
        name,
        email,
        password,
    } = body.validated()?;

    let password_hash = run_blocking(move || hash_password(&password)).await?;
    let account = state
        .store
        .create_user(NewUser {
            name,
            email,
            password_hash,
        })
        .await?;

    let message = if account.role == UserRole::Admin {
        "Account created and auto-approved (Admin)."
    } else {
        "Account created. Waiting for admin approval."
    };
    info!("Registered account {} ({})", account.id, account.role);
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message,
            user: PublicUser::from(&account),
        }),
    ))
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginUser {
    id: Uuid,
    email: String,
    name: String,
    role: UserRole,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginResponse {
    success: bool,
    user: LoginUser,
}

pub(crate) async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Response, ApiError> {
    let LoginRequest { email, password } = body.validated()?;

    let account = state.store.find_user_by_email(&email).await?;
    let stored_hash = account.as_ref().map(|account| account.password_hash.clone());
    let valid = run_blocking(move || {
        check_credentials(stored_hash.as_deref(), &password, verify_password)
    })
    .await?;
    let Some(account) = account.filter(|_| valid) else {
        warn!("Login failed: invalid credentials");
        return Err(CrmError::Unauthorized("Invalid credentials".to_string()).into());
    };
    if !account.is_approved {
        return Err(CrmError::Forbidden(
            "Account pending approval. Please contact an administrator.".to_string(),
        )
        .into());
    }

    let token = state.sessions.issue(&account, Utc::now())?;
    let cookie = session_cookie(&token, state.sessions.ttl())
        .parse::<axum::http::HeaderValue>()
        .map_err(|e| CrmError::Internal(format!("Failed to build session cookie: {e}")))?;

    let body = LoginResponse {
        success: true,
        user: LoginUser {
            id: account.id,
            email: account.email,
            name: account.name,
            role: account.role,
        },
    };
    let mut response = Json(body).into_response();
    response.headers_mut().insert(SET_COOKIE, cookie);
    Ok(response)
}

pub(crate) async fn logout() -> Response {
    let mut response = Json(serde_json::json!({ "success": true })).into_response();
    if let Ok(value) = expired_session_cookie().parse() {
        response.headers_mut().insert(SET_COOKIE, value);
    }
    response
}

pub(crate) async fn me(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match session_from_headers(&state, &headers) {
        Ok(claims) => Json(serde_json::json!({ "user": claims })).into_response(),
        Err(_) => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "user": null })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::is_protected;

    #[test]
    fn given_api_paths_when_checking_guard_then_only_auth_entry_me_and_health_are_public() {
        assert!(!is_protected("/api/auth/login"));
        assert!(!is_protected("/api/auth/register"));
        assert!(!is_protected("/api/health"));
        assert!(!is_protected("/api/auth/me"));
        assert!(is_protected("/api/auth/logout"));
        assert!(is_protected("/api/partners"));
        assert!(!is_protected("/login"));
    }
}

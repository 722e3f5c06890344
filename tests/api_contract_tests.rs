// HTTP contract tests: drive the axum router directly with `oneshot`
// against the in-memory store.

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use partner_desk::api::{build_router, AppState};
use partner_desk::auth::SessionSigner;
use partner_desk::MemoryStore;

struct Reply {
    status: StatusCode,
    set_cookie: Option<String>,
    body: Value,
}

fn app(auth_required: bool) -> Router {
    let state = AppState::new(
        Arc::new(MemoryStore::new()),
        SessionSigner::new("contract-test-secret", 1),
        auth_required,
    );
    build_router(state)
}

async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<&str>,
    cookie: Option<&str>,
) -> Result<Reply, String> {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header(CONTENT_TYPE, "application/json");
    }
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    let request = builder
        .body(body.map_or_else(Body::empty, |raw| Body::from(raw.to_string())))
        .map_err(|e| e.to_string())?;

    let response = router
        .clone()
        .oneshot(request)
        .await
        .map_err(|e| e.to_string())?;
    let status = response.status();
    let set_cookie = response
        .headers()
        .get(SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .map_err(|e| e.to_string())?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .map_err(|e| format!("non-JSON body ({e}): {}", String::from_utf8_lossy(&bytes)))?
    };
    Ok(Reply {
        status,
        set_cookie,
        body,
    })
}

async fn send_json(
    router: &Router,
    method: Method,
    uri: &str,
    body: &Value,
) -> Result<Reply, String> {
    send(router, method, uri, Some(&body.to_string()), None).await
}

async fn create_partner(router: &Router, body: Value) -> Result<String, String> {
    let reply = send_json(router, Method::POST, "/api/partners", &body).await?;
    if reply.status != StatusCode::CREATED {
        return Err(format!("create failed: {} {}", reply.status, reply.body));
    }
    reply.body["id"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| "created partner has no id".to_string())
}

type TestResult = Result<(), String>;

#[tokio::test]
async fn given_incomplete_approvals_when_moving_to_ready_over_http_then_400_and_stage_unchanged(
) -> TestResult {
    let router = app(false);
    let id = create_partner(
        &router,
        json!({
            "name": "Acme",
            "code": "ACM",
            "status": "ONBOARDING",
            "kanbanStage": "SIT_VERIFICATION",
            "docStatus": {"sit": "APPROVED", "reconcile": "PENDING", "devsite": "APPROVED"}
        }),
    )
    .await?;

    let reply = send_json(
        &router,
        Method::PUT,
        &format!("/api/partners/{id}"),
        &json!({"kanbanStage": "READY_FOR_DEPLOY"}),
    )
    .await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["code"], "GUARDRAIL");
    assert!(reply.body["error"]
        .as_str()
        .is_some_and(|message| message.contains("missing required document approvals")));

    let current = send(&router, Method::GET, &format!("/api/partners/{id}"), None, None).await?;
    assert_eq!(current.body["kanbanStage"], "SIT_VERIFICATION");

    let approved = send_json(
        &router,
        Method::PUT,
        &format!("/api/partners/{id}"),
        &json!({
            "kanbanStage": "READY_FOR_DEPLOY",
            "docStatus": {"sit": "APPROVED", "reconcile": "APPROVED", "devsite": "APPROVED"}
        }),
    )
    .await?;
    assert_eq!(approved.status, StatusCode::OK);
    assert_eq!(approved.body["kanbanStage"], "READY_FOR_DEPLOY");
    Ok(())
}

#[tokio::test]
async fn given_draft_partner_when_status_set_to_onboarding_then_kickoff_stage_is_returned(
) -> TestResult {
    let router = app(false);
    let id = create_partner(
        &router,
        json!({"name": "Initech", "code": "INI", "status": "DRAFT"}),
    )
    .await?;

    let reply = send_json(
        &router,
        Method::PUT,
        &format!("/api/partners/{id}"),
        &json!({"status": "ONBOARDING"}),
    )
    .await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["status"], "ONBOARDING");
    assert_eq!(reply.body["kanbanStage"], "AWAITING_KICKOFF");
    Ok(())
}

#[tokio::test]
async fn given_unknown_or_unparseable_ids_when_addressing_partners_then_404() -> TestResult {
    let router = app(false);
    let missing = uuid::Uuid::new_v4();

    let update = send_json(
        &router,
        Method::PUT,
        &format!("/api/partners/{missing}"),
        &json!({"status": "LIVE"}),
    )
    .await?;
    assert_eq!(update.status, StatusCode::NOT_FOUND);
    assert_eq!(update.body["code"], "NOTFOUND");

    let garbage = send(&router, Method::GET, "/api/partners/not-a-uuid", None, None).await?;
    assert_eq!(garbage.status, StatusCode::NOT_FOUND);

    let delete = send(
        &router,
        Method::DELETE,
        &format!("/api/partners/{missing}"),
        None,
        None,
    )
    .await?;
    assert_eq!(delete.status, StatusCode::NOT_FOUND);

    let listing = send(&router, Method::GET, "/api/partners", None, None).await?;
    assert_eq!(listing.body["meta"]["total"], 0);
    Ok(())
}

#[tokio::test]
async fn given_malformed_or_misshapen_bodies_when_posting_then_400_before_any_write() -> TestResult
{
    let router = app(false);

    let broken = send(
        &router,
        Method::POST,
        "/api/partners",
        Some("{\"name\": \"Acme\","),
        None,
    )
    .await?;
    assert_eq!(broken.status, StatusCode::BAD_REQUEST);
    assert_eq!(broken.body["code"], "INVALID");

    let bad_stage = send_json(
        &router,
        Method::POST,
        "/api/partners",
        &json!({"name": "Acme", "code": "ACM", "status": "ONBOARDING", "kanbanStage": "LAUNCHED"}),
    )
    .await?;
    assert_eq!(bad_stage.status, StatusCode::BAD_REQUEST);

    let blank_name = send_json(
        &router,
        Method::POST,
        "/api/partners",
        &json!({"name": "  ", "code": "ACM", "status": "DRAFT"}),
    )
    .await?;
    assert_eq!(blank_name.status, StatusCode::BAD_REQUEST);

    let listing = send(&router, Method::GET, "/api/partners", None, None).await?;
    assert_eq!(listing.body["meta"]["total"], 0);
    Ok(())
}

#[tokio::test]
async fn given_mixed_partners_when_listing_then_board_is_bare_array_and_default_is_paged(
) -> TestResult {
    let router = app(false);
    for (index, status) in ["DRAFT", "ONBOARDING", "LIVE", "MAINTENANCE"].iter().enumerate() {
        create_partner(
            &router,
            json!({"name": format!("Partner {index}"), "code": format!("P{index}"), "status": status}),
        )
        .await?;
    }

    let board = send(
        &router,
        Method::GET,
        "/api/partners?activeKanban=true",
        None,
        None,
    )
    .await?;
    assert_eq!(board.status, StatusCode::OK);
    let cards = board.body.as_array().ok_or("board should be an array")?;
    assert_eq!(cards.len(), 2);
    assert!(cards
        .iter()
        .all(|card| card["status"] == "ONBOARDING" || card["status"] == "MAINTENANCE"));

    let page = send(
        &router,
        Method::GET,
        "/api/partners?limit=3&page=2&sortBy=name&order=asc",
        None,
        None,
    )
    .await?;
    assert_eq!(page.body["meta"]["total"], 4);
    assert_eq!(page.body["meta"]["totalPages"], 2);
    assert_eq!(page.body["meta"]["page"], 2);
    assert_eq!(page.body["data"][0]["name"], "Partner 3");

    let filtered = send(
        &router,
        Method::GET,
        "/api/partners?status=LIVE&search=partner",
        None,
        None,
    )
    .await?;
    assert_eq!(filtered.body["meta"]["total"], 1);

    let bad_sort = send(
        &router,
        Method::GET,
        "/api/partners?sortBy=password",
        None,
        None,
    )
    .await?;
    assert_eq!(bad_sort.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn given_people_notes_reminders_and_features_when_created_then_dashboard_reflects_them(
) -> TestResult {
    let router = app(false);
    let partner_id = create_partner(
        &router,
        json!({"name": "Acme", "code": "ACM", "status": "ONBOARDING"}),
    )
    .await?;

    let feature = send_json(
        &router,
        Method::POST,
        "/api/features",
        &json!({"name": "Card issuing", "category": "SNAP", "apigeeProducts": ["cards"]}),
    )
    .await?;
    assert_eq!(feature.status, StatusCode::CREATED);
    let feature_id = feature.body["id"].as_str().ok_or("feature id")?.to_string();

    let person = send_json(
        &router,
        Method::POST,
        "/api/people",
        &json!({
            "name": "Jo Park",
            "role": "Integration lead",
            "email": "",
            "partnerIds": [partner_id],
            "featureIds": [feature_id]
        }),
    )
    .await?;
    assert_eq!(person.status, StatusCode::CREATED);
    assert_eq!(person.body["partners"][0]["name"], "Acme");
    assert_eq!(person.body["features"][0]["name"], "Card issuing");
    assert!(person.body["email"].is_null());

    let dangling = send_json(
        &router,
        Method::POST,
        "/api/people",
        &json!({"name": "Ghost", "role": "None", "partnerIds": [uuid::Uuid::new_v4()]}),
    )
    .await?;
    assert_eq!(dangling.status, StatusCode::NOT_FOUND);

    let note = send_json(
        &router,
        Method::POST,
        "/api/knowledge",
        &json!({"title": "Sandbox creds", "content": "Rotate monthly", "tags": ["ops"], "isPinned": true}),
    )
    .await?;
    assert_eq!(note.status, StatusCode::CREATED);
    let tagged = send(&router, Method::GET, "/api/knowledge?tag=ops", None, None).await?;
    assert_eq!(tagged.body["meta"]["total"], 1);

    let reminder = send_json(
        &router,
        Method::POST,
        "/api/reminders",
        &json!({"title": "Chase reconcile sign-off", "scheduledAt": "2020-01-01T09:00:00Z", "level": "Critical"}),
    )
    .await?;
    assert_eq!(reminder.status, StatusCode::CREATED);
    let reminder_id = reminder.body["id"].as_str().ok_or("reminder id")?.to_string();
    let active = send(&router, Method::GET, "/api/reminders?active=true", None, None).await?;
    assert_eq!(active.body.as_array().map(Vec::len), Some(1));

    let done = send_json(
        &router,
        Method::PUT,
        &format!("/api/reminders/{reminder_id}"),
        &json!({"isCompleted": true}),
    )
    .await?;
    assert_eq!(done.body["isCompleted"], true);
    let active = send(&router, Method::GET, "/api/reminders?active=true", None, None).await?;
    assert_eq!(active.body.as_array().map(Vec::len), Some(0));

    let stats = send(&router, Method::GET, "/api/dashboard/stats", None, None).await?;
    assert_eq!(stats.status, StatusCode::OK);
    assert_eq!(stats.body["partners"]["total"], 1);
    assert_eq!(stats.body["features"]["total"], 1);
    assert_eq!(stats.body["knowledge"]["pinned"], 1);
    assert_eq!(stats.body["pinnedNotes"][0]["title"], "Sandbox creds");
    assert_eq!(stats.body["recentPartners"][0]["code"], "ACM");

    let removed = send(
        &router,
        Method::DELETE,
        &format!("/api/partners/{partner_id}"),
        None,
        None,
    )
    .await?;
    assert_eq!(removed.body["success"], true);
    let person_id = person.body["id"].as_str().ok_or("person id")?;
    let person = send(
        &router,
        Method::GET,
        &format!("/api/people/{person_id}"),
        None,
        None,
    )
    .await?;
    assert_eq!(person.body["partners"].as_array().map(Vec::len), Some(0));
    Ok(())
}

#[tokio::test]
async fn given_auth_enabled_when_calling_guarded_route_without_cookie_then_401() -> TestResult {
    let router = app(true);

    let health = send(&router, Method::GET, "/api/health", None, None).await?;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["storage"], "memory");

    let reply = send(&router, Method::GET, "/api/partners", None, None).await?;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert!(reply
        .set_cookie
        .is_some_and(|cookie| cookie.contains("Max-Age=0")));

    let forged = send(
        &router,
        Method::GET,
        "/api/partners",
        None,
        Some("session=v1.eyJpZCI6MX0.AAAA"),
    )
    .await?;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn given_auth_enabled_when_asking_me_or_logging_in_as_stranger_then_handlers_answer(
) -> TestResult {
    let router = app(true);

    let me = send(&router, Method::GET, "/api/auth/me", None, None).await?;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
    assert!(me.body["user"].is_null());
    assert!(me.body.get("code").is_none());

    let stranger = send_json(
        &router,
        Method::POST,
        "/api/auth/login",
        &json!({"email": "nobody@example.com", "password": "s3cret-pass"}),
    )
    .await?;
    assert_eq!(stranger.status, StatusCode::UNAUTHORIZED);
    assert_eq!(stranger.body["error"], "Invalid credentials");
    assert!(stranger.set_cookie.is_none());
    Ok(())
}

#[tokio::test]
async fn given_explicit_null_stage_when_updating_partner_then_400_and_stage_unchanged(
) -> TestResult {
    let router = app(false);
    let id = create_partner(
        &router,
        json!({
            "name": "Globex",
            "code": "GLX",
            "status": "ONBOARDING",
            "kanbanStage": "SANDBOX_ACTIVE"
        }),
    )
    .await?;

    let reply = send_json(
        &router,
        Method::PUT,
        &format!("/api/partners/{id}"),
        &json!({"kanbanStage": null}),
    )
    .await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let current = send(&router, Method::GET, &format!("/api/partners/{id}"), None, None).await?;
    assert_eq!(current.body["kanbanStage"], "SANDBOX_ACTIVE");
    Ok(())
}

#[tokio::test]
async fn given_registered_accounts_when_logging_in_then_only_approved_admin_gets_a_session(
) -> TestResult {
    let router = app(true);
    let register = |name: &str, email: &str| {
        json!({"name": name, "email": email, "password": "s3cret-pass"})
    };

    let admin = send_json(
        &router,
        Method::POST,
        "/api/auth/register",
        &register("Ada Admin", "Ada@Example.com"),
    )
    .await?;
    assert_eq!(admin.status, StatusCode::CREATED);
    assert_eq!(admin.body["user"]["role"], "ADMIN");
    assert_eq!(admin.body["user"]["email"], "ada@example.com");
    assert!(admin.body["user"].get("passwordHash").is_none());

    let member = send_json(
        &router,
        Method::POST,
        "/api/auth/register",
        &register("Bo User", "bo@example.com"),
    )
    .await?;
    assert_eq!(member.body["user"]["role"], "USER");
    assert_eq!(member.body["user"]["isApproved"], false);

    let duplicate = send_json(
        &router,
        Method::POST,
        "/api/auth/register",
        &register("Bo Again", "BO@example.com"),
    )
    .await?;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let pending = send_json(
        &router,
        Method::POST,
        "/api/auth/login",
        &json!({"email": "bo@example.com", "password": "s3cret-pass"}),
    )
    .await?;
    assert_eq!(pending.status, StatusCode::FORBIDDEN);

    let wrong = send_json(
        &router,
        Method::POST,
        "/api/auth/login",
        &json!({"email": "ada@example.com", "password": "nope-nope"}),
    )
    .await?;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.body["error"], "Invalid credentials");

    let login = send_json(
        &router,
        Method::POST,
        "/api/auth/login",
        &json!({"email": "ada@example.com", "password": "s3cret-pass"}),
    )
    .await?;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["success"], true);
    let set_cookie = login.set_cookie.ok_or("login should set a cookie")?;
    assert!(set_cookie.contains("HttpOnly"));
    let cookie = set_cookie
        .split(';')
        .next()
        .ok_or("cookie pair")?
        .to_string();

    let me = send(&router, Method::GET, "/api/auth/me", None, Some(&cookie)).await?;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["user"]["email"], "ada@example.com");
    assert_eq!(me.body["user"]["role"], "ADMIN");

    let partners = send(&router, Method::GET, "/api/partners", None, Some(&cookie)).await?;
    assert_eq!(partners.status, StatusCode::OK);

    let logout = send(&router, Method::POST, "/api/auth/logout", None, Some(&cookie)).await?;
    assert_eq!(logout.status, StatusCode::OK);
    assert!(logout
        .set_cookie
        .is_some_and(|cookie| cookie.contains("Max-Age=0")));
    Ok(())
}

//! End-to-end specifications for the marketplace HTTP surface: signup,
//! listing creation, availability checking, the agreement signing lifecycle,
//! and contract download, all exercised through the public router.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use sublet_market::marketplace::{
    market_router, Collaborators, InMemoryStore, MarketState,
};

fn app() -> Router {
    let store = Arc::new(InMemoryStore::new());
    let state = Arc::new(MarketState::new(store, Collaborators::default()));
    market_router(state)
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds");
    let response = app.clone().oneshot(request).await.expect("router responds");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

async fn send_empty(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request builds");
    let response = app.clone().oneshot(request).await.expect("router responds");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn signup(app: &Router, name: &str, email: &str) -> String {
    let (status, body) = send_json(
        app,
        "POST",
        "/signup",
        json!({ "name": name, "email": email, "password": "correct horse" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().expect("user id").to_string()
}

async fn post_listing(app: &Router, owner: &str) -> String {
    let (status, body) = send_json(
        app,
        "POST",
        "/listings",
        json!({
            "title": "Sunny room near campus",
            "address": "123 State St, Madison WI",
            "rent": 1100,
            "securityDeposit": 1100,
            "startDate": "2026-01-01",
            "endDate": "2026-05-31",
            "capacity": 2,
            "owner": owner,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().expect("listing id").to_string()
}

fn accept_body(owner: &str, tenant: &str, start: &str, end: &str) -> Value {
    json!({
        "startDate": start,
        "endDate": end,
        "owner": owner,
        "tenant": tenant,
        "numPeople": 1,
    })
}

#[tokio::test]
async fn double_booking_is_rejected_across_the_http_surface() {
    let app = app();
    let owner = signup(&app, "John Doe", "john@example.edu").await;
    let tenant = signup(&app, "Alice Smith", "alice@example.edu").await;
    let listing = post_listing(&app, &owner).await;

    let (status, body) = send_empty(
        &app,
        "GET",
        &format!("/listings/{listing}/availability?start=2026-01-01&end=2026-02-28"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], json!(true));

    let (status, agreement) = send_json(
        &app,
        "POST",
        &format!("/listings/{listing}/accept"),
        accept_body(&owner, &tenant, "2026-01-01", "2026-02-28"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(agreement["securityDeposit"], json!(1100));
    assert_eq!(agreement["payTerm"], json!("monthly"));

    // Boundary-touching follow-up is a conflict; the next day is fine.
    let (status, _) = send_json(
        &app,
        "POST",
        &format!("/listings/{listing}/accept"),
        accept_body(&owner, &tenant, "2026-02-28", "2026-03-15"),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send_empty(
        &app,
        "GET",
        &format!("/listings/{listing}/availability?start=2026-02-10&end=2026-02-12"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], json!(false));

    let (status, _) = send_json(
        &app,
        "POST",
        &format!("/listings/{listing}/accept"),
        accept_body(&owner, &tenant, "2026-03-01", "2026-03-15"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn signing_flows_through_to_the_rendered_contract() {
    let app = app();
    let owner = signup(&app, "John Doe", "john@example.edu").await;
    let tenant = signup(&app, "Alice Smith", "alice@example.edu").await;
    let listing = post_listing(&app, &owner).await;

    let (status, agreement) = send_json(
        &app,
        "POST",
        &format!("/listings/{listing}/accept"),
        accept_body(&owner, &tenant, "2026-01-01", "2026-02-28"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let agreement_id = agreement["id"].as_str().expect("agreement id").to_string();

    // A stranger cannot sign, and nothing changes.
    let (status, _) = send_json(
        &app,
        "POST",
        &format!("/agreements/{agreement_id}/sign"),
        json!({ "userId": "user-999999" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, signed) = send_json(
        &app,
        "POST",
        &format!("/agreements/{agreement_id}/sign"),
        json!({ "userId": owner }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(signed["ownerSignDate"].is_string());
    assert!(signed["tenantSignDate"].is_null());

    let request = Request::builder()
        .method("GET")
        .uri(format!(
            "/agreements/{agreement_id}/contract?today=2026-01-15"
        ))
        .body(Body::empty())
        .expect("request builds");
    let response = app.clone().oneshot(request).await.expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
        Some("text/plain; charset=utf-8")
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    let text = String::from_utf8(bytes.to_vec()).expect("text document");
    assert!(text.contains("John Doe"));
    assert!(text.contains("01/15/2026"));
    // Owner side is inked, tenant side still shows its placeholder.
    assert!(text.contains("Sublessor signature: John Doe"));
    assert!(text.contains("{TENANT_SIGNATURE}"));

    let (status, both) = send_json(
        &app,
        "POST",
        &format!("/agreements/{agreement_id}/sign"),
        json!({ "userId": tenant }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(both["ownerSignDate"].is_string());
    assert!(both["tenantSignDate"].is_string());

    let (status, _) = send_empty(&app, "DELETE", &format!("/agreements/{agreement_id}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send_empty(&app, "DELETE", &format!("/agreements/{agreement_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn login_and_user_listing_never_expose_passwords() {
    let app = app();
    let owner = signup(&app, "John Doe", "john@example.edu").await;

    let (status, user) = send_json(
        &app,
        "POST",
        "/login",
        json!({ "email": "john@example.edu", "password": "correct horse" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["id"], json!(owner));
    assert!(user.get("password").is_none());

    let (status, _) = send_json(
        &app,
        "POST",
        "/login",
        json!({ "email": "john@example.edu", "password": "wrong" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, users) = send_empty(&app, "GET", "/users").await;
    assert_eq!(status, StatusCode::OK);
    let serialized = users.to_string();
    assert!(!serialized.contains("password"));
    assert!(!serialized.contains("correct horse"));
}

#[tokio::test]
async fn missing_agreement_fields_are_a_bad_request() {
    let app = app();
    let owner = signup(&app, "John Doe", "john@example.edu").await;
    let listing = post_listing(&app, &owner).await;

    let (status, body) = send_json(
        &app,
        "POST",
        &format!("/listings/{listing}/accept"),
        json!({ "startDate": "2026-01-01", "endDate": "2026-02-28" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .expect("error message")
        .contains("numPeople"));
}

#[tokio::test]
async fn profile_images_replace_atomically_over_http() {
    let app = app();
    let owner = signup(&app, "John Doe", "john@example.edu").await;

    let upload = |bytes: &'static [u8]| {
        Request::builder()
            .method("PUT")
            .uri(format!("/users/{owner}/image?filename=me.png"))
            .header(header::CONTENT_TYPE, "image/png")
            .body(Body::from(bytes))
            .expect("request builds")
    };

    let response = app
        .clone()
        .oneshot(upload(b"first portrait"))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(upload(b"second portrait"))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);

    let request = Request::builder()
        .method("GET")
        .uri(format!("/users/{owner}/image"))
        .body(Body::empty())
        .expect("request builds");
    let response = app.clone().oneshot(request).await.expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
        Some("image/png")
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    assert_eq!(&bytes[..], b"second portrait");

    // Non-image uploads are refused outright.
    let request = Request::builder()
        .method("PUT")
        .uri(format!("/users/{owner}/image"))
        .header(header::CONTENT_TYPE, "application/pdf")
        .body(Body::from(&b"%PDF"[..]))
        .expect("request builds");
    let response = app.clone().oneshot(request).await.expect("router responds");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn saved_listings_and_fallback_round_trip() {
    let app = app();
    let owner = signup(&app, "John Doe", "john@example.edu").await;
    let fan = signup(&app, "Sam Lee", "sam@example.edu").await;
    let listing = post_listing(&app, &owner).await;

    let (status, _) = send_empty(
        &app,
        "POST",
        &format!("/listings/{listing}/save?userId={fan}"),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, saved) = send_empty(&app, "GET", &format!("/listings/saved/{fan}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved.as_array().map(Vec::len), Some(1));
    assert_eq!(saved[0]["id"], json!(listing));

    let (status, _) = send_empty(
        &app,
        "DELETE",
        &format!("/listings/{listing}/save?userId={fan}"),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send_empty(&app, "GET", "/no/such/route").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("no such route"));
}

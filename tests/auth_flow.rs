use axum::{
    Router,
    body::{self, Body},
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use tower::ServiceExt; // for `oneshot`

use food_identity::{
    domain::AccountProfile,
    routes::API_PREFIX,
    test_helpers::TestServices,
};

fn api_path(path: &str) -> String {
    format!("{API_PREFIX}{path}")
}

fn customer(name: &str) -> AccountProfile {
    AccountProfile::Customer {
        full_name: name.to_string(),
    }
}

fn admin() -> AccountProfile {
    AccountProfile::Admin {
        full_name: "Root".to_string(),
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(request).await.unwrap();
    let status = res.status();
    let body = body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn post_json(path: &str, payload: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(api_path(path))
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(payload.to_string())).unwrap()
}

fn with_token(method: &str, path: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(api_path(path))
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

async fn login(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        post_json(
            "/auth/login",
            json!({ "emailAddress": email, "password": password }),
            None,
        ),
    )
    .await
}

async fn token_for(app: &Router, email: &str, password: &str) -> String {
    let (status, json) = login(app, email, password).await;
    assert_eq!(status, StatusCode::OK, "login failed: {json}");
    json["data"]["token"]
        .as_str()
        .expect("token in response")
        .to_string()
}

#[tokio::test]
async fn login_returns_token_and_me_reads_account() {
    let t = TestServices::new();
    let account = t
        .store
        .seed_account("a@x.com", customer("Ada"), Some("secret1"));
    let app = t.router();

    let (status, json) = login(&app, "a@x.com", "secret1").await;
    assert_eq!(status, StatusCode::OK);
    let data = &json["data"];
    assert_eq!(data["id"], account.id.to_string());
    assert_eq!(data["tokenType"], "Bearer");
    assert_eq!(data["expiresIn"], 3600);
    let token = data["token"].as_str().expect("token in response");

    let (status, json) = send(&app, with_token("GET", "/users/me", token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["emailAddress"], "a@x.com");
    assert_eq!(json["data"]["displayName"], "Ada");
    assert_eq!(json["data"]["kind"], "customer");
    assert_eq!(json["data"]["state"], "active");
    assert_eq!(json["data"]["loginCount"], 1);
}

#[tokio::test]
async fn wrong_password_is_unauthorized_with_generic_message() {
    let t = TestServices::new();
    t.store
        .seed_account("a@x.com", customer("Ada"), Some("secret1"));
    let app = t.router();

    let (wrong_status, wrong) = login(&app, "a@x.com", "secret2").await;
    let (unknown_status, unknown) = login(&app, "ghost@x.com", "secret1").await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong["message"], "Invalid credentials");
    assert_eq!(wrong["message"], unknown["message"]);
    assert!(wrong["data"].is_null());
}

#[tokio::test]
async fn me_without_token_is_rejected() {
    let app = TestServices::new().router();

    let (status, json) = send(
        &app,
        Request::builder()
            .uri(api_path("/users/me"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["status"], 401);
}

#[tokio::test]
async fn tampered_token_is_rejected() {
    let t = TestServices::new();
    t.store
        .seed_account("a@x.com", customer("Ada"), Some("secret1"));
    let app = t.router();
    let token = token_for(&app, "a@x.com", "secret1").await;

    let mut tampered = token.into_bytes();
    let last = tampered.len() - 2;
    tampered[last] = if tampered[last] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(tampered).unwrap();

    let (status, json) = send(&app, with_token("GET", "/users/me", &tampered)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Invalid or expired token");
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let t = TestServices::new();
    t.store
        .seed_account("a@x.com", customer("Ada"), Some("secret1"));
    let app = t.router();
    let token = token_for(&app, "a@x.com", "secret1").await;

    t.clock.advance(chrono::Duration::seconds(3600));

    let (status, _) = send(&app, with_token("GET", "/users/me", &token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_require_admin_role() {
    let t = TestServices::new();
    let target = t
        .store
        .seed_account("a@x.com", customer("Ada"), Some("secret1"));
    let app = t.router();
    let token = token_for(&app, "a@x.com", "secret1").await;

    let (status, _) = send(
        &app,
        with_token("POST", &format!("/admin/accounts/{}/lock", target.id), &token),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_lock_blocks_login_until_unlock() {
    let t = TestServices::new();
    t.store
        .seed_account("root@x.com", admin(), Some("rootpass"));
    let target = t
        .store
        .seed_account("a@x.com", customer("Ada"), Some("secret1"));
    let app = t.router();
    let admin_token = token_for(&app, "root@x.com", "rootpass").await;

    let (status, json) = send(
        &app,
        with_token("POST", &format!("/admin/accounts/{}/lock", target.id), &admin_token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["state"], "locked");

    let (status, json) = login(&app, "a@x.com", "secret1").await;
    assert_eq!(status, StatusCode::LOCKED);
    assert_eq!(json["message"], "Account is locked");

    let (status, _) = send(
        &app,
        with_token("POST", &format!("/admin/accounts/{}/unlock", target.id), &admin_token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = login(&app, "a@x.com", "secret1").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn admin_delete_then_missing_account_is_not_found() {
    let t = TestServices::new();
    t.store
        .seed_account("root@x.com", admin(), Some("rootpass"));
    let target = t
        .store
        .seed_account("a@x.com", customer("Ada"), Some("secret1"));
    let app = t.router();
    let admin_token = token_for(&app, "root@x.com", "rootpass").await;
    let path = format!("/admin/accounts/{}", target.id);

    let (status, json) = send(&app, with_token("DELETE", &path, &admin_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["deleted"], target.id.to_string());

    let (status, _) = send(&app, with_token("DELETE", &path, &admin_token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(t.store.credential(target.id).is_none());
}

#[tokio::test]
async fn session_cap_returns_too_many_requests() {
    let t = TestServices::new();
    t.store
        .seed_account("a@x.com", customer("Ada"), Some("secret1"));
    let app = t.router();

    for _ in 0..t.config.session.max_sessions {
        let (status, _) = login(&app, "a@x.com", "secret1").await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, _) = login(&app, "a@x.com", "secret1").await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn session_cap_lifts_once_tokens_expire() {
    let t = TestServices::new();
    t.store
        .seed_account("a@x.com", customer("Ada"), Some("secret1"));
    let app = t.router();

    for _ in 0..t.config.session.max_sessions {
        token_for(&app, "a@x.com", "secret1").await;
    }
    let (status, _) = login(&app, "a@x.com", "secret1").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    t.clock
        .advance(chrono::Duration::seconds(t.config.auth.token_ttl_secs as i64));
    let (status, _) = login(&app, "a@x.com", "secret1").await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn logout_frees_a_session_slot() {
    let t = TestServices::new();
    t.store
        .seed_account("a@x.com", customer("Ada"), Some("secret1"));
    let app = t.router();

    let mut tokens = Vec::new();
    for _ in 0..t.config.session.max_sessions {
        tokens.push(token_for(&app, "a@x.com", "secret1").await);
    }

    let (status, json) = send(&app, with_token("POST", "/auth/logout", &tokens[0])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["loggedOut"], true);

    let (status, _) = login(&app, "a@x.com", "secret1").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn password_reset_flow_over_http() {
    let t = TestServices::new();
    t.store
        .seed_account("a@x.com", customer("Ada"), Some("secret1"));
    let app = t.router();

    let (status, json) = send(
        &app,
        post_json("/users/password-reset/request", json!({ "email": "ghost@x.com" }), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["requested"], true);
    assert!(t.notifier.sent().is_empty());

    let (status, _) = send(
        &app,
        post_json("/users/password-reset/request", json!({ "email": "a@x.com" }), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let key = t.notifier.last_key_for("a@x.com").expect("reset mail sent");

    let (status, json) = send(
        &app,
        post_json(
            "/users/password-reset/fulfill",
            json!({ "key": key, "password": "newpass", "confirmPassword": "different" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Passwords do not match");

    let fulfill = json!({ "key": key, "password": "newpass", "confirmPassword": "newpass" });
    let (status, json) = send(
        &app,
        post_json("/users/password-reset/fulfill", fulfill.clone(), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["reset"], true);

    let (status, _) = send(&app, post_json("/users/password-reset/fulfill", fulfill, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = login(&app, "a@x.com", "newpass").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn customer_registration_and_verification_over_http() {
    let t = TestServices::new();
    let app = t.router();
    let register = json!({ "emailAddress": "New@X.com", "fullName": "Grace" });

    let (status, json) = send(&app, post_json("/users/register/customer", register.clone(), None)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["emailAddress"], "new@x.com");
    assert_eq!(json["data"]["state"], "pendingVerification");

    let (status, _) = send(&app, post_json("/users/register/customer", register, None)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let key = t
        .notifier
        .last_key_for("new@x.com")
        .expect("verification mail sent");
    let (status, json) = send(
        &app,
        post_json(
            "/users/verify",
            json!({ "key": key, "password": "secret1", "confirmPassword": "secret1" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["verified"], true);

    let (status, _) = login(&app, "new@x.com", "secret1").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn restaurant_registration_waits_for_approval() {
    let t = TestServices::new();
    t.store
        .seed_account("root@x.com", admin(), Some("rootpass"));
    let app = t.router();

    let (status, json) = send(
        &app,
        post_json(
            "/users/register/restaurant",
            json!({
                "emailAddress": "owner@pho.example",
                "restaurantName": "Pho Place",
                "ownerName": "Lan"
            }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["state"], "pendingApproval");
    assert_eq!(json["data"]["approval"], "pending");
    let id = json["data"]["id"].as_str().expect("id in response").to_string();

    let (status, _) = login(&app, "owner@pho.example", "anything").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let admin_token = token_for(&app, "root@x.com", "rootpass").await;
    let (status, json) = send(
        &app,
        with_token("POST", &format!("/admin/accounts/{id}/approve"), &admin_token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["approval"], "approved");
    assert!(t.notifier.last_key_for("owner@pho.example").is_some());
}

#[tokio::test]
async fn profile_update_rejects_taken_email() {
    let t = TestServices::new();
    t.store
        .seed_account("a@x.com", customer("Ada"), Some("secret1"));
    t.store.seed_account("b@x.com", customer("Bob"), None);
    let app = t.router();
    let token = token_for(&app, "a@x.com", "secret1").await;

    let request = Request::builder()
        .method("PUT")
        .uri(api_path("/users/me"))
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(json!({ "emailAddress": "b@x.com" }).to_string()))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let request = Request::builder()
        .method("PUT")
        .uri(api_path("/users/me"))
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(json!({ "displayName": "Ada L." }).to_string()))
        .unwrap();
    let (status, json) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["displayName"], "Ada L.");
}

#[tokio::test]
async fn rejected_restaurant_cannot_use_earlier_verification_key() {
    let t = TestServices::new();
    t.store
        .seed_account("root@x.com", admin(), Some("rootpass"));
    let app = t.router();

    let (status, json) = send(
        &app,
        post_json(
            "/users/register/restaurant",
            json!({
                "emailAddress": "owner@pho.example",
                "restaurantName": "Pho Place",
                "ownerName": "Lan"
            }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = json["data"]["id"].as_str().expect("id in response").to_string();

    let admin_token = token_for(&app, "root@x.com", "rootpass").await;
    let (status, _) = send(
        &app,
        with_token("POST", &format!("/admin/accounts/{id}/approve"), &admin_token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let key = t
        .notifier
        .last_key_for("owner@pho.example")
        .expect("verification mail sent");

    let (status, json) = send(
        &app,
        with_token("POST", &format!("/admin/accounts/{id}/reject"), &admin_token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["approval"], "rejected");

    let (status, _) = send(
        &app,
        post_json(
            "/users/verify",
            json!({ "key": key, "password": "secret1", "confirmPassword": "secret1" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = login(&app, "owner@pho.example", "secret1").await;
    assert_ne!(status, StatusCode::OK);
}

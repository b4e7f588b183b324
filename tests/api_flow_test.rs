//! End-to-end flows through the real router: login, token use, CRUD behind
//! the gates.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use members_api::auth::{KeyMaterial, TokenCodec};
use members_api::members::{InMemoryDirectory, MemberDirectory};
use members_api::routes::create_routes;
use members_api::server::AppState;

const PRIVATE_PEM: &[u8] = include_bytes!("fixtures/jwt_private.pem");
const PUBLIC_PEM: &[u8] = include_bytes!("fixtures/jwt_public.pem");

/// App with an administrator (permission 1) and a plain member.
fn app() -> (Router, AppState) {
    let directory = Arc::new(InMemoryDirectory::new());
    directory.insert("admin", "admin-pw", vec![1]).unwrap();
    directory.insert("trainee", "trainee-pw", vec![]).unwrap();

    let state = AppState::new(
        Arc::new(TokenCodec::new(Arc::new(
            KeyMaterial::from_pem(PRIVATE_PEM, PUBLIC_PEM).unwrap(),
        ))),
        directory,
    );
    (create_routes(state.clone()), state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::String(
        String::from_utf8_lossy(&bytes).into_owned(),
    ));
    (status, body)
}

fn post_json(uri: &str, bearer: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

fn get_with(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        post_json(
            "/auth/login",
            None,
            &json!({"username": username, "password": password}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 3600);
    body["token"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn test_login_issues_verifiable_token() {
    let (app, state) = app();
    let token = login(&app, "admin", "admin-pw").await;

    let payload = state.codec.verify(&token).unwrap();
    assert_eq!(payload.member_id, 1);
    assert_eq!(payload.username, "admin");
    assert_eq!(payload.permissions, vec![1]);
}

#[tokio::test]
async fn test_login_with_bad_credentials_is_a_generic_401() {
    let (app, _) = app();
    for (username, password) in [("admin", "wrong"), ("ghost", "admin-pw")] {
        let (status, body) = send(
            &app,
            post_json(
                "/auth/login",
                None,
                &json!({"username": username, "password": password}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, Value::String("Authentication failed: Please log in".into()));
    }
}

#[tokio::test]
async fn test_protected_routes_reject_anonymous_callers() {
    let (app, _) = app();

    let (status, body) = send(&app, get_with("/members", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, Value::String("Authentication failed: Please log in".into()));

    let (status, _) = send(&app, get_with("/members/1", Some("truncated.token"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_reflects_the_token() {
    let (app, _) = app();
    let token = login(&app, "admin", "admin-pw").await;

    let (status, body) = send(&app, get_with("/auth/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["member_id"], 1);
    assert_eq!(body["permissions"], json!([1]));
}

#[tokio::test]
async fn test_any_member_may_list_members() {
    let (app, _) = app();
    let token = login(&app, "trainee", "trainee-pw").await;

    let (status, body) = send(&app, get_with("/members", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
    // Listings never expose credentials.
    assert!(body[0].get("password").is_none());
}

#[tokio::test]
async fn test_only_administrators_may_create_members() {
    let (app, _) = app();
    let new_member = json!({"username": "newbie", "password": "pw", "permissions": []});

    let trainee = login(&app, "trainee", "trainee-pw").await;
    let (status, body) = send(&app, post_json("/members", Some(&trainee), &new_member)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body,
        Value::String("Authorization failed: You are not permitted to do this".into())
    );

    let admin = login(&app, "admin", "admin-pw").await;
    let (status, body) = send(&app, post_json("/members", Some(&admin), &new_member)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "newbie");

    // The rejected request must not have created anything: the id continues
    // from the seeded members.
    assert_eq!(body["id"], 3);
}

#[tokio::test]
async fn test_member_detail_is_self_or_administrator() {
    let (app, _) = app();
    let trainee = login(&app, "trainee", "trainee-pw").await;
    let admin = login(&app, "admin", "admin-pw").await;

    // Trainee (member 2) reads their own record.
    let (status, body) = send(&app, get_with("/members/2", Some(&trainee))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "trainee");

    // ...but not someone else's.
    let (status, _) = send(&app, get_with("/members/1", Some(&trainee))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The administrator reads anyone's.
    let (status, _) = send(&app, get_with("/members/2", Some(&admin))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_member_update_respects_the_gate_and_the_directory() {
    let (app, state) = app();
    let trainee = login(&app, "trainee", "trainee-pw").await;

    let request = Request::builder()
        .method("PATCH")
        .uri("/members/2")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {trainee}"))
        .body(Body::from(
            serde_json::to_vec(&json!({"username": "t.neu"})).unwrap(),
        ))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "t.neu");
    assert_eq!(state.directory.get(2).unwrap().username, "t.neu");

    // Renaming someone else without the administration permission stops at
    // the gate; the directory is untouched.
    let request = Request::builder()
        .method("PATCH")
        .uri("/members/1")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {trainee}"))
        .body(Body::from(
            serde_json::to_vec(&json!({"username": "hijacked"})).unwrap(),
        ))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(state.directory.get(1).unwrap().username, "admin");
}

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use edubot_shared::constants::CANNED_TUTOR_REPLY;
use edubot_store::Database;

use super::{build_router, AppState};
use crate::config::{RevocationBackend, ServerConfig};
use crate::tutor::Tutor;

const SECRET: &str = "test-secret";
const EMAIL: &str = "ada@example.com";
const PASSWORD: &str = "correct horse";

fn test_state(backend: RevocationBackend) -> AppState {
    let config = ServerConfig {
        jwt_secret: Some(SECRET.into()),
        bcrypt_cost: 4,
        revocation_backend: backend,
        ..Default::default()
    };
    AppState::with_tutor(config, Database::open_in_memory().unwrap(), Tutor::Canned)
}

fn test_app() -> (Router, AppState) {
    let state = test_state(RevocationBackend::Memory);
    (build_router(state.clone()), state)
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Send `body` verbatim, optionally without a JSON content type.
async fn call_raw(
    app: &Router,
    uri: &str,
    token: &str,
    content_type: Option<&str>,
    body: &str,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"));
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    let req = builder.body(Body::from(body.to_string())).unwrap();

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn signup(app: &Router, email: &str) -> (StatusCode, Value) {
    call(
        app,
        Method::POST,
        "/signup",
        None,
        Some(json!({ "email": email, "password": PASSWORD })),
    )
    .await
}

/// Sign up `email` and return a fresh session token for it.
async fn session(app: &Router, email: &str) -> String {
    let (status, _) = signup(app, email).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = call(
        app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "email": email, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

async fn new_chat(app: &Router, token: &str, name: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/chats",
        Some(token),
        Some(json!({ "chatName": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["chatId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn root_and_health_are_public() {
    let (app, _) = test_app();
    let (status, body) = call(&app, Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Welcome to the edubot API.");

    let (status, body) = call(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

// ─── Accounts ───

#[tokio::test]
async fn signup_creates_account_once() {
    let (app, _) = test_app();

    let (status, body) = signup(&app, EMAIL).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "User created successfully.");

    let (status, body) = signup(&app, EMAIL).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "An account with this email already exists.");
}

#[tokio::test]
async fn signup_rejects_bad_input() {
    let (app, _) = test_app();

    let (status, body) = call(
        &app,
        Method::POST,
        "/signup",
        None,
        Some(json!({ "email": EMAIL, "password": "short" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Password must be at least 8 characters long.");

    let (status, body) = call(
        &app,
        Method::POST,
        "/signup",
        None,
        Some(json!({ "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Empty or missing email.");

    let (status, body) = call(
        &app,
        Method::POST,
        "/signup",
        None,
        Some(json!({ "email": EMAIL, "password": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Empty or missing password.");
}

#[tokio::test]
async fn password_length_counts_characters() {
    let (app, _) = test_app();

    // Seven astral-plane characters: 14 UTF-16 units, 28 bytes.
    let (status, _) = call(
        &app,
        Method::POST,
        "/signup",
        None,
        Some(json!({ "email": EMAIL, "password": "🦀🦀🦀🦀🦀🦀🦀" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        Method::POST,
        "/signup",
        None,
        Some(json!({ "email": EMAIL, "password": "🦀🦀🦀🦀🦀🦀🦀🦀" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn login_outcomes() {
    let (app, _) = test_app();
    signup(&app, EMAIL).await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "email": EMAIL, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Success");
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));

    let (status, body) = call(
        &app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "email": EMAIL, "password": "not the password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "The password is incorrect.");

    let (status, body) = call(
        &app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "email": "nobody@example.com", "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No account exists with this email.");
}

#[tokio::test]
async fn user_id_matches_stored_account() {
    let (app, state) = test_app();
    let token = session(&app, EMAIL).await;

    let (status, body) = call(&app, Method::GET, "/get-user-id", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let user = state.db.lock().await.get_user_by_email(EMAIL).unwrap();
    assert_eq!(body["userId"], user.id.to_string());
}

// ─── Settings ───

#[tokio::test]
async fn settings_default_then_partial_update() {
    let (app, _) = test_app();
    let token = session(&app, EMAIL).await;

    let (status, body) = call(&app, Method::GET, "/get-user-settings", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["settings"],
        json!({ "expertiseLevel": "beginner", "colorTheme": "light" })
    );

    let (status, body) = call(
        &app,
        Method::POST,
        "/update-settings",
        Some(&token),
        Some(json!({ "settings": { "colorTheme": "dark" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Settings updated successfully.");
    assert_eq!(
        body["updatedSettings"],
        json!({ "expertiseLevel": "beginner", "colorTheme": "dark" })
    );

    let (_, body) = call(&app, Method::GET, "/get-user-settings", Some(&token), None).await;
    assert_eq!(body["settings"]["colorTheme"], "dark");
}

#[tokio::test]
async fn update_settings_for_someone_else_is_not_found() {
    let (app, _) = test_app();
    let token = session(&app, EMAIL).await;
    let other = session(&app, "grace@example.com").await;

    let (_, body) = call(&app, Method::GET, "/get-user-id", Some(&other), None).await;
    let other_id = body["userId"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        Method::POST,
        "/update-settings",
        Some(&token),
        Some(json!({ "userId": other_id, "settings": { "expertiseLevel": "advanced" } })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found.");

    let (_, body) = call(&app, Method::GET, "/get-user-settings", Some(&other), None).await;
    assert_eq!(body["settings"]["expertiseLevel"], "beginner");
}

#[tokio::test]
async fn update_settings_rejects_unknown_values() {
    let (app, _) = test_app();
    let token = session(&app, EMAIL).await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/update-settings",
        Some(&token),
        Some(json!({ "settings": { "colorTheme": "sepia" } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("sepia"));

    let (_, body) = call(&app, Method::GET, "/get-user-settings", Some(&token), None).await;
    assert_eq!(body["settings"]["colorTheme"], "light");
}

#[tokio::test]
async fn unreadable_bodies_get_json_errors() {
    let (app, _) = test_app();
    let token = session(&app, EMAIL).await;

    let (status, body) = call_raw(
        &app,
        "/api/chats",
        &token,
        Some("application/json"),
        "{\"chatName\": ",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (status, body) = call_raw(&app, "/api/chats", &token, None, r#"{"chatName":"Loops"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (_, body) = call(&app, Method::GET, "/api/chats", Some(&token), None).await;
    assert!(body["chats"].as_array().unwrap().is_empty());
}

// ─── Session guard ───

#[tokio::test]
async fn missing_token_is_rejected() {
    let (app, _) = test_app();
    let (status, body) = call(&app, Method::GET, "/protected-route", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "A token is required for authentication.");
    assert_eq!(body["code"], "missing_token");
}

#[tokio::test]
async fn garbage_token_is_invalid() {
    let (app, _) = test_app();
    let (status, body) = call(&app, Method::GET, "/protected-route", Some("nope"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "invalid");
}

#[tokio::test]
async fn expired_token_is_forbidden() {
    let (app, state) = test_app();
    session(&app, EMAIL).await;
    let stale = state
        .tokens
        .issue_at(EMAIL, Utc::now() - Duration::hours(1))
        .unwrap();

    let (status, body) = call(&app, Method::GET, "/protected-route", Some(&stale), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Session expired.");
    assert_eq!(body["code"], "expired");
}

#[tokio::test]
async fn deleted_user_is_not_found() {
    let (app, state) = test_app();
    let token = session(&app, EMAIL).await;
    assert!(state.db.lock().await.delete_user(EMAIL).unwrap());

    let (status, body) = call(&app, Method::GET, "/get-user-id", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found.");
    assert_eq!(body["code"], "unknown_identity");
}

#[tokio::test]
async fn protected_route_admits_valid_session() {
    let (app, _) = test_app();
    let token = session(&app, EMAIL).await;
    let (status, body) = call(&app, Method::GET, "/protected-route", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "This is protected data.");
}

async fn logout_revokes(state: AppState) {
    let app = build_router(state);
    let token = session(&app, EMAIL).await;

    let (status, body) = call(&app, Method::POST, "/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Session terminated");

    let (status, body) = call(&app, Method::GET, "/get-user-id", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Session has been terminated.");
    assert_eq!(body["code"], "revoked");

    // A fresh login is unaffected.
    let (_, body) = call(
        &app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "email": EMAIL, "password": PASSWORD })),
    )
    .await;
    let fresh = body["token"].as_str().unwrap();
    assert_ne!(fresh, token);
    let (status, _) = call(&app, Method::GET, "/get-user-id", Some(fresh), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn logout_revokes_with_memory_registry() {
    logout_revokes(test_state(RevocationBackend::Memory)).await;
}

#[tokio::test]
async fn logout_revokes_with_persistent_registry() {
    logout_revokes(test_state(RevocationBackend::Persistent)).await;
}

// ─── Chats ───

#[tokio::test]
async fn create_list_and_delete_chats() {
    let (app, _) = test_app();
    let token = session(&app, EMAIL).await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/chats",
        Some(&token),
        Some(json!({ "chatName": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Chat name cannot be empty.");

    let first = new_chat(&app, &token, "Loops").await;
    let second = new_chat(&app, &token, "Recursion").await;

    let (status, body) = call(&app, Method::GET, "/api/chats", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = body["chats"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["chatId"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&first) && ids.contains(&second));

    let uri = format!("/api/chats/{first}");
    let (status, body) = call(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Chat deleted successfully.");

    let (status, _) = call(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = call(&app, Method::GET, "/api/chats", Some(&token), None).await;
    assert_eq!(body["chats"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn chats_are_invisible_to_other_users() {
    let (app, _) = test_app();
    let owner = session(&app, EMAIL).await;
    let intruder = session(&app, "mallory@example.com").await;
    let chat_id = new_chat(&app, &owner, "Private").await;

    let (_, body) = call(&app, Method::GET, "/api/chats", Some(&intruder), None).await;
    assert!(body["chats"].as_array().unwrap().is_empty());

    let uri = format!("/api/chats/{chat_id}");
    let (status, body) = call(&app, Method::DELETE, &uri, Some(&intruder), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Chat not found or access denied.");

    let uri = format!("/fetch-messages/{chat_id}");
    let (status, _) = call(&app, Method::GET, &uri, Some(&intruder), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(
        &app,
        Method::POST,
        "/send-message",
        Some(&intruder),
        Some(json!({ "chatId": chat_id, "message": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, Method::GET, "/api/chats", Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn send_message_appends_user_and_tutor_turns() {
    let (app, _) = test_app();
    let token = session(&app, EMAIL).await;
    let chat_id = new_chat(&app, &token, "Loops").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/send-message",
        Some(&token),
        Some(json!({ "chatId": chat_id, "message": "What is a for loop?" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Message sent successfully.");
    let chat = body["chat"].as_array().unwrap();
    assert_eq!(chat.len(), 2);
    assert_eq!(chat[0]["text"], "What is a for loop?");
    assert_eq!(chat[0]["isFromUser"], true);
    assert_eq!(chat[1]["text"], CANNED_TUTOR_REPLY);
    assert_eq!(chat[1]["isFromUser"], false);

    call(
        &app,
        Method::POST,
        "/send-message",
        Some(&token),
        Some(json!({ "chatId": chat_id, "message": "And a while loop?" })),
    )
    .await;

    let uri = format!("/fetch-messages/{chat_id}");
    let (status, body) = call(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Messages fetched successfully.");
    let texts: Vec<_> = body["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["text"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        texts,
        vec![
            "What is a for loop?",
            CANNED_TUTOR_REPLY,
            "And a while loop?",
            CANNED_TUTOR_REPLY,
        ]
    );
}

#[tokio::test]
async fn send_message_validates_input() {
    let (app, _) = test_app();
    let token = session(&app, EMAIL).await;
    let chat_id = new_chat(&app, &token, "Loops").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/send-message",
        Some(&token),
        Some(json!({ "chatId": chat_id, "message": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Message content cannot be empty.");

    let (status, body) = call(
        &app,
        Method::POST,
        "/send-message",
        Some(&token),
        Some(json!({ "chatId": "missing", "message": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Chat not found or access denied.");
}

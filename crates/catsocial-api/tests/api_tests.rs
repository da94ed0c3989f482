//! HTTP tests driving the full router against a temp-file SQLite database.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use catsocial_api::{AppStateInner, router};
use catsocial_db::{Database, PoolOptions};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    let path = std::env::temp_dir().join(format!("catsocial-api-{}.db", uuid::Uuid::new_v4()));
    let db = Database::open(&path, PoolOptions::default()).unwrap();
    router(Arc::new(AppStateInner {
        db,
        jwt_secret: "test-secret".into(),
        token_ttl: chrono::Duration::hours(1),
        hash_cost: 1,
    }))
}

async fn send(
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
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn register(app: &Router, email: &str, name: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/v1/user/register",
        None,
        Some(json!({ "email": email, "name": name, "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["accessToken"].as_str().unwrap().to_string()
}

fn cat_body(name: &str, sex: &str) -> Value {
    json!({
        "name": name,
        "race": "Persian",
        "sex": sex,
        "ageInMonth": 12,
        "description": "A fine cat",
        "imageUrls": ["https://img.example.com/cat.png"],
    })
}

async fn create_cat(app: &Router, token: &str, name: &str, sex: &str) -> String {
    let (status, body) =
        send(app, Method::POST, "/v1/cat", Some(token), Some(cat_body(name, sex))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn propose(app: &Router, token: &str, user_cat: &str, match_cat: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/v1/cat/match",
        Some(token),
        Some(json!({ "userCatId": user_cat, "matchCatId": match_cat, "message": "let's match" })),
    )
    .await
}

async fn get_cat(app: &Router, token: &str, id: &str) -> Value {
    let (status, body) = send(app, Method::GET, &format!("/v1/cat?id={id}"), Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    body["data"][0].clone()
}

#[tokio::test]
async fn ping_responds() {
    let app = app();
    let response = app
        .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"pong");
}

#[tokio::test]
async fn register_twice_conflicts() {
    let app = app();
    register(&app, "a@example.com", "Alice").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/user/register",
        None,
        Some(json!({ "email": "a@example.com", "name": "Other", "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "Error");
}

#[tokio::test]
async fn register_validates_fields() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/user/register",
        None,
        Some(json!({ "email": "not-an-email", "name": "", "password": "abc" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("email"));
    assert!(message.contains("password"));
    assert!(message.contains("name"));

    let (status, _) = send(&app, Method::POST, "/v1/user/register", None, Some(json!("nope"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_outcomes() {
    let app = app();
    register(&app, "a@example.com", "Alice").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/user/login",
        None,
        Some(json!({ "email": "nobody@example.com", "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/user/login",
        None,
        Some(json!({ "email": "a@example.com", "password": "wrong99" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/user/login",
        None,
        Some(json!({ "email": "a@example.com", "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User logged successfully");
    assert_eq!(body["data"]["name"], "Alice");
    assert!(body["data"]["accessToken"].as_str().is_some());
}

#[tokio::test]
async fn cat_routes_require_a_valid_token() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/v1/cat", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "Error");

    let (status, _) = send(&app, Method::GET, "/v1/cat", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/v1/cat/match", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn cat_crud() {
    let app = app();
    let alice = register(&app, "a@example.com", "Alice").await;
    let bob = register(&app, "b@example.com", "Bob").await;

    let mut bad = cat_body("Tom", "male");
    bad["race"] = json!("Tabby");
    bad["imageUrls"] = json!([]);
    let (status, body) = send(&app, Method::POST, "/v1/cat", Some(&alice), Some(bad)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("race"));

    let tom = create_cat(&app, &alice, "Tom", "male").await;
    create_cat(&app, &alice, "Kitty", "female").await;
    create_cat(&app, &bob, "Tommy", "male").await;

    let (status, body) = send(&app, Method::GET, "/v1/cat?owned=true", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Kitty", "Tom"]);

    let (_, body) = send(&app, Method::GET, "/v1/cat?search=tom&sex=male", Some(&alice), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = send(&app, Method::GET, "/v1/cat?limit=1&offset=1", Some(&alice), None).await;
    assert_eq!(body["data"][0]["name"], "Kitty");

    let (status, _) = send(&app, Method::GET, "/v1/cat?ageInMonth=%3E%3D13", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, "/v1/cat?ageInMonth=%3D%3E4", Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/v1/cat?race=Tabby", Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("/v1/cat/{tom}");
    let (status, _) =
        send(&app, Method::PUT, &uri, Some(&bob), Some(cat_body("Stolen", "male"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let mut renamed = cat_body("Thomas", "male");
    renamed["ageInMonth"] = json!(14);
    let (status, body) = send(&app, Method::PUT, &uri, Some(&alice), Some(renamed)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Thomas");
    assert_eq!(body["data"]["ageInMonth"], 14);
    assert_eq!(body["data"]["id"], tom.as_str());

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::DELETE, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::DELETE, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, "/v1/cat/abc", Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn match_rules_are_enforced() {
    let app = app();
    let alice = register(&app, "a@example.com", "Alice").await;
    let bob = register(&app, "b@example.com", "Bob").await;

    let tom = create_cat(&app, &alice, "Tom", "male").await;
    let kitty = create_cat(&app, &alice, "Kitty", "female").await;
    let max = create_cat(&app, &bob, "Max", "male").await;
    let luna = create_cat(&app, &bob, "Luna", "female").await;

    // Same owner.
    let (status, _) = propose(&app, &alice, &tom, &kitty).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    // Same sex.
    let (status, _) = propose(&app, &alice, &tom, &max).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    // Proposing with someone else's cat.
    let (status, _) = propose(&app, &alice, &max, &kitty).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    // Unknown target.
    let (status, _) = propose(&app, &alice, &tom, "999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/cat/match",
        Some(&alice),
        Some(json!({ "userCatId": tom, "matchCatId": luna, "message": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = propose(&app, &alice, &tom, &luna).await;
    assert_eq!(status, StatusCode::CREATED);
    let match_id = body["data"]["id"].as_str().unwrap().to_string();
    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/cat/match/approve",
        Some(&bob),
        Some(json!({ "matchId": match_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Either cat already matched.
    let (status, _) = propose(&app, &alice, &kitty, &max).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = propose(&app, &bob, &max, &kitty).await;
    assert_eq!(status, StatusCode::CREATED);
    // Bella is female, unmatched and Bob's, so only Tom's match blocks these.
    let bella = create_cat(&app, &bob, "Bella", "female").await;
    let (status, body) = propose(&app, &bob, &bella, &tom).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("already matched"), "{body}");
    let (status, body) = propose(&app, &alice, &tom, &bella).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("already matched"), "{body}");

    // A matched cat keeps its sex but other fields stay editable.
    let uri = format!("/v1/cat/{tom}");
    let (status, _) = send(&app, Method::PUT, &uri, Some(&alice), Some(cat_body("Tom", "female"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, Method::PUT, &uri, Some(&alice), Some(cat_body("Tommy", "male"))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn approval_scenario() {
    let app = app();
    let a = register(&app, "a@example.com", "Alice").await;
    let b = register(&app, "b@example.com", "Bob").await;
    let c = register(&app, "c@example.com", "Carol").await;

    let c1 = create_cat(&app, &a, "C1", "male").await;
    let c2 = create_cat(&app, &b, "C2", "female").await;
    let c3 = create_cat(&app, &c, "C3", "female").await;

    let (status, body) = propose(&app, &a, &c1, &c2).await;
    assert_eq!(status, StatusCode::CREATED);
    let first = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = propose(&app, &c, &c3, &c1).await;
    assert_eq!(status, StatusCode::CREATED);
    let competing = body["data"]["id"].as_str().unwrap().to_string();

    // Both proposals are visible to Alice, newest first, with details joined.
    let (status, body) = send(&app, Method::GET, "/v1/cat/match", Some(&a), None).await;
    assert_eq!(status, StatusCode::OK);
    let listed = body["data"].as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["id"], competing.as_str());
    assert_eq!(listed[0]["issuedBy"]["email"], "c@example.com");
    assert_eq!(listed[1]["matchCatDetail"]["name"], "C2");
    assert_eq!(listed[1]["userCatDetail"]["name"], "C1");
    assert_eq!(listed[1]["message"], "let's match");
    assert_eq!(listed[1]["status"], "pending");

    // Carol is not part of the first match.
    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/cat/match/approve",
        Some(&c),
        Some(json!({ "matchId": first })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/cat/match/approve",
        Some(&b),
        Some(json!({ "matchId": first })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], first.as_str());
    assert_eq!(body["data"]["removedMatches"], 1);

    assert_eq!(get_cat(&app, &a, &c1).await["hasMatched"], true);
    assert_eq!(get_cat(&app, &a, &c2).await["hasMatched"], true);
    assert_eq!(get_cat(&app, &a, &c3).await["hasMatched"], false);

    // The competing proposal was removed and disappears from listings.
    let (_, body) = send(&app, Method::GET, "/v1/cat/match", Some(&c), None).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    for (token, id) in [(&b, &first), (&a, &competing)] {
        for action in ["approve", "reject"] {
            let (status, _) = send(
                &app,
                Method::POST,
                &format!("/v1/cat/match/{action}"),
                Some(token),
                Some(json!({ "matchId": id })),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{action} {id}");
        }
    }

    let (_, body) = send(&app, Method::GET, "/v1/cat?hasMatched=true", Some(&a), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/cat/match/approve",
        Some(&a),
        Some(json!({ "matchId": 424242 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reject_closes_the_match() {
    let app = app();
    let a = register(&app, "a@example.com", "Alice").await;
    let b = register(&app, "b@example.com", "Bob").await;
    let c1 = create_cat(&app, &a, "C1", "male").await;
    let c2 = create_cat(&app, &b, "C2", "female").await;

    let (_, body) = propose(&app, &a, &c1, &c2).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/cat/match/reject",
        Some(&b),
        Some(json!({ "matchId": id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id.as_str());

    assert_eq!(get_cat(&app, &a, &c1).await["hasMatched"], false);
    let (_, body) = send(&app, Method::GET, "/v1/cat/match", Some(&a), None).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    // The cats are free to try again.
    let (status, _) = propose(&app, &a, &c1, &c2).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn only_the_proposer_deletes_a_match() {
    let app = app();
    let a = register(&app, "a@example.com", "Alice").await;
    let b = register(&app, "b@example.com", "Bob").await;
    let c1 = create_cat(&app, &a, "C1", "male").await;
    let c2 = create_cat(&app, &b, "C2", "female").await;

    let (_, body) = propose(&app, &a, &c1, &c2).await;
    let uri = format!("/v1/cat/match/{}", body["data"]["id"].as_str().unwrap());

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&b), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&a), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&a), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, Method::GET, "/v1/cat/match", Some(&b), None).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use vidtube_api::media::MediaHost;
use vidtube_api::tokens::TokenConfig;
use vidtube_api::{AppStateInner, router};
use vidtube_db::Database;

const BOUNDARY: &str = "vidtube-test-boundary";

struct TestApp {
    router: Router,
    _media: TempDir,
}

fn app() -> TestApp {
    let media = tempfile::tempdir().unwrap();
    let tokens = TokenConfig {
        access_secret: "test-access".into(),
        access_ttl: chrono::Duration::minutes(15),
        refresh_secret: "test-refresh".into(),
        refresh_ttl: chrono::Duration::hours(240),
    };
    let state = AppStateInner::new(
        Database::open_in_memory().unwrap(),
        tokens,
        MediaHost::local(media.path().to_path_buf(), "http://localhost:8000"),
    );
    TestApp {
        router: router(state),
        _media: media,
    }
}

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

fn multipart(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
                );
            }
            Part::File(name, file_name, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn send(app: &TestApp, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn call(app: &TestApp, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(v) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_string(&v).unwrap())
        }
        None => Body::empty(),
    };
    send(app, builder.body(body).unwrap()).await
}

async fn call_multipart(
    app: &TestApp,
    method: &str,
    uri: &str,
    token: Option<&str>,
    parts: &[Part<'_>],
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"));
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    send(app, builder.body(Body::from(multipart(parts))).unwrap()).await
}

/// Registers and logs in; returns (user id, access token).
async fn sign_up(app: &TestApp, username: &str) -> (String, String) {
    let email = format!("{username}@example.com");
    let (status, body) = call_multipart(
        app,
        "POST",
        "/api/v1/users/register",
        None,
        &[
            Part::Text("fullname", "Test User"),
            Part::Text("email", &email),
            Part::Text("username", username),
            Part::Text("password", "hunter22"),
            Part::File("avatar", "me.png", b"avatar-bytes"),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (status, body) = call(
        app,
        "POST",
        "/api/v1/users/login",
        None,
        Some(json!({ "username": username, "password": "hunter22" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    (
        body["data"]["user"]["id"].as_str().unwrap().to_string(),
        body["data"]["accessToken"].as_str().unwrap().to_string(),
    )
}

async fn upload_video(app: &TestApp, token: &str, title: &str) -> String {
    let (status, body) = call_multipart(
        app,
        "POST",
        "/api/v1/videos",
        Some(token),
        &[
            Part::Text("title", title),
            Part::Text("description", "a video"),
            Part::File("videoFile", "clip.mp4", b"not really a video"),
            Part::File("thumbnail", "thumb.jpg", b"not really a jpeg"),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn healthcheck_needs_no_auth() {
    let app = app();
    let (status, body) = call(&app, "GET", "/api/v1/healthcheck", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "All Good!!");
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = app();
    let (status, body) = call(&app, "GET", "/api/v1/users/current-user", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["statusCode"], 401);
    assert_eq!(body["success"], false);

    let (status, _) = call(&app, "GET", "/api/v1/users/current-user", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_login_and_profile() {
    let app = app();
    let (id, token) = sign_up(&app, "alice").await;

    let (status, body) = call(&app, "GET", "/api/v1/users/current-user", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id.as_str());
    assert_eq!(body["data"]["username"], "alice");
    assert!(body["data"].get("password").is_none());

    // same username again
    let (status, _) = call_multipart(
        &app,
        "POST",
        "/api/v1/users/register",
        None,
        &[
            Part::Text("fullname", "Other"),
            Part::Text("email", "other@example.com"),
            Part::Text("username", "alice"),
            Part::Text("password", "hunter22"),
            Part::File("avatar", "me.png", b"x"),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(
        &app,
        "POST",
        "/api/v1/users/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn passwords_keep_surrounding_whitespace() {
    let app = app();
    let (status, body) = call_multipart(
        &app,
        "POST",
        "/api/v1/users/register",
        None,
        &[
            Part::Text("fullname", "Spacey"),
            Part::Text("email", "spacey@example.com"),
            Part::Text("username", "spacey"),
            Part::Text("password", " secret pass "),
            Part::File("avatar", "me.png", b"avatar-bytes"),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let login = |password: &'static str| json!({ "username": "spacey", "password": password });

    let (status, _) = call(&app, "POST", "/api/v1/users/login", None, Some(login("secret pass"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) =
        call(&app, "POST", "/api/v1/users/login", None, Some(login(" secret pass "))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let token = body["data"]["accessToken"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        "POST",
        "/api/v1/users/change-password",
        Some(&token),
        Some(json!({ "oldPassword": " secret pass ", "newPassword": "  new one" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, _) = call(&app, "POST", "/api/v1/users/login", None, Some(login("  new one"))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn video_detail_reports_likes_and_subscription() {
    let app = app();
    let (alice_id, alice) = sign_up(&app, "alice").await;
    let (_, bob) = sign_up(&app, "bob").await;
    let video = upload_video(&app, &alice, "intro").await;
    let uri = format!("/api/v1/videos/{video}");

    let (status, body) = call(&app, "GET", &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "intro");
    assert_eq!(body["data"]["likesCount"], 0);
    assert_eq!(body["data"]["isLiked"], false);
    assert_eq!(body["data"]["isSubscribed"], false);

    call(&app, "POST", &format!("/api/v1/likes/toggle/v/{video}"), Some(&bob), None).await;
    call(&app, "POST", &format!("/api/v1/subscriptions/c/{alice_id}"), Some(&bob), None).await;

    let (_, body) = call(&app, "GET", &uri, Some(&bob), None).await;
    assert_eq!(body["data"]["likesCount"], 1);
    assert_eq!(body["data"]["isLiked"], true);
    assert_eq!(body["data"]["isSubscribed"], true);

    let (_, body) = call(&app, "GET", &uri, Some(&alice), None).await;
    assert_eq!(body["data"]["likesCount"], 1);
    assert_eq!(body["data"]["isLiked"], false);
}

#[tokio::test]
async fn refresh_token_rotates_and_old_one_is_rejected() {
    let app = app();
    sign_up(&app, "alice").await;
    let (_, login) = call(
        &app,
        "POST",
        "/api/v1/users/login",
        None,
        Some(json!({ "username": "alice", "password": "hunter22" })),
    )
    .await;
    let old = login["data"]["refreshToken"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        "POST",
        "/api/v1/users/refresh-token",
        None,
        Some(json!({ "refreshToken": old })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_ne!(body["data"]["refreshToken"].as_str().unwrap(), old);

    let (status, body) = call(
        &app,
        "POST",
        "/api/v1/users/refresh-token",
        None,
        Some(json!({ "refreshToken": old })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Refresh token is expired or used");
}

#[tokio::test]
async fn like_toggle_twice_returns_to_unliked() {
    let app = app();
    let (_, token) = sign_up(&app, "alice").await;
    let video = upload_video(&app, &token, "intro").await;
    let uri = format!("/api/v1/likes/toggle/v/{video}");

    let (status, body) = call(&app, "POST", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["liked"], true);

    let (_, liked) = call(&app, "GET", "/api/v1/likes/videos", Some(&token), None).await;
    assert_eq!(liked["data"]["totalDocs"], 1);

    let (status, body) = call(&app, "POST", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["liked"], false);

    let (_, liked) = call(&app, "GET", "/api/v1/likes/videos", Some(&token), None).await;
    assert_eq!(liked["data"]["totalDocs"], 0);
    assert_eq!(liked["data"]["docs"], json!([]));
}

#[tokio::test]
async fn generic_like_toggle_needs_exactly_one_target() {
    let app = app();
    let (_, token) = sign_up(&app, "alice").await;
    let a = uuid::Uuid::new_v4();
    let b = uuid::Uuid::new_v4();

    let (status, _) = call(&app, "POST", "/api/v1/likes/toggle", Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        "POST",
        "/api/v1/likes/toggle",
        Some(&token),
        Some(json!({ "video": a, "tweet": b })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(&app, "POST", "/api/v1/likes/toggle", Some(&token), Some(json!({ "tweet": b }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["liked"], true);
}

#[tokio::test]
async fn subscription_toggle_twice_returns_to_unsubscribed() {
    let app = app();
    let (alice, _) = sign_up(&app, "alice").await;
    let (bob, bob_token) = sign_up(&app, "bob").await;
    let uri = format!("/api/v1/subscriptions/c/{alice}");

    let (status, body) = call(&app, "POST", &uri, Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["subscribed"], true);

    let (_, subs) = call(&app, "GET", &uri, Some(&bob_token), None).await;
    assert_eq!(subs["data"]["totalDocs"], 1);
    assert_eq!(subs["data"]["docs"][0]["id"], bob.as_str());

    let (_, channel) = call(&app, "GET", "/api/v1/users/c/alice", Some(&bob_token), None).await;
    assert_eq!(channel["data"]["subscribersCount"], 1);
    assert_eq!(channel["data"]["isSubscribed"], true);

    let (status, body) = call(&app, "POST", &uri, Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["subscribed"], false);

    let (status, _) = call(&app, "POST", &format!("/api/v1/subscriptions/c/{bob}"), Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let unknown = uuid::Uuid::new_v4();
    let (status, _) = call(&app, "POST", &format!("/api/v1/subscriptions/c/{unknown}"), Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn private_video_is_owner_only_and_views_count() {
    let app = app();
    let (_, alice) = sign_up(&app, "alice").await;
    let (_, bob) = sign_up(&app, "bob").await;
    let video = upload_video(&app, &alice, "secret").await;

    let (status, body) = call(
        &app,
        "PATCH",
        &format!("/api/v1/videos/toggle/publish/{video}"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isPublished"], false);

    let uri = format!("/api/v1/videos/{video}");
    let (status, body) = call(&app, "GET", &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Video is private");

    let (status, _) = call(&app, "GET", &format!("/api/v1/comments/{video}"), Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(&app, "GET", &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["views"], 1);
    let (_, body) = call(&app, "GET", &uri, Some(&alice), None).await;
    assert_eq!(body["data"]["views"], 2);

    let (_, history) = call(&app, "GET", "/api/v1/users/history", Some(&alice), None).await;
    assert_eq!(history["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn non_owner_mutation_looks_like_missing_id() {
    let app = app();
    let (_, alice) = sign_up(&app, "alice").await;
    let (_, bob) = sign_up(&app, "bob").await;

    let (_, tweet) = call(&app, "POST", "/api/v1/tweets", Some(&alice), Some(json!({ "content": "hi" }))).await;
    let tweet_id = tweet["data"]["id"].as_str().unwrap().to_string();
    let missing = uuid::Uuid::new_v4();

    let edit = Some(json!({ "content": "hijacked" }));
    let not_owned = call(&app, "PATCH", &format!("/api/v1/tweets/{tweet_id}"), Some(&bob), edit.clone()).await;
    let not_found = call(&app, "PATCH", &format!("/api/v1/tweets/{missing}"), Some(&bob), edit).await;
    assert_eq!(not_owned, not_found);
    assert_eq!(not_owned.0, StatusCode::NOT_FOUND);
    assert_eq!(not_owned.1["message"], "Tweet not found!! OR Unauthorized!!");

    let (_, playlist) = call(
        &app,
        "POST",
        "/api/v1/playlist",
        Some(&alice),
        Some(json!({ "name": "mix", "description": "stuff" })),
    )
    .await;
    let playlist_id = playlist["data"]["id"].as_str().unwrap().to_string();
    let not_owned = call(&app, "DELETE", &format!("/api/v1/playlist/{playlist_id}"), Some(&bob), None).await;
    let not_found = call(&app, "DELETE", &format!("/api/v1/playlist/{missing}"), Some(&bob), None).await;
    assert_eq!(not_owned, not_found);

    let (status, _) = call(&app, "DELETE", &format!("/api/v1/playlist/{playlist_id}"), Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn invalid_ids_are_rejected_with_their_name() {
    let app = app();
    let (_, token) = sign_up(&app, "alice").await;

    let (status, body) = call(&app, "GET", "/api/v1/videos/not-a-uuid", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Valid videoId is required!!");

    let (status, body) = call(&app, "GET", "/api/v1/videos", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Valid userId is required!!");
}

#[tokio::test]
async fn lists_are_paged_newest_first() {
    let app = app();
    let (alice_id, alice) = sign_up(&app, "alice").await;
    for text in ["one", "two", "three"] {
        call(&app, "POST", "/api/v1/tweets", Some(&alice), Some(json!({ "content": text }))).await;
    }

    let (status, body) = call(
        &app,
        "GET",
        &format!("/api/v1/tweets/user/{alice_id}?page=1&limit=2"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let page = &body["data"];
    assert_eq!(page["totalDocs"], 3);
    assert_eq!(page["limit"], 2);
    assert_eq!(page["totalPages"], 2);
    assert_eq!(page["hasNextPage"], true);
    assert_eq!(page["docs"].as_array().unwrap().len(), 2);
    assert_eq!(page["docs"][0]["content"], "three");
    assert_eq!(page["docs"][1]["content"], "two");

    // nonsense paging falls back to the defaults
    let (status, body) = call(
        &app,
        "GET",
        &format!("/api/v1/tweets/user/{alice_id}?page=zero&limit=-4"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["page"], 1);
    assert_eq!(body["data"]["limit"], 10);
}

#[tokio::test]
async fn dashboard_reports_channel_totals() {
    let app = app();
    let (alice_id, alice) = sign_up(&app, "alice").await;
    let (_, bob) = sign_up(&app, "bob").await;
    let video = upload_video(&app, &alice, "intro").await;

    call(&app, "GET", &format!("/api/v1/videos/{video}"), Some(&bob), None).await;
    call(&app, "POST", &format!("/api/v1/likes/toggle/v/{video}"), Some(&bob), None).await;
    call(&app, "POST", &format!("/api/v1/subscriptions/c/{alice_id}"), Some(&bob), None).await;

    let (status, body) = call(&app, "GET", "/api/v1/dashboard/stats", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let stats = &body["data"];
    assert_eq!(stats["totalVideos"], 1);
    assert_eq!(stats["totalViews"], 1);
    assert_eq!(stats["totalSubscribers"], 1);
    assert_eq!(stats["totalLikes"], 1);
    assert_eq!(stats["likes"]["videos"], 1);
}

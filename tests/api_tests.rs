//! Router-level tests: the assembled app driven through tower, with an
//! in-memory media store and a temporary database.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use cliptube_server::auth::TokenIssuer;
use cliptube_server::media::InMemoryMediaStore;
use cliptube_server::server::{build_router, state::ServerState};
use cliptube_server::store::{
    AuthProvider, NewUser, NewVideo, SqliteStore, UserRecord, UserStore, VideoRecord, VideoStore,
};

struct TestApp {
    app: Router,
    state: ServerState,
    _tmp: TempDir,
}

fn test_app() -> TestApp {
    let tmp = TempDir::new().unwrap();
    let store = Arc::new(SqliteStore::new(tmp.path().join("test.db")).unwrap());
    let state = ServerState::new(
        store,
        Arc::new(InMemoryMediaStore::new()),
        TokenIssuer::new("test-secret", 60, 7),
    );
    TestApp {
        app: build_router(state.clone()),
        state,
        _tmp: tmp,
    }
}

impl TestApp {
    fn make_user(&self, username: &str) -> UserRecord {
        self.state
            .store
            .create_user(NewUser {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                full_name: format!("User {}", username),
                password_hash: Some(
                    cliptube_server::auth::password::hash("correct horse").unwrap(),
                ),
                auth_provider: AuthProvider::Local,
                provider_subject: None,
                avatar_url: Some("https://cdn.example.com/a.png".to_string()),
                avatar_asset_id: Some("asset-a".to_string()),
                cover_url: None,
                cover_asset_id: None,
            })
            .unwrap()
    }

    fn make_video(&self, owner: &UserRecord, title: &str) -> VideoRecord {
        self.state
            .store
            .create_video(NewVideo {
                owner_id: owner.id,
                video_url: "https://cdn.example.com/v.mp4".to_string(),
                video_asset_id: "asset-v".to_string(),
                thumbnail_url: "https://cdn.example.com/t.jpg".to_string(),
                thumbnail_asset_id: "asset-t".to_string(),
                title: title.to_string(),
                description: "a test video".to_string(),
                duration_secs: 12.0,
            })
            .unwrap()
    }

    fn bearer(&self, user: &UserRecord) -> String {
        let pair = self.state.tokens.issue_pair(user.id).unwrap();
        format!("Bearer {}", pair.access_token)
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn get(&self, uri: &str, auth: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn post_json(
        &self,
        uri: &str,
        auth: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }
}

const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (name, file_name, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

#[tokio::test]
async fn healthcheck_responds() {
    let app = test_app();
    let (status, body) = app.get("/healthcheck", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], "OK");
}

#[tokio::test]
async fn protected_routes_reject_unauthenticated() {
    let app = test_app();
    let protected = [
        "/api/v1/users/current-user",
        "/api/v1/users/history",
        "/api/v1/likes/videos",
        "/api/v1/dislikes/videos",
        "/api/v1/dashboard/stats",
        "/api/v1/dashboard/videos",
    ];
    for route in protected {
        let (status, _) = app.get(route, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "route {}", route);
    }
}

#[tokio::test]
async fn register_login_and_fetch_current_user() {
    let app = test_app();

    let body = multipart_body(
        &[
            ("fullName", "Alice Smith"),
            ("username", "Alice"),
            ("email", "alice@example.com"),
            ("password", "hunter2hunter2"),
        ],
        &[("avatar", "avatar.png", b"png-bytes")],
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/users/register")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::CREATED, "register: {}", body);
    // Username is normalized, sensitive fields never leave the server.
    assert_eq!(body["data"]["user"]["username"], "alice");
    assert!(body["data"]["user"].get("passwordHash").is_none());
    assert!(body["data"]["user"].get("refreshToken").is_none());
    let access_token = body["data"]["accessToken"].as_str().unwrap().to_string();

    let (status, body) = app
        .get(
            "/api/v1/users/current-user",
            Some(&format!("Bearer {}", access_token)),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["email"], "alice@example.com");

    // Duplicate email registers are conflicts.
    let duplicate = multipart_body(
        &[
            ("fullName", "Other"),
            ("username", "other"),
            ("email", "alice@example.com"),
        ],
        &[("avatar", "avatar.png", b"png-bytes")],
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/users/register")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(duplicate))
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Login with the registered password.
    let (status, body) = app
        .post_json(
            "/api/v1/users/login",
            None,
            serde_json::json!({"username": "alice", "password": "hunter2hunter2"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["accessToken"].as_str().is_some());

    let (status, _) = app
        .post_json(
            "/api/v1/users/login",
            None,
            serde_json::json!({"username": "alice", "password": "wrong"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_ids_are_bad_requests() {
    let app = test_app();
    let user = app.make_user("alice");
    let auth = app.bearer(&user);

    let (status, _) = app.get("/api/v1/videos/not-a-uuid", Some(&auth)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post_json("/api/v1/likes/toggle/v/not-a-uuid", Some(&auth), Value::Null)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn toggle_like_roundtrip_and_mutual_exclusion() {
    let app = test_app();
    let owner = app.make_user("owner");
    let fan = app.make_user("fan");
    let video = app.make_video(&owner, "clip");
    let auth = app.bearer(&fan);

    let uri = format!("/api/v1/likes/toggle/v/{}", video.id);
    let (status, body) = app.post_json(&uri, Some(&auth), Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], "created");

    // Dislike removes the like.
    let dislike_uri = format!("/api/v1/dislikes/toggle/v/{}", video.id);
    let (status, body) = app.post_json(&dislike_uri, Some(&auth), Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], "created");

    let (status, body) = app.get(&format!("/api/v1/videos/{}", video.id), Some(&auth)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["likeCount"], 0);
    assert_eq!(body["data"]["dislikeCount"], 1);
    assert_eq!(body["data"]["likedByViewer"], false);
    assert_eq!(body["data"]["dislikedByViewer"], true);

    // Second dislike un-toggles.
    let (status, body) = app.post_json(&dislike_uri, Some(&auth), Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], "removed");
}

#[tokio::test]
async fn fetching_video_counts_views_and_builds_history() {
    let app = test_app();
    let owner = app.make_user("owner");
    let watcher = app.make_user("watcher");
    let a = app.make_video(&owner, "a");
    let b = app.make_video(&owner, "b");
    let auth = app.bearer(&watcher);

    for video in [&a, &b, &a] {
        let (status, _) = app
            .get(&format!("/api/v1/videos/{}", video.id), Some(&auth))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    // Unconditional increment: two authenticated fetches plus this
    // anonymous one.
    let (_, body) = app.get(&format!("/api/v1/videos/{}", a.id), None).await;
    assert_eq!(body["data"]["views"], 3);

    // Most-recent-first, deduplicated.
    let (status, body) = app.get("/api/v1/users/history", Some(&auth)).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<String> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec![a.id.to_string(), b.id.to_string()]);

    // Anonymous fetches don't require auth and touch no history.
    let (status, _) = app.get(&format!("/api/v1/videos/{}", b.id), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.get("/api/v1/users/history", Some(&auth)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn video_listing_paginates_and_tolerates_junk_paging() {
    let app = test_app();
    let owner = app.make_user("owner");
    for i in 0..12 {
        app.make_video(&owner, &format!("video-{:02}", i));
    }

    let (status, body) = app
        .get(
            "/api/v1/videos/?page=2&limit=5&sortBy=title&sortType=asc",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalItems"], 12);
    assert_eq!(body["data"]["totalPages"], 3);
    assert_eq!(body["data"]["currentPage"], 2);
    assert_eq!(body["data"]["hasNextPage"], true);
    assert_eq!(body["data"]["hasPrevPage"], true);
    let titles: Vec<&str> = body["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["title"].as_str().unwrap())
        .collect();
    assert_eq!(
        titles,
        vec!["video-05", "video-06", "video-07", "video-08", "video-09"]
    );

    // Junk page/limit degrade to the defaults instead of crashing.
    let (status, body) = app.get("/api/v1/videos/?page=abc&limit=2.5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["currentPage"], 1);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 10);

    // Unknown sort columns are rejected, not interpolated.
    let (status, _) = app.get("/api/v1/videos/?sortBy=password_hash", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ownership_is_enforced_on_mutations() {
    let app = test_app();
    let owner = app.make_user("owner");
    let intruder = app.make_user("intruder");
    let video = app.make_video(&owner, "clip");
    let intruder_auth = app.bearer(&intruder);

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/v1/videos/{}", video.id))
        .header(header::AUTHORIZATION, &intruder_auth)
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Still there for its owner.
    let (status, _) = app
        .get(&format!("/api/v1/videos/{}", video.id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn subscription_toggle_and_channel_profile() {
    let app = test_app();
    let channel = app.make_user("channel");
    let fan = app.make_user("fan");
    let fan_auth = app.bearer(&fan);

    // Self-subscription is rejected.
    let channel_auth = app.bearer(&channel);
    let (status, _) = app
        .post_json(
            &format!("/api/v1/subscriptions/c/{}", channel.id),
            Some(&channel_auth),
            Value::Null,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post_json(
            &format!("/api/v1/subscriptions/c/{}", channel.id),
            Some(&fan_auth),
            Value::Null,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], "created");

    let (status, body) = app
        .get("/api/v1/users/c/channel", Some(&fan_auth))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["subscriberCount"], 1);
    assert_eq!(body["data"]["subscribedByViewer"], true);

    // Anonymous viewers see counts with flags down.
    let (status, body) = app.get("/api/v1/users/c/channel", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["subscriberCount"], 1);
    assert_eq!(body["data"]["subscribedByViewer"], false);
}

#[tokio::test]
async fn comment_flow_with_pagination_envelope() {
    let app = test_app();
    let owner = app.make_user("owner");
    let video = app.make_video(&owner, "clip");
    let auth = app.bearer(&owner);

    for i in 0..3 {
        let (status, _) = app
            .post_json(
                &format!("/api/v1/comments/{}", video.id),
                Some(&auth),
                serde_json::json!({"content": format!("comment {}", i)}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _) = app
        .post_json(
            &format!("/api/v1/comments/{}", video.id),
            Some(&auth),
            serde_json::json!({"content": "   "}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .get(&format!("/api/v1/comments/{}?limit=2", video.id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalItems"], 3);
    assert_eq!(body["data"]["totalPages"], 2);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["statusCode"], 200);
    assert_eq!(body["message"], "Comments fetched successfully");
}

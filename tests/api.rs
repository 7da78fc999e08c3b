//! End-to-end tests against the router backed by the in-memory store.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::json;
use tower::ServiceExt;

use common::{params, single_error, TestApp};
use devconnector::auth::{AuthConfig, AuthState};

// -- Service ------------------------------------------------------------------

#[tokio::test]
async fn root_banner() {
    let app = TestApp::new();
    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"api running");
}

#[tokio::test]
async fn request_id_is_propagated() {
    let app = TestApp::new();
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "req-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|value| value.to_str().ok()),
        Some("req-123")
    );
}

#[tokio::test]
async fn health_reports_backend() {
    let app = TestApp::new();
    let (status, body) = app.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "ok");
    assert_eq!(body["backend"], "memory");
    assert_eq!(body["name"], env!("CARGO_PKG_NAME"));
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new();
    let (status, body) = app.send("GET", "/api-docs/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/users"].is_object());
    assert!(body["components"]["securitySchemes"]["token"].is_object());
}

// -- Registration and login ---------------------------------------------------

#[tokio::test]
async fn register_then_fetch_current_user() {
    let app = TestApp::new();
    let token = app.register("Alice", "alice@example.com", "secret1").await;
    assert_eq!(token.split('.').count(), 3);

    let (status, body) = app.send("GET", "/api/auth", Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Alice");
    assert_eq!(body["email"], "alice@example.com");
    assert!(body["_id"].is_string());
    assert!(body["avatar"]
        .as_str()
        .is_some_and(|avatar| avatar.starts_with("//www.gravatar.com/avatar/")));
    assert!(body.get("password").is_none());
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn login_issues_a_working_token() {
    let app = TestApp::new();
    let registered = app.register("Alice", "alice@example.com", "secret1").await;

    let (status, body) = app
        .send(
            "POST",
            "/api/auth",
            None,
            Some(json!({"email": "ALICE@example.com ", "password": "secret1"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().expect("token").to_string();

    assert_eq!(app.user_id(&token).await, app.user_id(&registered).await);
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = TestApp::new();
    app.register("Alice", "alice@example.com", "secret1").await;

    let (unknown_status, unknown_body) = app
        .send(
            "POST",
            "/api/auth",
            None,
            Some(json!({"email": "nobody@example.com", "password": "secret1"})),
        )
        .await;
    let (wrong_status, wrong_body) = app
        .send(
            "POST",
            "/api/auth",
            None,
            Some(json!({"email": "alice@example.com", "password": "wrong-pass"})),
        )
        .await;

    assert_eq!(unknown_status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong_status, unknown_status);
    assert_eq!(unknown_body, single_error("Invalid credentials"));
    assert_eq!(wrong_body, unknown_body);
}

#[tokio::test]
async fn login_requires_email_and_password() {
    let app = TestApp::new();
    let (status, body) = app
        .send("POST", "/api/auth", None, Some(json!({"email": "nope"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(params(&body), vec!["email", "password"]);
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let app = TestApp::new();
    app.register("Alice", "alice@example.com", "secret1").await;

    let (status, body) = app
        .send(
            "POST",
            "/api/users",
            None,
            Some(json!({"name": "Alice 2", "email": " Alice@Example.com", "password": "secret2"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, single_error("User already exists"));
}

#[tokio::test]
async fn registration_reports_every_invalid_field() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            "POST",
            "/api/users",
            None,
            Some(json!({"name": " ", "email": "not-an-email", "password": "12345"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(params(&body), vec!["name", "email", "password"]);
    assert_eq!(body["errors"][0]["msg"], "name is required");
}

#[tokio::test]
async fn registration_rejects_passwords_longer_than_72_bytes() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            "POST",
            "/api/users",
            None,
            Some(json!({"name": "Alice", "email": "alice@example.com", "password": "x".repeat(73)})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(params(&body), vec!["password"]);
}

#[tokio::test]
async fn password_minimum_counts_characters_not_bytes() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            "POST",
            "/api/users",
            None,
            Some(json!({"name": "Alice", "email": "alice@example.com", "password": "ééé"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(params(&body), vec!["password"]);
    assert_eq!(
        body["errors"][0]["msg"],
        "please enter password with 6 or more characters"
    );

    app.register("Alice", "alice@example.com", "éééééé").await;
    let (status, _) = app
        .send(
            "POST",
            "/api/auth",
            None,
            Some(json!({"email": "alice@example.com", "password": "éééééé"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

// -- Guard --------------------------------------------------------------------

#[tokio::test]
async fn missing_token_is_rejected() {
    let app = TestApp::new();
    for (method, uri) in [
        ("GET", "/api/auth"),
        ("GET", "/api/profile/me"),
        ("GET", "/api/posts"),
        ("PUT", "/api/posts/like/00000000-0000-0000-0000-000000000000"),
    ] {
        let (status, body) = app.send(method, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(body, single_error("no token, authorization denied"));
    }
}

#[tokio::test]
async fn forged_and_expired_tokens_look_the_same() {
    let app = TestApp::new();
    let token = app.register("Alice", "alice@example.com", "secret1").await;
    let user_id = app.user_id(&token).await;

    let issued_long_ago = chrono::Utc::now().timestamp() - 400_000;
    let expired = app
        .auth
        .tokens()
        .issue_at(&user_id, issued_long_ago)
        .expect("token");

    let other = AuthState::new(&AuthConfig::new(SecretString::from("other".to_string())))
        .expect("valid auth config");
    let forged = other.tokens().issue(&user_id).expect("token");

    let mut tampered = token.clone();
    tampered.push('x');

    let bearer = format!("Bearer {token}");

    for bad in [&expired, &forged, &tampered, &bearer, &"garbage".to_string()] {
        let (status, body) = app.send("GET", "/api/auth", Some(bad.as_str()), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, single_error("token is not valid"));
    }
}

#[tokio::test]
async fn token_for_deleted_or_unknown_user_is_not_found() {
    let app = TestApp::new();
    let token = app
        .auth
        .tokens()
        .issue(&uuid::Uuid::new_v4().to_string())
        .expect("token");
    let (status, body) = app.send("GET", "/api/auth", Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, single_error("User not found"));
}

// -- Profiles -----------------------------------------------------------------

#[tokio::test]
async fn profile_create_update_and_lookup() {
    let app = TestApp::new();
    let token = app.register("Alice", "alice@example.com", "secret1").await;
    let user_id = app.user_id(&token).await;

    let (status, body) = app.send("GET", "/api/profile/me", Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, single_error("There is no profile for this user"));

    let (status, body) = app
        .send("POST", "/api/profile", Some(token.as_str()), Some(json!({"company": "Acme"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(params(&body), vec!["status", "skills"]);

    let (status, body) = app
        .send(
            "POST",
            "/api/profile",
            Some(token.as_str()),
            Some(json!({
                "status": "Developer",
                "skills": " rust, go ,sql",
                "company": "Acme",
                "twitter": "https://twitter.com/alice"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["skills"], json!(["rust", "go", "sql"]));
    assert_eq!(body["user"]["_id"], user_id.as_str());
    assert_eq!(body["user"]["name"], "Alice");
    assert_eq!(body["social"]["twitter"], "https://twitter.com/alice");

    let (status, body) = app
        .send(
            "POST",
            "/api/profile",
            Some(token.as_str()),
            Some(json!({"status": "Senior Developer", "skills": "rust", "bio": "Hi"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Senior Developer");
    assert_eq!(body["company"], "Acme");
    assert_eq!(body["bio"], "Hi");
    assert!(body["social"].get("twitter").is_none());

    let (status, me) = app.send("GET", "/api/profile/me", Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me, body);

    let (status, public) = app
        .send("GET", &format!("/api/profile/user/{user_id}"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(public, body);

    let (status, all) = app.send("GET", "/api/profile", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn profile_lookup_misses_are_bad_requests() {
    let app = TestApp::new();
    for id in ["not-a-uuid", "00000000-0000-0000-0000-000000000000"] {
        let (status, body) = app
            .send("GET", &format!("/api/profile/user/{id}"), None, None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, single_error("Profile not found"));
    }
}

// -- Posts --------------------------------------------------------------------

#[tokio::test]
async fn post_requires_text() {
    let app = TestApp::new();
    let token = app.register("Alice", "alice@example.com", "secret1").await;
    let (status, body) = app
        .send("POST", "/api/posts", Some(token.as_str()), Some(json!({"text": "  "})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(params(&body), vec!["text"]);
}

#[tokio::test]
async fn posts_are_listed_newest_first() {
    let app = TestApp::new();
    let token = app.register("Alice", "alice@example.com", "secret1").await;

    for text in ["first", "second"] {
        let (status, _) = app
            .send("POST", "/api/posts", Some(token.as_str()), Some(json!({"text": text})))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = app.send("GET", "/api/posts", Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    let texts: Vec<_> = body
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|post| post["text"].as_str())
        .collect();
    assert_eq!(texts, vec!["second", "first"]);
}

#[tokio::test]
async fn likes_comments_and_ownership() {
    let app = TestApp::new();
    let alice = app.register("Alice", "alice@example.com", "secret1").await;
    let bob = app.register("Bob", "bob@example.com", "secret2").await;
    let bob_id = app.user_id(&bob).await;

    let (status, post) = app
        .send("POST", "/api/posts", Some(alice.as_str()), Some(json!({"text": "Hello"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(post["name"], "Alice");
    assert_eq!(post["likes"], json!([]));
    let post_id = post["_id"].as_str().expect("post id").to_string();

    // likes
    let (status, likes) = app
        .send("PUT", &format!("/api/posts/like/{post_id}"), Some(bob.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(likes, json!([{"user": bob_id}]));

    let (status, body) = app
        .send("PUT", &format!("/api/posts/like/{post_id}"), Some(bob.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, single_error("Post already liked"));

    let (status, likes) = app
        .send("PUT", &format!("/api/posts/unlike/{post_id}"), Some(bob.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(likes, json!([]));

    let (status, body) = app
        .send("PUT", &format!("/api/posts/unlike/{post_id}"), Some(bob.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, single_error("Post not liked"));

    // comments
    for text in ["one", "two"] {
        let (status, _) = app
            .send(
                "POST",
                &format!("/api/posts/comment/{post_id}"),
                Some(bob.as_str()),
                Some(json!({"text": text})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, comments) = app
        .send(
            "POST",
            &format!("/api/posts/comment/{post_id}"),
            Some(alice.as_str()),
            Some(json!({"text": "three"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let texts: Vec<_> = comments
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|comment| comment["text"].as_str())
        .collect();
    assert_eq!(texts, vec!["three", "two", "one"]);
    assert_eq!(comments[1]["name"], "Bob");

    let bob_comment = comments[2]["_id"].as_str().expect("comment id").to_string();
    let uri = format!("/api/posts/comment/{post_id}/{bob_comment}");

    let (status, body) = app.send("DELETE", &uri, Some(alice.as_str()), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, single_error("User not authorized"));

    let (status, remaining) = app.send("DELETE", &uri, Some(bob.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    let texts: Vec<_> = remaining
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|comment| comment["text"].as_str())
        .collect();
    assert_eq!(texts, vec!["three", "two"]);

    let (status, body) = app.send("DELETE", &uri, Some(bob.as_str()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, single_error("Comment does not exist"));

    // deletion
    let post_uri = format!("/api/posts/{post_id}");
    let (status, body) = app.send("DELETE", &post_uri, Some(bob.as_str()), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, single_error("User not authorized"));

    let (status, body) = app.send("DELETE", &post_uri, Some(alice.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"msg": "Post removed"}));

    let (status, body) = app.send("GET", &post_uri, Some(alice.as_str()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, single_error("Post not found"));

    let (status, body) = app.send("DELETE", &post_uri, Some(bob.as_str()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, single_error("Post not found"));
}

#[tokio::test]
async fn like_from_a_removed_account_is_not_found() {
    let app = TestApp::new();
    let alice = app.register("Alice", "alice@example.com", "secret1").await;
    let (status, post) = app
        .send("POST", "/api/posts", Some(alice.as_str()), Some(json!({"text": "Hello"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    let post_id = post["_id"].as_str().expect("post id").to_string();

    let ghost = app
        .auth
        .tokens()
        .issue(&uuid::Uuid::new_v4().to_string())
        .expect("token");
    let (status, body) = app
        .send("PUT", &format!("/api/posts/like/{post_id}"), Some(ghost.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, single_error("User not found"));

    let (status, post) = app
        .send("GET", &format!("/api/posts/{post_id}"), Some(alice.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(post["likes"], json!([]));
}

#[tokio::test]
async fn unknown_and_malformed_post_ids_are_not_found() {
    let app = TestApp::new();
    let token = app.register("Alice", "alice@example.com", "secret1").await;
    let missing = "00000000-0000-0000-0000-000000000000";

    for (method, uri, body) in [
        ("GET", "/api/posts/not-a-uuid".to_string(), None),
        ("GET", format!("/api/posts/{missing}"), None),
        ("PUT", format!("/api/posts/like/{missing}"), None),
        ("PUT", format!("/api/posts/unlike/{missing}"), None),
        (
            "POST",
            format!("/api/posts/comment/{missing}"),
            Some(json!({"text": "hi"})),
        ),
    ] {
        let (status, response) = app.send(method, &uri, Some(token.as_str()), body).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
        assert_eq!(response, single_error("Post not found"));
    }
}

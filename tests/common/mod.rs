//! Shared harness for the router level tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;

use devconnector::auth::{AuthConfig, AuthState, TOKEN_HEADER};
use devconnector::store::Store;

pub struct TestApp {
    pub router: Router,
    pub auth: Arc<AuthState>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_store(Store::memory())
    }

    pub fn with_store(store: Store) -> Self {
        let config = AuthConfig::new(SecretString::from("integration-secret".to_string()))
            .with_bcrypt_cost(4);
        let auth = Arc::new(AuthState::new(&config).expect("valid auth config"));
        let router = devconnector::api::app(store, auth.clone());
        Self { router, auth }
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(TOKEN_HEADER, token);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible router");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("readable body")
            .to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/api/users",
                None,
                Some(json!({"name": name, "email": email, "password": password})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "register failed: {body}");
        body["token"].as_str().expect("token in body").to_string()
    }

    pub async fn user_id(&self, token: &str) -> String {
        let (status, body) = self.send("GET", "/api/auth", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        body["_id"].as_str().expect("user id").to_string()
    }
}

pub fn single_error(msg: &str) -> Value {
    json!({"errors": [{"msg": msg}]})
}

pub fn params(body: &Value) -> Vec<String> {
    body["errors"]
        .as_array()
        .map(|errors| {
            errors
                .iter()
                .filter_map(|error| error["param"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

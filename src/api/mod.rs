use crate::{
    api::handlers::{auth, health, posts, profile, root, users},
    auth::{require_auth, AuthConfig, AuthState, TOKEN_HEADER},
    store::Store,
};
use anyhow::{anyhow, Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue, Method, Request},
    middleware,
    routing::{delete, get, post, put},
    Extension, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, warn, Span};
use ulid::Ulid;
use url::Url;
use utoipa_swagger_ui::SwaggerUi;

pub mod handlers;
mod openapi;

pub use openapi::{openapi, ApiDoc};

/// Routes that need a valid `x-auth-token`.
fn protected_routes() -> Router {
    Router::new()
        .route("/api/auth", get(auth::current_user))
        .route("/api/profile", post(profile::upsert))
        .route("/api/profile/me", get(profile::me))
        .route("/api/posts", post(posts::create).get(posts::list))
        .route("/api/posts/:id", get(posts::get).delete(posts::delete))
        .route("/api/posts/like/:id", put(posts::like))
        .route("/api/posts/unlike/:id", put(posts::unlike))
        .route("/api/posts/comment/:id", post(posts::comment))
        .route(
            "/api/posts/comment/:id/:comment_id",
            delete(posts::delete_comment),
        )
        .route_layer(middleware::from_fn(require_auth))
}

fn public_routes() -> Router {
    Router::new()
        .route("/", get(root::root))
        .route("/health", get(health::health).options(health::health))
        .route("/api/users", post(users::register))
        .route("/api/auth", post(auth::login))
        .route("/api/profile", get(profile::list))
        .route("/api/profile/user/:user_id", get(profile::by_user))
}

/// Build the full application router on top of `store`.
#[must_use]
pub fn app(store: Store, auth_state: Arc<AuthState>) -> Router {
    public_routes()
        .merge(protected_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(auth_state))
                .layer(Extension(store)),
        )
}

/// Start the server
/// # Errors
/// Return error if the store, the token signer or the listener can't be set up
pub async fn new(
    port: u16,
    dsn: Option<String>,
    auth_config: AuthConfig,
    cors_origin: Option<String>,
) -> Result<()> {
    let store = if let Some(dsn) = dsn {
        Store::connect(&dsn).await?
    } else {
        warn!("No DSN configured, using the in-memory store; data is lost on restart");
        Store::memory()
    };

    let auth_state = Arc::new(
        AuthState::new(&auth_config).map_err(|err| anyhow!("Invalid auth configuration: {err}"))?,
    );

    let mut app = app(store, auth_state);
    if let Some(origin) = cors_origin.as_deref() {
        app = app.layer(cors_layer(origin)?);
    }

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {err}");
            }
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

fn cors_layer(frontend_url: &str) -> Result<CorsLayer> {
    Ok(CorsLayer::new()
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(TOKEN_HEADER)])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_origin(AllowOrigin::exact(frontend_origin(frontend_url)?)))
}

fn frontend_origin(frontend_url: &str) -> Result<HeaderValue> {
    let parsed =
        Url::parse(frontend_url).with_context(|| format!("Invalid frontend URL: {frontend_url}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("Frontend URL must include a valid host: {frontend_url}"))?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build frontend origin header")
}

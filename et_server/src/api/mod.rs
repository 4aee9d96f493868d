//! HTTP API for the tournament server.
//!
//! # Architecture
//!
//! The API is built with:
//! - **Axum**: Async web framework for HTTP
//! - **Tower**: Middleware for CORS, request IDs and authentication
//! - **JWT**: Bearer access tokens carrying the caller's role
//!
//! # Modules
//!
//! - [`auth`]: Registration, login and the current user
//! - [`tournaments`]: Tournament listing and lifecycle operations
//! - [`middleware`]: Authentication middleware for protected endpoints
//! - [`request_id`]: Request correlation and HTTP metrics
//! - [`errors`]: Error kind to status code mapping
//! - [`extract`]: Extractors that reject with the JSON error body
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use et_server::api::{AppState, cors_layer, create_router};
//! # use esports_tournaments::{auth::AuthManager, tournament::TournamentManager};
//! # use std::sync::Arc;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # let auth_manager: AuthManager = unimplemented!();
//! # let tournament_manager: TournamentManager = unimplemented!();
//!
//! let state = AppState {
//!     auth_manager: Arc::new(auth_manager),
//!     tournament_manager: Arc::new(tournament_manager),
//! };
//!
//! let app = create_router(state, cors_layer(&["http://localhost:3000".to_string()]));
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod errors;
pub mod extract;
pub mod middleware;
pub mod request_id;
pub mod tournaments;

use axum::{
    Router,
    extract::State,
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Json},
    routing::{get, post},
};
use esports_tournaments::{auth::AuthManager, tournament::TournamentManager};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request (cheap due to Arc wrappers).
#[derive(Clone)]
pub struct AppState {
    pub auth_manager: Arc<AuthManager>,
    pub tournament_manager: Arc<TournamentManager>,
}

/// Build a CORS layer allowing credentialed requests from `origins`.
///
/// Origins that are not valid header values are skipped.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::HeaderName::from_static(request_id::REQUEST_ID_HEADER)])
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Endpoint Summary
///
/// ```text
/// GET    /                             - Welcome message (public)
/// GET    /health                       - Health check (public)
/// POST   /api/v1/auth/register         - Register player (public)
/// POST   /api/v1/auth/login            - Login (public)
/// GET    /api/v1/auth/me               - Current user (auth required)
/// GET    /api/v1/tournaments           - List tournaments (public)
/// GET    /api/v1/tournaments/{id}      - Get tournament (public)
/// POST   /api/v1/tournaments           - Create tournament (auth required)
/// PUT    /api/v1/tournaments/{id}      - Update tournament (auth required)
/// DELETE /api/v1/tournaments/{id}      - Delete tournament (auth required)
/// ```
pub fn create_router(state: AppState, cors: CorsLayer) -> Router {
    let v1_routes = create_v1_router(state.clone());

    let root_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check));

    Router::new()
        .merge(root_routes)
        .nest("/api/v1", v1_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(cors)
        .with_state(state)
}

/// Create API v1 router with all versioned endpoints.
fn create_v1_router(state: AppState) -> Router<AppState> {
    // Public routes (no authentication middleware)
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/tournaments", get(tournaments::list_tournaments))
        .route("/tournaments/{id}", get(tournaments::get_tournament));

    // Protected routes (require authentication middleware)
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/tournaments", post(tournaments::create_tournament))
        .route(
            "/tournaments/{id}",
            axum::routing::put(tournaments::update_tournament)
                .delete(tournaments::delete_tournament),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth_middleware,
        ));

    Router::new().merge(public_routes).merge(protected_routes)
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "Welcome to the esports tournaments API" }))
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the database answers, `503 Service Unavailable` otherwise.
///
/// ```bash
/// curl http://localhost:8000/health
/// # {"status":"healthy","database":true,"version":"1.0.0","timestamp":"2025-06-01T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_healthy = match state.tournament_manager.health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            false
        }
    };

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}

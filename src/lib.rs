use std::sync::Arc;

use axum::{Router, extract::FromRef, http::HeaderName};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod config;
pub mod database;
pub mod gate;
pub mod handlers;
pub mod models;
pub mod pages;
pub mod policy;
pub mod session;

// Routing segregated by access level (Public, Admin).
pub mod routes;
use routes::{admin, public};

// --- Public Re-exports ---

pub use config::{AppConfig, Env};
pub use database::{DataAccessCache, DataAccessError, DataAccessState, PostgresDataAccess};
pub use policy::AccessPolicy;
pub use session::{JwtSessionResolver, Session, SessionResolverState};

/// ApiDoc
///
/// OpenAPI document for the JSON endpoints, served at `/api-docs/openapi.json`.
/// HTML pages are not part of it.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health, handlers::database_health, handlers::current_session,
        handlers::dashboard_stats
    ),
    components(
        schemas(
            session::Session, session::SessionUser, models::DashboardStats,
            models::DatabaseHealth, models::HealthState,
        )
    ),
    tags(
        (name = "fyzen", description = "Fyzen site and admin API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single container of shared services. Every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Handle to the database client, shared across requests.
    pub db: DataAccessState,
    /// Resolves the caller's session for the access gate.
    pub sessions: SessionResolverState,
    /// Allow-lists per protected route group.
    pub policy: Arc<AccessPolicy>,
    pub config: AppConfig,
}

impl AppState {
    /// assemble
    ///
    /// Wires the production services from `config`. The data access handle comes from
    /// `cache`, so assembling again after a reload reuses the handle outside production.
    pub fn assemble(config: AppConfig, cache: &DataAccessCache) -> Result<Self, DataAccessError> {
        let db = cache.acquire(config.env, || {
            PostgresDataAccess::connect_lazy(&config.db_url)
                .map(|db| Arc::new(db) as DataAccessState)
        })?;

        Ok(Self {
            db,
            sessions: Arc::new(JwtSessionResolver::from_config(&config)),
            policy: Arc::new(config.access_policy.clone()),
            config,
        })
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for DataAccessState {
    fn from_ref(app_state: &AppState) -> DataAccessState {
        app_state.db.clone()
    }
}

impl FromRef<AppState> for SessionResolverState {
    fn from_ref(app_state: &AppState) -> SessionResolverState {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for Arc<AccessPolicy> {
    fn from_ref(app_state: &AppState) -> Arc<AccessPolicy> {
        app_state.policy.clone()
    }
}

/// create_router
///
/// Assembles the routing structure, applies global and scoped middleware, and registers
/// the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Swagger UI over the JSON endpoints only.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))

        // Public Routes: no gate. The session echo lives here and never denies.
        .merge(public::public_routes())

        // Admin Routes: nested under '/admin'. The access gate is attached inside
        // admin_routes with `route_layer`, so it only wraps the guarded subtree and
        // leaves the denial page reachable.
        .nest("/admin", admin::admin_routes(&state))

        // Apply the unified state to all routes.
        .with_state(state);

    // 3. Observability and Correlation Layers (outermost, so the gate logs inside the span)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: one span per request, tagged with the ID from 3a.
                // Responses are logged at INFO with latency in milliseconds.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: echoes x-request-id back to the client,
                // including on the gate's redirects.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer (applied last)
        .layer(cors)
}

/// trace_span_logger
///
/// Opens the per-request span, tagged with the `x-request-id` set by the layer above so
/// the gate's log lines correlate with the request that produced them.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    // Structured fields shared by every event emitted while handling the request.
    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}

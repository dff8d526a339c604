use crate::{AppState, handlers, pages};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints reachable by anyone, signed in or not. No middleware is applied here
/// beyond the global observability and CORS layers from `create_router`.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // Marketing home page.
        .route("/", get(pages::home))
        // GET /login
        // Placeholder; sign-in is handled by the external auth provider.
        .route("/login", get(pages::login))
        // GET /orcamento
        // Quote request placeholder.
        .route("/orcamento", get(pages::quote))
        // GET /health
        // Liveness check. Does not touch the database.
        .route("/health", get(handlers::health))
        // GET /health/db
        // Pings the shared data access handle. 503 when the database is unreachable.
        .route("/health/db", get(handlers::database_health))
        // GET /api/session
        // Returns whatever session the resolver finds for this request, or null.
        // Resolver errors are logged and also answered with null.
        .route("/api/session", get(handlers::current_session))
}
